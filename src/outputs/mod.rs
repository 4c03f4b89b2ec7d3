//! Output descriptors and buffered image producers.
//!
//! Descriptors are the caller's declared intent for each output stream,
//! independent of whether a session exists. Producers are the concrete
//! bounded-queue objects a live session pushes decoded buffers into; each
//! owns a named delivery thread so frame delivery never blocks the camera
//! control path.

pub mod builder;

use crate::types::{ImageBuffer, OutputKind, Size, SurfaceHandle};
use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

/// Callback receiving delivered image buffers. Ownership of each buffer
/// transfers to the callback.
pub type FrameCallback = Arc<dyn Fn(ImageBuffer) + Send + Sync>;

/// Desired photo output.
#[derive(Debug, Clone)]
pub struct PhotoOutputDescriptor {
    pub enabled: bool,
    pub target_size: Option<Size>,
}

/// Desired video / frame-processor output.
#[derive(Clone)]
pub struct VideoOutputDescriptor {
    pub enabled: bool,
    pub target_size: Option<Size>,
    pub callback: FrameCallback,
}

impl std::fmt::Debug for VideoOutputDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoOutputDescriptor")
            .field("enabled", &self.enabled)
            .field("target_size", &self.target_size)
            .finish()
    }
}

/// Desired preview output backed by a caller-owned surface.
#[derive(Debug, Clone)]
pub struct PreviewOutputDescriptor {
    pub enabled: bool,
    pub surface: SurfaceHandle,
}

/// The full descriptor set, replaced wholesale on each `set_outputs` call.
#[derive(Debug, Clone, Default)]
pub struct OutputDescriptors {
    pub photo: Option<PhotoOutputDescriptor>,
    pub video: Option<VideoOutputDescriptor>,
    pub preview: Option<PreviewOutputDescriptor>,
}

/// What to do when a producer's queue is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Evict the oldest pending buffer. Used for video, where latency wins.
    DropOldest,
    /// Refuse the new buffer with a warning. Used for photo, where an
    /// evicted capture would be silently lost.
    Reject,
}

struct QueueInner {
    items: VecDeque<ImageBuffer>,
    capacity: usize,
    dropped: u64,
    closed: bool,
}

/// Bounded buffer queue shared between the platform push side and the
/// delivery thread.
struct BufferQueue {
    inner: Mutex<QueueInner>,
    cv: Condvar,
}

impl BufferQueue {
    fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(QueueInner {
                items: VecDeque::with_capacity(capacity),
                capacity: capacity.max(1),
                dropped: 0,
                closed: false,
            }),
            cv: Condvar::new(),
        }
    }

    fn push(&self, item: ImageBuffer, policy: OverflowPolicy) {
        let mut g = self.inner.lock().expect("lock poisoned");
        if g.closed {
            return;
        }
        if g.items.len() >= g.capacity {
            match policy {
                OverflowPolicy::DropOldest => {
                    g.items.pop_front();
                    g.dropped = g.dropped.saturating_add(1);
                }
                OverflowPolicy::Reject => {
                    g.dropped = g.dropped.saturating_add(1);
                    log::warn!("photo buffer queue full, rejecting buffer");
                    return;
                }
            }
        }
        g.items.push_back(item);
        self.cv.notify_one();
    }

    fn pop_timeout(&self, timeout: Duration) -> Option<ImageBuffer> {
        let mut g = self.inner.lock().expect("lock poisoned");
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(item) = g.items.pop_front() {
                return Some(item);
            }
            if g.closed {
                return None;
            }
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            let (ng, _) = self
                .cv
                .wait_timeout(g, deadline - now)
                .expect("lock poisoned");
            g = ng;
        }
    }

    fn dropped(&self) -> u64 {
        self.inner.lock().expect("lock poisoned").dropped
    }

    fn is_closed(&self) -> bool {
        self.inner.lock().expect("lock poisoned").closed
    }

    fn close(&self) {
        let mut g = self.inner.lock().expect("lock poisoned");
        g.closed = true;
        g.items.clear();
        self.cv.notify_all();
    }
}

/// Push side of a producer, handed to the platform session binding.
#[derive(Clone)]
pub struct ProducerHandle {
    kind: OutputKind,
    size: Size,
    policy: OverflowPolicy,
    queue: Arc<BufferQueue>,
}

impl ProducerHandle {
    pub fn kind(&self) -> OutputKind {
        self.kind
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// Hand a decoded buffer to the producer. No-op after close.
    pub fn push(&self, buffer: ImageBuffer) {
        self.queue.push(buffer, self.policy);
    }

    pub fn is_closed(&self) -> bool {
        self.queue.is_closed()
    }
}

/// A bounded-capacity image producer with a dedicated delivery thread.
pub struct BufferProducer {
    kind: OutputKind,
    size: Size,
    policy: OverflowPolicy,
    queue: Arc<BufferQueue>,
    delivery: Option<std::thread::JoinHandle<()>>,
    closed: bool,
}

impl BufferProducer {
    /// Allocate a producer and spawn its delivery thread.
    pub fn spawn(
        kind: OutputKind,
        size: Size,
        capacity: usize,
        policy: OverflowPolicy,
        sink: FrameCallback,
    ) -> Self {
        let queue = Arc::new(BufferQueue::new(capacity));
        let delivery_queue = queue.clone();
        let name = format!("camsession-{}-delivery", kind);
        let delivery = std::thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                loop {
                    match delivery_queue.pop_timeout(Duration::from_millis(100)) {
                        Some(buffer) => sink(buffer),
                        None if delivery_queue.is_closed() => break,
                        None => continue,
                    }
                }
            })
            .unwrap_or_else(|e| panic!("failed to spawn {}: {}", name, e));

        Self {
            kind,
            size,
            policy,
            queue,
            delivery: Some(delivery),
            closed: false,
        }
    }

    pub fn kind(&self) -> OutputKind {
        self.kind
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// Buffers lost to overflow since allocation.
    pub fn dropped(&self) -> u64 {
        self.queue.dropped()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Push side for the platform session binding.
    pub fn handle(&self) -> ProducerHandle {
        ProducerHandle {
            kind: self.kind,
            size: self.size,
            policy: self.policy,
            queue: self.queue.clone(),
        }
    }

    /// Close the queue and join the delivery thread. Idempotent; a producer
    /// is closed exactly once, later calls are no-ops.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.queue.close();
        if let Some(handle) = self.delivery.take() {
            let _ = handle.join();
        }
        log::debug!("closed {} buffer producer ({})", self.kind, self.size);
    }
}

impl Drop for BufferProducer {
    fn drop(&mut self) {
        self.close();
    }
}

/// Preview passthrough: no producer, just the caller's surface at a
/// resolved size.
#[derive(Debug, Clone)]
pub struct PreviewOutput {
    pub surface: SurfaceHandle,
    pub size: Size,
}

/// Concrete outputs bound to the live session. At most one set exists;
/// any rebuild closes the previous set in full first.
#[derive(Default)]
pub struct OutputSet {
    pub photo: Option<BufferProducer>,
    pub video: Option<BufferProducer>,
    pub preview: Option<PreviewOutput>,
}

impl OutputSet {
    pub fn has_photo(&self) -> bool {
        self.photo.is_some()
    }

    /// Outputs fed by the repeating request: video + preview, never photo.
    pub fn repeating_targets(&self) -> Vec<OutputKind> {
        let mut targets = Vec::new();
        if self.video.is_some() {
            targets.push(OutputKind::Video);
        }
        if self.preview.is_some() {
            targets.push(OutputKind::Preview);
        }
        targets
    }

    /// Close every producer. Safe to call more than once.
    pub fn close(&mut self) {
        if let Some(photo) = self.photo.as_mut() {
            photo.close();
        }
        if let Some(video) = self.video.as_mut() {
            video.close();
        }
        self.preview = None;
    }
}
