//! Correlates still-image buffers with the captures that produced them.
//!
//! The platform delivers photo buffers on the output delivery thread while
//! the capture caller awaits on the control path; the shared timestamp key
//! pairs them up. Buffers that land before the awaiter registers are parked
//! in the slot until claimed or cleared.

use crate::errors::CaptureError;
use crate::types::ImageBuffer;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::oneshot;

enum Slot {
    Waiting(oneshot::Sender<ImageBuffer>),
    Delivered(ImageBuffer),
}

/// A registered wait: either the buffer already arrived, or a receiver for
/// it. Dropping a waiting receiver releases the slot's sender on the next
/// `clear()`.
pub enum PendingPhoto {
    Ready(ImageBuffer),
    Waiting(oneshot::Receiver<ImageBuffer>),
}

impl PendingPhoto {
    pub async fn resolve(self) -> Result<ImageBuffer, CaptureError> {
        match self {
            PendingPhoto::Ready(buffer) => Ok(buffer),
            PendingPhoto::Waiting(receiver) => {
                receiver.await.map_err(|_| CaptureError::CaptureAborted)
            }
        }
    }
}

/// Timestamp-keyed pending-delivery map. At most one pending wait per
/// timestamp; the caller serializes photo captures.
#[derive(Default)]
pub struct PhotoSynchronizer {
    slots: Mutex<HashMap<i64, Slot>>,
}

impl PhotoSynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand a buffer to whoever is waiting on its timestamp, or park it
    /// until they arrive.
    pub fn deliver(&self, timestamp: i64, buffer: ImageBuffer) {
        let mut slots = self.slots.lock().expect("lock poisoned");
        match slots.remove(&timestamp) {
            Some(Slot::Waiting(sender)) => {
                if sender.send(buffer).is_err() {
                    log::warn!("photo waiter for timestamp {} went away", timestamp);
                }
            }
            Some(Slot::Delivered(_)) => {
                log::warn!("duplicate photo buffer for timestamp {}, keeping newest", timestamp);
                slots.insert(timestamp, Slot::Delivered(buffer));
            }
            None => {
                slots.insert(timestamp, Slot::Delivered(buffer));
            }
        }
    }

    /// Register a pending wait for `timestamp` without suspending, so the
    /// caller can hold its own lock across registration and a concurrent
    /// teardown can never miss the slot.
    ///
    /// A second registration on the same timestamp is a caller bug and
    /// resolves immediately with `CaptureAborted` instead of displacing the
    /// first waiter.
    pub fn register(&self, timestamp: i64) -> Result<PendingPhoto, CaptureError> {
        let mut slots = self.slots.lock().expect("lock poisoned");
        match slots.remove(&timestamp) {
            Some(Slot::Delivered(buffer)) => Ok(PendingPhoto::Ready(buffer)),
            Some(slot @ Slot::Waiting(_)) => {
                slots.insert(timestamp, slot);
                log::error!("second wait registered for timestamp {}", timestamp);
                Err(CaptureError::CaptureAborted)
            }
            None => {
                let (sender, receiver) = oneshot::channel();
                slots.insert(timestamp, Slot::Waiting(sender));
                Ok(PendingPhoto::Waiting(receiver))
            }
        }
    }

    /// Suspend until the buffer keyed by `timestamp` arrives.
    pub async fn wait_for(&self, timestamp: i64) -> Result<ImageBuffer, CaptureError> {
        self.register(timestamp)?.resolve().await
    }

    /// Cancel every pending wait and drop parked buffers. Called on session
    /// teardown so no caller waits forever on a buffer that will never
    /// arrive.
    pub fn clear(&self) {
        let mut slots = self.slots.lock().expect("lock poisoned");
        let cancelled = slots.len();
        slots.clear();
        if cancelled > 0 {
            log::debug!("cleared {} pending photo slot(s)", cancelled);
        }
    }

    pub fn pending(&self) -> usize {
        self.slots.lock().expect("lock poisoned").len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use std::sync::Arc;

    fn buffer(ts: i64) -> ImageBuffer {
        ImageBuffer::new(ts, 4000, 3000, Bytes::from_static(b"jpeg"))
    }

    #[tokio::test]
    async fn test_deliver_then_wait() {
        let sync = PhotoSynchronizer::new();
        sync.deliver(42, buffer(42));
        let got = sync.wait_for(42).await.unwrap();
        assert_eq!(got.timestamp, 42);
        assert_eq!(sync.pending(), 0);
    }

    #[tokio::test]
    async fn test_wait_then_deliver() {
        let sync = Arc::new(PhotoSynchronizer::new());
        let waiter = sync.clone();
        let task = tokio::spawn(async move { waiter.wait_for(7).await });
        // Give the waiter a chance to register.
        tokio::task::yield_now().await;
        sync.deliver(7, buffer(7));
        let got = task.await.unwrap().unwrap();
        assert_eq!(got.timestamp, 7);
    }

    #[tokio::test]
    async fn test_clear_cancels_pending_wait() {
        let sync = Arc::new(PhotoSynchronizer::new());
        let waiter = sync.clone();
        let task = tokio::spawn(async move { waiter.wait_for(9).await });
        tokio::task::yield_now().await;
        while sync.pending() == 0 {
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
        }
        sync.clear();
        assert_eq!(task.await.unwrap(), Err(CaptureError::CaptureAborted));
    }

    #[tokio::test]
    async fn test_second_wait_on_same_timestamp_aborts() {
        let sync = Arc::new(PhotoSynchronizer::new());
        let first = sync.clone();
        let task = tokio::spawn(async move { first.wait_for(3).await });
        while sync.pending() == 0 {
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
        }
        assert_eq!(sync.wait_for(3).await, Err(CaptureError::CaptureAborted));
        // The first waiter is still live and gets the buffer.
        sync.deliver(3, buffer(3));
        assert!(task.await.unwrap().is_ok());
    }
}
