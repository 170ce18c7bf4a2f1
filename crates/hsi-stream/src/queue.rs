//! Bounded per-client frame queue.
//!
//! The producer never writes to sockets. Each broadcast pushes the encoded
//! frame into every client's queue without waiting; the client's own
//! connection task drains the queue onto the socket. A full queue applies
//! the configured [`OverflowPolicy`] instead of blocking the tick.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use hsi_common::DeliveryError;
use hsi_config::OverflowPolicy;
use tokio::sync::Notify;

use crate::registry::{ClientSink, Delivery};

struct QueueInner {
    frames: VecDeque<Arc<str>>,
    closed: bool,
}

/// Single-consumer FIFO of encoded frames for one client.
pub struct FrameQueue {
    inner: Mutex<QueueInner>,
    notify: Notify,
    capacity: usize,
    policy: OverflowPolicy,
}

impl FrameQueue {
    pub fn new(capacity: usize, policy: OverflowPolicy) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Mutex::new(QueueInner {
                frames: VecDeque::with_capacity(capacity),
                closed: false,
            }),
            notify: Notify::new(),
            capacity,
            policy,
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueInner> {
        // Critical sections never panic midway, so a poisoned lock still
        // holds a consistent queue.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Enqueue a frame without waiting.
    pub fn push(&self, frame: Arc<str>) -> Result<Delivery, DeliveryError> {
        let delivery = {
            let mut inner = self.lock();
            if inner.closed {
                return Err(DeliveryError::Closed);
            }

            if inner.frames.len() < self.capacity {
                inner.frames.push_back(frame);
                Delivery::Queued
            } else {
                match self.policy {
                    OverflowPolicy::DropOldest => {
                        inner.frames.pop_front();
                        inner.frames.push_back(frame);
                        Delivery::Dropped
                    }
                    OverflowPolicy::DropNewest => return Ok(Delivery::Dropped),
                    OverflowPolicy::Disconnect => return Err(DeliveryError::Overflow),
                }
            }
        };

        self.notify.notify_one();
        Ok(delivery)
    }

    /// Wait for the next frame. Returns `None` once the queue is closed;
    /// frames still queued at that point are discarded.
    ///
    /// Cancel safe: a frame is only removed when this future completes.
    pub async fn pop(&self) -> Option<Arc<str>> {
        loop {
            let notified = self.notify.notified();
            {
                let mut inner = self.lock();
                if inner.closed {
                    return None;
                }
                if let Some(frame) = inner.frames.pop_front() {
                    return Some(frame);
                }
            }
            notified.await;
        }
    }

    pub fn close(&self) {
        {
            let mut inner = self.lock();
            inner.closed = true;
            inner.frames.clear();
        }
        self.notify.notify_one();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn len(&self) -> usize {
        self.lock().frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl ClientSink for FrameQueue {
    fn try_send(&self, payload: &Arc<str>) -> Result<Delivery, DeliveryError> {
        self.push(Arc::clone(payload))
    }

    fn close(&self) {
        FrameQueue::close(self);
    }

    fn is_closed(&self) -> bool {
        FrameQueue::is_closed(self)
    }
}
