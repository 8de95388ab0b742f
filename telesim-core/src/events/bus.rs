//! Bounded multi-producer event bus.
//!
//! Backed by crossbeam's segmented queue so any number of simulation tasks can
//! publish concurrently while a single drain loop consumes. The capacity bound
//! is soft: concurrent producers racing the length check may overshoot it by
//! at most the number of producers.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use crossbeam::queue::SegQueue;

use super::{EventError, SimulationEvent};
use crate::ports::EventEmitter;

pub struct EventBus {
    queue: SegQueue<SimulationEvent>,
    capacity: usize,
    closed: AtomicBool,
}

impl EventBus {
    /// Create new event bus with fixed capacity
    pub fn with_capacity(capacity: usize) -> Result<Self, EventError> {
        if capacity == 0 {
            return Err(EventError::InvalidCapacity);
        }
        Ok(Self {
            queue: SegQueue::new(),
            capacity,
            closed: AtomicBool::new(false),
        })
    }

    #[inline]
    pub fn try_push(&self, event: SimulationEvent) -> Result<(), EventError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(EventError::Closed);
        }
        if self.queue.len() >= self.capacity {
            return Err(EventError::QueueFull);
        }
        self.queue.push(event);
        Ok(())
    }

    #[inline]
    pub fn try_pop(&self) -> Option<SimulationEvent> {
        self.queue.pop()
    }

    /// Pops everything currently queued, oldest first.
    pub fn drain(&self) -> Vec<SimulationEvent> {
        std::iter::from_fn(|| self.queue.pop()).collect()
    }

    /// Rejects further pushes. Already queued events stay poppable.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[async_trait]
impl EventEmitter for EventBus {
    async fn publish(&self, event: SimulationEvent) -> Result<(), EventError> {
        self.try_push(event)
    }
}
