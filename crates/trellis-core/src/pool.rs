//! Free list of request slots.

use parking_lot::Mutex;

use crate::context::Slot;

/// Slots kept idle by default.
pub const DEFAULT_POOL_CAPACITY: usize = 1024;

/// A bounded free list of reusable request slots.
///
/// Slots are reset both when they are handed out and when they come back,
/// so nothing set during one request is visible to the next.
pub(crate) struct ContextPool {
    free: Mutex<Vec<Slot>>,
    capacity: usize,
}

impl ContextPool {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            free: Mutex::new(Vec::new()),
            capacity,
        }
    }

    pub(crate) fn acquire(&self) -> Slot {
        let slot = self.free.lock().pop();
        let mut slot = slot.unwrap_or_else(Slot::new);
        slot.reset();
        slot
    }

    pub(crate) fn release(&self, mut slot: Slot) {
        slot.reset();
        let mut free = self.free.lock();
        if free.len() < self.capacity {
            free.push(slot);
        }
    }

    pub(crate) fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        self.free.get_mut().truncate(capacity);
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    pub(crate) fn idle(&self) -> usize {
        self.free.lock().len()
    }
}
