//! Fixed-capacity event arena for the audio thread.
//!
//! [`EventPool`] pre-allocates every [`Event`] slot at construction and hands
//! them out through [`EventHandle`]s during a processing block. Acquisition is
//! O(1) index arithmetic: released slots are reused first from a bounded free
//! list, then a cursor advances through untouched slots. At the start of each
//! block [`EventPool::reset`] rewinds the cursor and bumps a block epoch,
//! which invalidates every outstanding handle in O(1).
//!
//! Exhaustion is not an error: `acquire()` returns `None`, the drop is
//! counted, and the caller skips the event. Counters live in a shared
//! [`PoolCounters`] so a [`PoolMonitor`] on a non-audio thread can report
//! them without touching the pool.
//!
//! The pool is single-threaded (`&mut self`); it belongs to whichever thread
//! is running `process`.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::ConfigError;
use crate::event::Event;

/// Handle to an acquired pool slot.
///
/// Handles are deliberately not `Clone`: releasing consumes the handle, so
/// two live handles can never name the same slot. A handle from an earlier
/// block is stale and is rejected by every accessor.
#[derive(Debug, PartialEq, Eq)]
pub struct EventHandle {
    index: u32,
    epoch: u64,
}

impl EventHandle {
    /// Slot index inside the pool.
    #[inline]
    pub fn index(&self) -> usize {
        self.index as usize
    }
}

/// Pool diagnostics shared with non-audio threads.
#[derive(Debug, Default)]
pub struct PoolCounters {
    acquired: AtomicU64,
    released: AtomicU64,
    dropped: AtomicU64,
    blocks: AtomicU64,
    high_water: AtomicUsize,
}

/// Snapshot of [`PoolCounters`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStats {
    pub capacity: usize,
    pub acquired: u64,
    pub released: u64,
    pub dropped: u64,
    pub blocks: u64,
    pub high_water: usize,
}

impl PoolStats {
    /// Percentage of acquire attempts that succeeded.
    pub fn hit_rate(&self) -> f64 {
        let attempts = self.acquired + self.dropped;
        if attempts == 0 {
            100.0
        } else {
            self.acquired as f64 / attempts as f64 * 100.0
        }
    }
}

/// Read-only view of a pool's counters, usable from any thread.
#[derive(Debug, Clone)]
pub struct PoolMonitor {
    counters: Arc<PoolCounters>,
    capacity: usize,
}

impl PoolMonitor {
    /// Current counter values.
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            capacity: self.capacity,
            acquired: self.counters.acquired.load(Ordering::Relaxed),
            released: self.counters.released.load(Ordering::Relaxed),
            dropped: self.counters.dropped.load(Ordering::Relaxed),
            blocks: self.counters.blocks.load(Ordering::Relaxed),
            high_water: self.counters.high_water.load(Ordering::Relaxed),
        }
    }

    /// Total events dropped because the pool was full.
    pub fn dropped(&self) -> u64 {
        self.counters.dropped.load(Ordering::Relaxed)
    }

    /// Log a diagnostics line. Never call this from the audio thread.
    pub fn log_diagnostics(&self) {
        let stats = self.stats();
        if stats.dropped > 0 {
            log::warn!(
                "event pool dropped {} events (capacity {}, high water {}); consider a larger pool",
                stats.dropped,
                stats.capacity,
                stats.high_water
            );
        }
        log::debug!(
            "event pool: acquired={} released={} dropped={} hit_rate={:.1}% high_water={}/{} blocks={}",
            stats.acquired,
            stats.released,
            stats.dropped,
            stats.hit_rate(),
            stats.high_water,
            stats.capacity,
            stats.blocks
        );
    }
}

/// Fixed-capacity event arena.
pub struct EventPool {
    slots: Box<[Event]>,
    /// Epoch in which each slot was acquired; 0 when free.
    acquired_in: Box<[u64]>,
    /// Released slot indices, reused before the cursor advances.
    free: Vec<u32>,
    cursor: usize,
    epoch: u64,
    in_use: usize,
    counters: Arc<PoolCounters>,
}

impl EventPool {
    /// Create a pool with `capacity` pre-allocated slots.
    ///
    /// A zero capacity is rejected here rather than surfacing later as a
    /// pool that drops every event. Indices are stored as `u32` in handles
    /// and the free list, so larger capacities are rejected too.
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::ZeroPoolCapacity);
        }
        if u32::try_from(capacity).is_err() {
            return Err(ConfigError::PoolCapacityTooLarge(capacity));
        }
        Ok(Self {
            slots: vec![Event::default(); capacity].into_boxed_slice(),
            acquired_in: vec![0u64; capacity].into_boxed_slice(),
            free: Vec::with_capacity(capacity),
            cursor: 0,
            epoch: 1,
            in_use: 0,
            counters: Arc::new(PoolCounters::default()),
        })
    }

    /// Start a new block: every slot becomes free and every outstanding
    /// handle becomes stale. O(1).
    #[inline]
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.free.clear();
        self.in_use = 0;
        self.epoch += 1;
        self.counters.blocks.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a free slot.
    ///
    /// Returns `None` and counts a drop when the pool is exhausted. Never
    /// allocates.
    pub fn acquire(&mut self) -> Option<EventHandle> {
        let index = if let Some(index) = self.free.pop() {
            index as usize
        } else if self.cursor < self.slots.len() {
            let index = self.cursor;
            self.cursor += 1;
            index
        } else {
            self.counters.dropped.fetch_add(1, Ordering::Relaxed);
            return None;
        };

        self.slots[index] = Event::default();
        self.acquired_in[index] = self.epoch;
        self.in_use += 1;
        self.counters.acquired.fetch_add(1, Ordering::Relaxed);
        self.counters
            .high_water
            .fetch_max(self.in_use, Ordering::Relaxed);

        Some(EventHandle {
            index: index as u32,
            epoch: self.epoch,
        })
    }

    /// Count an event the caller could not stage because the pool is full.
    #[inline]
    pub(crate) fn record_drop(&mut self) {
        self.counters.dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Acquire a slot and write `event` into it.
    #[inline]
    pub fn stage(&mut self, event: Event) -> Option<EventHandle> {
        let handle = self.acquire()?;
        self.slots[handle.index()] = event;
        Some(handle)
    }

    /// Return a slot to the free list.
    ///
    /// Returns `false` for a stale handle (from before the last `reset()`).
    pub fn release(&mut self, handle: EventHandle) -> bool {
        if !self.is_live(&handle) {
            return false;
        }
        self.acquired_in[handle.index()] = 0;
        // Each slot is on the free list at most once, so this never grows
        // past the reserved capacity.
        self.free.push(handle.index);
        self.in_use -= 1;
        self.counters.released.fetch_add(1, Ordering::Relaxed);
        true
    }

    /// Read the event in a live slot.
    #[inline]
    pub fn get(&self, handle: &EventHandle) -> Option<&Event> {
        if self.is_live(handle) {
            Some(&self.slots[handle.index()])
        } else {
            None
        }
    }

    /// Mutable access to the event in a live slot.
    #[inline]
    pub fn get_mut(&mut self, handle: &EventHandle) -> Option<&mut Event> {
        if self.is_live(handle) {
            Some(&mut self.slots[handle.index()])
        } else {
            None
        }
    }

    /// Returns true if `handle` refers to a slot acquired in this block and
    /// not yet released.
    #[inline]
    pub fn is_live(&self, handle: &EventHandle) -> bool {
        handle.epoch == self.epoch
            && self
                .acquired_in
                .get(handle.index())
                .is_some_and(|&epoch| epoch == self.epoch)
    }

    /// Total slot count.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Slots currently held.
    #[inline]
    pub fn in_use(&self) -> usize {
        self.in_use
    }

    /// Slots that can still be acquired this block.
    #[inline]
    pub fn available(&self) -> usize {
        self.capacity() - self.in_use
    }

    /// Events dropped since construction.
    #[inline]
    pub fn dropped(&self) -> u64 {
        self.counters.dropped.load(Ordering::Relaxed)
    }

    /// A monitor for reading counters from another thread.
    pub fn monitor(&self) -> PoolMonitor {
        PoolMonitor {
            counters: Arc::clone(&self.counters),
            capacity: self.capacity(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(matches!(
            EventPool::new(0),
            Err(ConfigError::ZeroPoolCapacity)
        ));
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_oversized_capacity_rejected() {
        let capacity = u32::MAX as usize + 1;
        assert!(matches!(
            EventPool::new(capacity),
            Err(ConfigError::PoolCapacityTooLarge(c)) if c == capacity
        ));
    }

    #[test]
    fn test_capacity_is_hard_ceiling() {
        let mut pool = EventPool::new(4).unwrap();
        let handles: Vec<_> = (0..4).map(|_| pool.acquire().unwrap()).collect();
        assert_eq!(pool.in_use(), 4);
        assert_eq!(pool.available(), 0);

        assert!(pool.acquire().is_none());
        assert_eq!(pool.dropped(), 1);
        assert_eq!(pool.capacity(), 4);

        // Earlier handles are untouched by the failed acquire.
        for handle in &handles {
            assert!(pool.is_live(handle));
        }
    }

    #[test]
    fn test_reset_reuses_storage() {
        let mut pool = EventPool::new(4).unwrap();
        let first = pool.acquire().unwrap();
        let first_ptr: *const Event = pool.get(&first).unwrap();
        for _ in 0..3 {
            pool.acquire().unwrap();
        }
        assert!(pool.acquire().is_none());
        assert_eq!(pool.dropped(), 1);

        pool.reset();
        let again = pool.acquire().unwrap();
        assert_eq!(again.index(), 0);
        assert!(std::ptr::eq(pool.get(&again).unwrap(), first_ptr));
    }

    #[test]
    fn test_reset_makes_handles_stale() {
        let mut pool = EventPool::new(2).unwrap();
        let old = pool.stage(Event::param_value(0, 1, 0.5)).unwrap();
        pool.reset();

        assert!(pool.get(&old).is_none());
        let fresh = pool.acquire().unwrap();
        assert_eq!(fresh.index(), old.index());
        // The stale handle cannot release the slot now owned by `fresh`.
        assert!(!pool.release(old));
        assert!(pool.is_live(&fresh));
    }

    #[test]
    fn test_release_recycles_slot() {
        let mut pool = EventPool::new(2).unwrap();
        let a = pool.acquire().unwrap();
        let b = pool.acquire().unwrap();
        let a_index = a.index();
        assert!(pool.release(a));
        assert_eq!(pool.in_use(), 1);

        let c = pool.acquire().unwrap();
        assert_eq!(c.index(), a_index);
        assert_ne!(c.index(), b.index());
        assert!(pool.acquire().is_none());
    }

    #[test]
    fn test_stage_and_mutate() {
        let mut pool = EventPool::new(1).unwrap();
        let handle = pool.stage(Event::param_value(12, 3, 0.25)).unwrap();
        assert_eq!(pool.get(&handle).unwrap().time(), 12);

        pool.get_mut(&handle).unwrap().header.time = 20;
        assert_eq!(pool.get(&handle).unwrap().time(), 20);
    }

    #[test]
    fn test_acquire_clears_previous_contents() {
        let mut pool = EventPool::new(1).unwrap();
        let handle = pool.stage(Event::param_value(99, 3, 0.25)).unwrap();
        assert!(pool.release(handle));
        let handle = pool.acquire().unwrap();
        assert_eq!(*pool.get(&handle).unwrap(), Event::default());
    }

    #[test]
    fn test_monitor_reports_counters() {
        let mut pool = EventPool::new(2).unwrap();
        let monitor = pool.monitor();

        let a = pool.acquire().unwrap();
        pool.acquire().unwrap();
        pool.acquire();
        pool.release(a);
        pool.reset();

        let stats = std::thread::spawn(move || monitor.stats()).join().unwrap();
        assert_eq!(stats.capacity, 2);
        assert_eq!(stats.acquired, 2);
        assert_eq!(stats.released, 1);
        assert_eq!(stats.dropped, 1);
        assert_eq!(stats.high_water, 2);
        assert_eq!(stats.blocks, 1);
        assert!((stats.hit_rate() - 200.0 / 3.0).abs() < 1e-9);
    }
}
