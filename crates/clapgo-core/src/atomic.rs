//! Lock-free `f64` cell for cross-thread parameter values.
//!
//! [`AtomicF64`] stores the IEEE-754 bit pattern of a double in a single
//! [`AtomicU64`]. The whole 64-bit word is published and read in one atomic
//! operation, so a reader never observes the high half of one write combined
//! with the low half of another.
//!
//! All operations are wait-free except [`AtomicF64::fetch_add`] and
//! [`AtomicF64::fetch_update`], which are lock-free CAS loops. None of them
//! allocate or block, so they are safe to call from the audio thread.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic double-precision float backed by an `AtomicU64`.
pub struct AtomicF64 {
    bits: AtomicU64,
}

impl AtomicF64 {
    /// Create a new cell holding `value`.
    pub fn new(value: f64) -> Self {
        Self {
            bits: AtomicU64::new(value.to_bits()),
        }
    }

    /// Read the most recently published value.
    #[inline]
    pub fn load(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }

    /// Publish `value`. Last writer wins.
    #[inline]
    pub fn store(&self, value: f64) {
        self.bits.store(value.to_bits(), Ordering::Release);
    }

    /// Publish `value` and return the previous value.
    #[inline]
    pub fn swap(&self, value: f64) -> f64 {
        f64::from_bits(self.bits.swap(value.to_bits(), Ordering::AcqRel))
    }

    /// Replace the value with `new` if it currently equals `old`.
    ///
    /// The comparison is on bit patterns, not float equality: `0.0` and
    /// `-0.0` differ, and a stored NaN matches only the identical NaN bits.
    #[inline]
    pub fn compare_and_swap(&self, old: f64, new: f64) -> bool {
        self.bits
            .compare_exchange(
                old.to_bits(),
                new.to_bits(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Atomically add `delta` and return the new value.
    pub fn fetch_add(&self, delta: f64) -> f64 {
        let mut current = self.bits.load(Ordering::Acquire);
        loop {
            let next = f64::from_bits(current) + delta;
            match self.bits.compare_exchange_weak(
                current,
                next.to_bits(),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return next,
                Err(observed) => current = observed,
            }
        }
    }

    /// Apply `f` until the update lands, returning `(previous, new)`.
    ///
    /// `f` may run more than once under contention and must be pure.
    pub fn fetch_update<F>(&self, mut f: F) -> (f64, f64)
    where
        F: FnMut(f64) -> f64,
    {
        let mut current = self.bits.load(Ordering::Acquire);
        loop {
            let previous = f64::from_bits(current);
            let next = f(previous);
            match self.bits.compare_exchange_weak(
                current,
                next.to_bits(),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return (previous, next),
                Err(observed) => current = observed,
            }
        }
    }

    /// Raw bit pattern of the current value.
    #[inline]
    pub fn load_bits(&self) -> u64 {
        self.bits.load(Ordering::Acquire)
    }

    /// Consume the cell and return the value.
    pub fn into_inner(self) -> f64 {
        f64::from_bits(self.bits.into_inner())
    }
}

impl Default for AtomicF64 {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl fmt::Debug for AtomicF64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AtomicF64").field(&self.load()).finish()
    }
}

impl From<f64> for AtomicF64 {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_store() {
        let cell = AtomicF64::new(1.5);
        assert_eq!(cell.load(), 1.5);
        cell.store(-3.25);
        assert_eq!(cell.load(), -3.25);
    }

    #[test]
    fn test_swap_returns_previous() {
        let cell = AtomicF64::new(2.0);
        assert_eq!(cell.swap(4.0), 2.0);
        assert_eq!(cell.load(), 4.0);
    }

    #[test]
    fn test_compare_and_swap() {
        let cell = AtomicF64::new(1.0);
        assert!(!cell.compare_and_swap(0.5, 9.0));
        assert_eq!(cell.load(), 1.0);
        assert!(cell.compare_and_swap(1.0, 9.0));
        assert_eq!(cell.load(), 9.0);
    }

    #[test]
    fn test_compare_and_swap_is_bitwise() {
        let cell = AtomicF64::new(0.0);
        // -0.0 == 0.0 as floats, but the bit patterns differ.
        assert!(!cell.compare_and_swap(-0.0, 1.0));

        let nan = f64::NAN;
        cell.store(nan);
        assert!(cell.compare_and_swap(nan, 2.0));
        assert_eq!(cell.load(), 2.0);
    }

    #[test]
    fn test_fetch_add() {
        let cell = AtomicF64::new(0.25);
        assert_eq!(cell.fetch_add(0.5), 0.75);
        assert_eq!(cell.fetch_add(-1.0), -0.25);
    }

    #[test]
    fn test_fetch_update() {
        let cell = AtomicF64::new(3.0);
        let (previous, next) = cell.fetch_update(|v| (v * 2.0).min(5.0));
        assert_eq!(previous, 3.0);
        assert_eq!(next, 5.0);
        assert_eq!(cell.load(), 5.0);
    }

    #[test]
    fn test_concurrent_fetch_add_is_exact() {
        use std::sync::Arc;

        let cell = Arc::new(AtomicF64::new(0.0));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cell = Arc::clone(&cell);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        cell.fetch_add(1.0);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cell.load(), 4000.0);
    }
}
