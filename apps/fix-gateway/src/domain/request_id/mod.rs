//! Request ID Allocation
//!
//! Correlation identifiers for outbound requests. The counter lives in the
//! 16-bit range: an allocation made while the counter sits at 65535 resets
//! it to 1 before incrementing, so the sequence runs 2, 3, ..., 65535, 2, ...
//! and 1 is never handed out.

use std::sync::atomic::{AtomicU32, Ordering};

/// Highest value the counter reaches before wrapping.
pub const MAX_REQUEST_ID: u32 = 65_535;

/// Counter value after a wrap, before the increment.
const WRAP_BASE: u32 = 1;

/// Lock-free request id allocator.
#[derive(Debug)]
pub struct RequestIdAllocator {
    counter: AtomicU32,
}

impl Default for RequestIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestIdAllocator {
    /// Create an allocator seeded at 1; the first id is 2.
    #[must_use]
    pub const fn new() -> Self {
        Self::starting_at(WRAP_BASE)
    }

    /// Create an allocator whose counter currently holds `seed`.
    #[must_use]
    pub const fn starting_at(seed: u32) -> Self {
        Self {
            counter: AtomicU32::new(seed),
        }
    }

    /// Allocate the next id as a number.
    pub fn next_value(&self) -> u32 {
        let previous = self
            .counter
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                Some(Self::advance(current))
            })
            .unwrap_or_else(|current| current);
        Self::advance(previous)
    }

    /// Allocate the next id as a correlation token.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&self) -> String {
        self.next_value().to_string()
    }

    /// Current counter value (the last id handed out).
    #[must_use]
    pub fn current(&self) -> u32 {
        self.counter.load(Ordering::Acquire)
    }

    const fn advance(current: u32) -> u32 {
        if current >= MAX_REQUEST_ID {
            WRAP_BASE + 1
        } else {
            current + 1
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    use proptest::prelude::*;

    use super::*;

    #[test]
    fn first_id_is_two() {
        let allocator = RequestIdAllocator::new();
        assert_eq!(allocator.next(), "2");
        assert_eq!(allocator.next(), "3");
    }

    #[test]
    fn wraps_to_two_after_max() {
        let allocator = RequestIdAllocator::new();
        let mut last = 1;
        for _ in 0..(MAX_REQUEST_ID - 1) {
            let id = allocator.next_value();
            assert!(id > last, "sequence must strictly increase before wrap");
            last = id;
        }
        assert_eq!(last, MAX_REQUEST_ID);
        assert_eq!(allocator.next_value(), 2);
    }

    #[test]
    fn one_is_never_emitted() {
        let allocator = RequestIdAllocator::starting_at(MAX_REQUEST_ID - 2);
        let ids: Vec<u32> = (0..5).map(|_| allocator.next_value()).collect();
        assert_eq!(ids, vec![MAX_REQUEST_ID - 1, MAX_REQUEST_ID, 2, 3, 4]);
    }

    #[test]
    fn concurrent_allocations_are_unique() {
        let allocator = Arc::new(RequestIdAllocator::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let allocator = Arc::clone(&allocator);
                thread::spawn(move || (0..1000).map(|_| allocator.next_value()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id), "duplicate id {id}");
            }
        }
        assert_eq!(seen.len(), 8000);
    }

    proptest! {
        #[test]
        fn ids_stay_in_range(seed in 1u32..=MAX_REQUEST_ID, steps in 1usize..200) {
            let allocator = RequestIdAllocator::starting_at(seed);
            for _ in 0..steps {
                let id = allocator.next_value();
                prop_assert!((2..=MAX_REQUEST_ID).contains(&id));
            }
        }
    }
}
