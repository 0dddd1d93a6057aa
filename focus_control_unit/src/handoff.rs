//! Single-slot, latest-value-wins hand-off between a sensing producer and
//! the control loop.
//!
//! The producer overwrites; the consumer never waits. A value that is
//! overwritten before being taken is dropped and counted.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

#[derive(Debug)]
struct Slot<T> {
    value: Option<T>,
    fresh: bool,
}

/// Latest-value slot shared by one producer and one consumer.
#[derive(Debug)]
pub struct InputSlot<T: Copy> {
    slot: Mutex<Slot<T>>,
    published: AtomicU64,
    overwritten: AtomicU64,
}

impl<T: Copy> Default for InputSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy> InputSlot<T> {
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(Slot {
                value: None,
                fresh: false,
            }),
            published: AtomicU64::new(0),
            overwritten: AtomicU64::new(0),
        }
    }

    /// Store `value`, replacing any unread one.
    pub fn publish(&self, value: T) {
        let mut slot = self.slot.lock();
        if slot.fresh {
            self.overwritten.fetch_add(1, Ordering::Relaxed);
        }
        slot.value = Some(value);
        slot.fresh = true;
        self.published.fetch_add(1, Ordering::Relaxed);
    }

    /// Newest value not yet taken.
    ///
    /// Returns `None` when nothing new was published, or when the producer
    /// holds the slot at this instant; the caller retries next cycle.
    pub fn take_latest(&self) -> Option<T> {
        let mut slot = self.slot.try_lock()?;
        if !slot.fresh {
            return None;
        }
        slot.fresh = false;
        slot.value
    }

    /// Values published in total.
    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    /// Values replaced before the consumer took them.
    pub fn overwritten(&self) -> u64 {
        self.overwritten.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn empty_slot_yields_nothing() {
        let slot: InputSlot<u32> = InputSlot::new();
        assert_eq!(slot.take_latest(), None);
        assert_eq!(slot.published(), 0);
    }

    #[test]
    fn value_is_taken_once() {
        let slot = InputSlot::new();
        slot.publish(7u32);
        assert_eq!(slot.take_latest(), Some(7));
        assert_eq!(slot.take_latest(), None);
    }

    #[test]
    fn latest_value_wins() {
        let slot = InputSlot::new();
        slot.publish(1u32);
        slot.publish(2);
        slot.publish(3);
        assert_eq!(slot.take_latest(), Some(3));
        assert_eq!(slot.overwritten(), 2);
        assert_eq!(slot.published(), 3);

        // Taken values are not counted as overwritten.
        slot.publish(4);
        assert_eq!(slot.overwritten(), 2);
    }

    #[test]
    fn take_does_not_wait_for_producer() {
        let slot = InputSlot::new();
        slot.publish(1u32);
        let guard = slot.slot.lock();
        assert_eq!(slot.take_latest(), None);
        drop(guard);
        assert_eq!(slot.take_latest(), Some(1));
    }

    #[test]
    fn panicking_producer_does_not_wedge_the_slot() {
        let slot = Arc::new(InputSlot::new());
        slot.publish(1u32);
        let holder = {
            let slot = Arc::clone(&slot);
            thread::spawn(move || {
                let _guard = slot.slot.lock();
                panic!("sensor thread died");
            })
        };
        assert!(holder.join().is_err());

        assert_eq!(slot.take_latest(), Some(1));
        slot.publish(2);
        assert_eq!(slot.take_latest(), Some(2));
    }

    #[test]
    fn concurrent_producer_never_reorders() {
        let slot = Arc::new(InputSlot::new());
        let producer = {
            let slot = Arc::clone(&slot);
            thread::spawn(move || {
                for i in 1..=10_000u64 {
                    slot.publish(i);
                }
            })
        };

        let mut last = 0;
        let mut taken = 0u64;
        while !producer.is_finished() || last < 10_000 {
            if let Some(v) = slot.take_latest() {
                assert!(v > last, "{v} after {last}");
                last = v;
                taken += 1;
            }
        }
        producer.join().unwrap();

        assert_eq!(last, 10_000);
        assert_eq!(taken + slot.overwritten(), slot.published());
    }
}
