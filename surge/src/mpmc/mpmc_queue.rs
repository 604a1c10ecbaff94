//! Bounded MPMC queue implementation.
//!
//! Cell state machine, per physical index `k` on lap `l`:
//! `sequence == l*N + k` means empty-and-writable, `l*N + k + 1` means
//! full-and-readable. An enqueue completion moves the cell from
//! writable to readable; a dequeue completion moves it to writable for
//! lap `l + 1`. The sequence is the sole gate deciding who may touch
//! the cell.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_utils::CachePadded;

use crate::error::{Result, SurgeError};

/// One ring slot: generation counter plus payload.
struct Cell<T> {
    sequence: AtomicU64,
    value: UnsafeCell<T>,
}

/// Bounded lock-free multi-producer/multi-consumer queue.
///
/// Fixed power-of-two capacity, allocated once at construction and
/// never resized. Cells are reused indefinitely across laps of the
/// ring. Both cursors live on their own cache lines, separate from
/// each other and from the cell array, to avoid false sharing.
pub struct MpmcQueue<T> {
    cells: Box<[Cell<T>]>,
    mask: u64,
    enqueue_cursor: CachePadded<AtomicU64>,
    dequeue_cursor: CachePadded<AtomicU64>,
}

// The UnsafeCell payload is only ever accessed by the thread that won
// the cell via the sequence handshake.
unsafe impl<T: Send> Send for MpmcQueue<T> {}
unsafe impl<T: Send> Sync for MpmcQueue<T> {}

impl<T: Copy + Default> MpmcQueue<T> {
    /// Create a queue with the given capacity.
    ///
    /// Fails with a configuration error if `capacity` is below two or
    /// not a power of two (the mask-based indexing requires a power of
    /// two).
    pub fn new(capacity: usize) -> Result<Self> {
        // With one cell the lap-1 writable tag equals the lap-0
        // readable tag, so the generation handshake needs N >= 2.
        if capacity < 2 {
            return Err(SurgeError::config("Capacity must be at least 2"));
        }
        if !capacity.is_power_of_two() {
            return Err(SurgeError::config("Capacity must be power of 2"));
        }

        // Sequence pre-seeded to the physical index: every cell starts
        // writable for lap 0.
        let cells = (0..capacity as u64)
            .map(|i| Cell {
                sequence: AtomicU64::new(i),
                value: UnsafeCell::new(T::default()),
            })
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Ok(Self {
            cells,
            mask: (capacity as u64) - 1,
            enqueue_cursor: CachePadded::new(AtomicU64::new(0)),
            dequeue_cursor: CachePadded::new(AtomicU64::new(0)),
        })
    }

    /// Attempt to publish one value.
    ///
    /// Returns `false` immediately if the queue is observed full; the
    /// caller decides whether and how to retry. On success the value
    /// becomes visible to exactly one future `dequeue`.
    pub fn enqueue(&self, value: T) -> bool {
        let mut pos = self.enqueue_cursor.load(Ordering::Relaxed);

        loop {
            let cell = &self.cells[(pos & self.mask) as usize];
            // Acquire pairs with the Release in dequeue: once the cell
            // reads as writable, the previous lap's read is done.
            let seq = cell.sequence.load(Ordering::Acquire);
            let diff = (seq as i64) - (pos as i64);

            if diff == 0 {
                // Cell is writable for exactly this position; race the
                // other producers for it.
                match self.enqueue_cursor.compare_exchange_weak(
                    pos,
                    pos + 1,
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        // Exclusive owner of the cell for this lap.
                        unsafe {
                            *cell.value.get() = value;
                        }
                        cell.sequence.store(pos + 1, Ordering::Release);
                        return true;
                    }
                    Err(current) => {
                        pos = current;
                        std::hint::spin_loop();
                    }
                }
            } else if diff < 0 {
                // Cell still holds an unconsumed previous lap: full.
                return false;
            } else {
                // Another producer already moved past our cached pos;
                // chase the cursor.
                std::hint::spin_loop();
                pos = self.enqueue_cursor.load(Ordering::Relaxed);
            }
        }
    }

    /// Attempt to claim and remove one value.
    ///
    /// Returns `None` immediately if the queue is observed empty. On
    /// success the returned value is never returned again.
    pub fn dequeue(&self) -> Option<T> {
        let mut pos = self.dequeue_cursor.load(Ordering::Relaxed);

        loop {
            let cell = &self.cells[(pos & self.mask) as usize];
            // Acquire pairs with the Release in enqueue, making the
            // payload write visible before we read it.
            let seq = cell.sequence.load(Ordering::Acquire);
            let diff = (seq as i64) - ((pos + 1) as i64);

            if diff == 0 {
                match self.dequeue_cursor.compare_exchange_weak(
                    pos,
                    pos + 1,
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        let value = unsafe { *cell.value.get() };
                        // Mark the cell writable for the next lap.
                        cell.sequence
                            .store(pos + self.cells.len() as u64, Ordering::Release);
                        return Some(value);
                    }
                    Err(current) => {
                        pos = current;
                        std::hint::spin_loop();
                    }
                }
            } else if diff < 0 {
                // No producer has published this position yet: empty.
                return None;
            } else {
                std::hint::spin_loop();
                pos = self.dequeue_cursor.load(Ordering::Relaxed);
            }
        }
    }

    /// Queue capacity in cells.
    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.cells.len()
    }

    /// Approximate number of queued values.
    ///
    /// A racy snapshot of the two cursors; exact only when no other
    /// thread is operating on the queue.
    pub fn len(&self) -> usize {
        let tail = self.enqueue_cursor.load(Ordering::Relaxed);
        let head = self.dequeue_cursor.load(Ordering::Relaxed);
        tail.saturating_sub(head) as usize
    }

    /// Whether the queue is (approximately) empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU64;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_construction_validation() {
        assert!(MpmcQueue::<u64>::new(1024).is_ok());
        assert!(MpmcQueue::<u64>::new(2).is_ok());

        assert!(matches!(
            MpmcQueue::<u64>::new(0),
            Err(SurgeError::InvalidConfig { .. })
        ));
        assert!(matches!(
            MpmcQueue::<u64>::new(1),
            Err(SurgeError::InvalidConfig { .. })
        ));
        assert!(matches!(
            MpmcQueue::<u64>::new(100),
            Err(SurgeError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_single_thread_round_trip() {
        let queue = MpmcQueue::<u64>::new(16).unwrap();

        assert!(queue.is_empty());
        assert!(queue.enqueue(42));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.dequeue(), Some(42));
        assert!(queue.is_empty());
        assert_eq!(queue.dequeue(), None);
    }

    #[test]
    fn test_capacity_boundary() {
        let queue = MpmcQueue::<u64>::new(8).unwrap();

        for i in 0..8 {
            assert!(queue.enqueue(i), "enqueue {} should succeed", i);
        }
        // Ninth enqueue observes a full queue.
        assert!(!queue.enqueue(99));
        assert_eq!(queue.len(), 8);

        assert_eq!(queue.dequeue(), Some(0));
        assert!(queue.enqueue(99));
        assert!(!queue.enqueue(100));
    }

    #[test]
    fn test_non_blocking_liveness() {
        // Without contention, a non-full/non-empty queue never reports
        // a spurious failure.
        let queue = MpmcQueue::<u64>::new(4).unwrap();

        for round in 0..100 {
            assert!(queue.enqueue(round));
            assert!(queue.enqueue(round + 1));
            assert_eq!(queue.dequeue(), Some(round));
            assert_eq!(queue.dequeue(), Some(round + 1));
        }
    }

    #[test]
    fn test_wrap_around_preserves_order() {
        // 40 sequential pairs through a capacity-8 ring: five full laps
        // of cell reuse, values must come back in submission order.
        let queue = MpmcQueue::<u64>::new(8).unwrap();

        for i in 0..40u64 {
            assert!(queue.enqueue(i));
            assert_eq!(queue.dequeue(), Some(i));
        }
        assert!(queue.is_empty());
    }

    #[test]
    fn test_wrap_around_when_staying_partially_full() {
        let queue = MpmcQueue::<u64>::new(8).unwrap();

        // Keep 4 values in flight while cycling well past capacity.
        for i in 0..4u64 {
            assert!(queue.enqueue(i));
        }
        for i in 4..64u64 {
            assert!(queue.enqueue(i));
            assert_eq!(queue.dequeue(), Some(i - 4));
        }
        for i in 60..64u64 {
            assert_eq!(queue.dequeue(), Some(i));
        }
        assert_eq!(queue.dequeue(), None);
    }

    #[test]
    fn test_minimum_capacity() {
        let queue = MpmcQueue::<u64>::new(2).unwrap();

        assert!(queue.enqueue(7));
        assert!(queue.enqueue(8));
        assert!(!queue.enqueue(9));
        assert_eq!(queue.dequeue(), Some(7));
        assert_eq!(queue.dequeue(), Some(8));
        assert_eq!(queue.dequeue(), None);
        assert!(queue.enqueue(9));
        assert_eq!(queue.dequeue(), Some(9));
    }

    #[test]
    fn test_mpmc_no_loss_no_duplication() {
        let queue = Arc::new(MpmcQueue::<u64>::new(64).unwrap());
        let num_producers = 4u64;
        let num_consumers = 4;
        let ops_per_producer = 10_000u64;
        let expected_total = num_producers * ops_per_producer;
        let consumed = Arc::new(AtomicU64::new(0));

        let mut producers = vec![];
        for id in 0..num_producers {
            let queue = queue.clone();
            producers.push(thread::spawn(move || {
                let base = id * ops_per_producer;
                for i in 0..ops_per_producer {
                    let value = base + i + 1;
                    while !queue.enqueue(value) {
                        thread::yield_now();
                    }
                }
            }));
        }

        let mut consumers = vec![];
        for _ in 0..num_consumers {
            let queue = queue.clone();
            let consumed = consumed.clone();
            consumers.push(thread::spawn(move || {
                let mut sum = 0u64;
                while consumed.load(Ordering::Relaxed) < expected_total {
                    if let Some(value) = queue.dequeue() {
                        sum += value;
                        consumed.fetch_add(1, Ordering::Relaxed);
                    } else {
                        thread::yield_now();
                    }
                }
                sum
            }));
        }

        for p in producers {
            p.join().unwrap();
        }
        let total_sum: u64 = consumers.into_iter().map(|c| c.join().unwrap()).sum();

        let expected_sum: u64 = (0..num_producers)
            .map(|id| {
                let base = id * ops_per_producer;
                ops_per_producer * base + ops_per_producer * (ops_per_producer + 1) / 2
            })
            .sum();

        assert_eq!(consumed.load(Ordering::Relaxed), expected_total);
        assert_eq!(total_sum, expected_sum, "lost or duplicated value");
        assert_eq!(queue.dequeue(), None);
    }
}
