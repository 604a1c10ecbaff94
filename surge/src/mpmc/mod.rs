//! Bounded MPMC ring queue (Vyukov algorithm).
//!
//! One cell array, two cursors, no locks. Producers race on the
//! enqueue cursor, consumers on the dequeue cursor; a per-cell
//! generation counter decides which lap of the ring a cell is valid
//! for, so a slow thread can never write into or read from a reused
//! slot.
//!
//! ## Ordering model
//!
//! - Cursor loads and the claim CAS are Relaxed; cursor visibility is
//!   never relied on for correctness
//! - The cell sequence is loaded with Acquire and stored with Release,
//!   which is the only happens-before edge between a payload write and
//!   the paired read

mod mpmc_queue;

pub use mpmc_queue::MpmcQueue;
