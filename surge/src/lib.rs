//! Surge - a bounded lock-free MPMC queue.
//!
//! Implements Dmitry Vyukov's bounded multi-producer/multi-consumer
//! ring-buffer algorithm: a fixed power-of-two array of cells, two
//! cache-line-isolated cursors, and a per-cell generation counter that
//! arbitrates slot ownership across laps of the ring.
//!
//! ## Guarantees
//!
//! - Lock-free: no mutex, no condition variable, no blocking wait
//! - `enqueue`/`dequeue` return immediately on full/empty
//! - No loss, no duplication: each enqueued value is returned by
//!   exactly one dequeue
//! - Per-slot acquire/release handshake makes the payload write
//!   visible before the paired read
//!
//! ## Non-guarantees
//!
//! - No total FIFO order across racing producers; concurrent producers
//!   are ordered by whichever wins the cursor CAS
//! - Capacity is fixed at construction; the queue never resizes
//!
//! See `surge-harness` for the concurrent verification harness and the
//! `surge-bench` driver.

pub mod constants;
pub mod error;
pub mod mpmc;

pub use error::{Result, SurgeError};
pub use mpmc::MpmcQueue;
