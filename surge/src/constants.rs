//! Core constants shared by the queue and the harness.

/// Default queue capacity (must be power of 2)
pub const DEFAULT_QUEUE_CAPACITY: usize = 64 * 1024; // 64K cells

/// Maximum sensible queue capacity
pub const MAX_QUEUE_CAPACITY: usize = 4 * 1024 * 1024; // 4M cells

/// Cache line size for alignment (64 bytes on most CPUs)
pub const CACHE_LINE_SIZE: usize = 64;
