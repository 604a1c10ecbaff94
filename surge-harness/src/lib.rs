//! Producer/consumer verification harness for the surge MPMC queue.
//!
//! Drives one shared queue from P producer and C consumer OS threads
//! and checks an end-to-end checksum: producer `i` sends the distinct
//! values `base_i + 1 ..= base_i + OPS` (`base_i = i * OPS`), every
//! consumer accumulates a private sum, and the grand total must match
//! the closed-form sum of those arithmetic progressions. A mismatch
//! means a value was lost or duplicated.
//!
//! Waiting is cooperative: producers yield while the queue reports
//! full, consumers yield while it reports empty. No thread ever
//! blocks on a condition variable.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use surge::{MpmcQueue, Result, SurgeError};

/// Configuration for a harness run
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Queue capacity (must be power of 2)
    pub capacity: usize,
    /// Number of producer threads
    pub producers: usize,
    /// Number of consumer threads
    pub consumers: usize,
    /// Values enqueued by each producer
    pub ops_per_producer: u64,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            capacity: surge::constants::DEFAULT_QUEUE_CAPACITY,
            producers: 4,
            consumers: 4,
            ops_per_producer: 1_000_000,
        }
    }
}

impl HarnessConfig {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            ..Default::default()
        }
    }

    pub fn with_producers(mut self, n: usize) -> Self {
        self.producers = n;
        self
    }

    pub fn with_consumers(mut self, n: usize) -> Self {
        self.consumers = n;
        self
    }

    pub fn with_ops_per_producer(mut self, ops: u64) -> Self {
        self.ops_per_producer = ops;
        self
    }

    /// Total number of values the run moves through the queue.
    pub fn expected_total(&self) -> u64 {
        self.producers as u64 * self.ops_per_producer
    }

    /// Closed-form sum of every value the producers emit.
    ///
    /// Producer `i` sends `base_i + 1 ..= base_i + OPS`, which sums to
    /// `OPS * base_i + OPS * (OPS + 1) / 2`.
    pub fn expected_checksum(&self) -> u64 {
        let ops = self.ops_per_producer;
        (0..self.producers as u64)
            .map(|i| {
                let base = i * ops;
                ops * base + ops * (ops + 1) / 2
            })
            .sum()
    }

    fn validate(&self) -> Result<()> {
        if self.producers == 0 {
            return Err(SurgeError::config("Number of producers must be greater than 0"));
        }
        if self.consumers == 0 {
            return Err(SurgeError::config("Number of consumers must be greater than 0"));
        }
        Ok(())
    }
}

/// Outcome of a harness run
#[derive(Debug, Clone)]
pub struct HarnessReport {
    pub elapsed: Duration,
    pub total_produced: u64,
    pub total_consumed: u64,
    pub checksum: u64,
    pub expected_checksum: u64,
}

impl HarnessReport {
    /// Completed dequeues per second.
    pub fn throughput(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.total_consumed as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Whether the run preserved every value exactly once.
    pub fn passed(&self) -> bool {
        self.checksum == self.expected_checksum && self.total_produced == self.total_consumed
    }
}

/// Run the harness against a freshly constructed queue.
///
/// Spawns `config.producers` + `config.consumers` threads sharing one
/// queue, joins them all, and aggregates the result. Construction
/// errors (bad capacity, zero thread counts) are reported before any
/// thread starts.
pub fn run(config: &HarnessConfig) -> Result<HarnessReport> {
    config.validate()?;
    let queue = Arc::new(MpmcQueue::<u64>::new(config.capacity)?);

    let expected_total = config.expected_total();
    let ops = config.ops_per_producer;
    let consumed = Arc::new(AtomicU64::new(0));

    info!(
        capacity = config.capacity,
        producers = config.producers,
        consumers = config.consumers,
        ops_per_producer = ops,
        "starting harness run"
    );

    let start = Instant::now();

    let mut producer_handles = Vec::with_capacity(config.producers);
    for id in 0..config.producers as u64 {
        let queue = queue.clone();
        producer_handles.push(thread::spawn(move || {
            let base = id * ops;
            let mut sent = 0u64;
            for i in 0..ops {
                // 1-based so no payload is ever the default 0.
                let value = base + i + 1;
                while !queue.enqueue(value) {
                    thread::yield_now();
                }
                sent += 1;
            }
            sent
        }));
    }

    let mut consumer_handles = Vec::with_capacity(config.consumers);
    for id in 0..config.consumers {
        let queue = queue.clone();
        let consumed = consumed.clone();
        consumer_handles.push(thread::spawn(move || {
            let mut sum = 0u64;
            let mut received = 0u64;
            while consumed.load(Ordering::Relaxed) < expected_total {
                if let Some(value) = queue.dequeue() {
                    sum += value;
                    received += 1;
                    consumed.fetch_add(1, Ordering::Relaxed);
                } else {
                    thread::yield_now();
                }
            }
            debug!(consumer = id, received, "consumer drained");
            (sum, received)
        }));
    }

    let mut total_produced = 0u64;
    for handle in producer_handles {
        total_produced += handle
            .join()
            .map_err(|_| SurgeError::system_resource("producer thread panicked"))?;
    }

    let mut checksum = 0u64;
    let mut total_consumed = 0u64;
    for handle in consumer_handles {
        let (sum, received) = handle
            .join()
            .map_err(|_| SurgeError::system_resource("consumer thread panicked"))?;
        checksum += sum;
        total_consumed += received;
    }

    let report = HarnessReport {
        elapsed: start.elapsed(),
        total_produced,
        total_consumed,
        checksum,
        expected_checksum: config.expected_checksum(),
    };

    info!(
        elapsed_ms = report.elapsed.as_millis() as u64,
        throughput = report.throughput() as u64,
        passed = report.passed(),
        "harness run finished"
    );

    Ok(report)
}

/// Print the single summary record for a run.
pub fn print_summary(config: &HarnessConfig, report: &HarnessReport) {
    println!("surge MPMC harness");
    println!(
        "  config:            capacity={} producers={} consumers={} ops/producer={}",
        config.capacity, config.producers, config.consumers, config.ops_per_producer
    );
    println!("  elapsed:           {:.3}s", report.elapsed.as_secs_f64());
    println!("  throughput:        {:.0} dequeues/s", report.throughput());
    println!("  total produced:    {}", report.total_produced);
    println!("  total consumed:    {}", report.total_consumed);
    println!("  checksum:          {}", report.checksum);
    println!("  expected checksum: {}", report.expected_checksum);
    if report.passed() {
        println!("  result:            PASSED");
    } else {
        println!("  result:            FAILED (lost or duplicated value)");
    }
}
