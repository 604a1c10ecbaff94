//! surge-bench - concurrent verification driver for the surge queue.
//!
//! Usage: surge-bench [capacity] [producers] [consumers] [ops_per_producer]
//!
//! Defaults to capacity 65536, 4 producers, 4 consumers, 1,000,000 ops
//! per producer. Exits 0 iff the observed checksum matches the
//! expected checksum.

use anyhow::{Context, Result};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use surge_harness::{print_summary, run, HarnessConfig};

fn parse_config() -> Result<HarnessConfig> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut config = HarnessConfig::default();

    if let Some(arg) = args.first() {
        config.capacity = arg.parse().context("invalid capacity")?;
    }
    if let Some(arg) = args.get(1) {
        config.producers = arg.parse().context("invalid producer count")?;
    }
    if let Some(arg) = args.get(2) {
        config.consumers = arg.parse().context("invalid consumer count")?;
    }
    if let Some(arg) = args.get(3) {
        config.ops_per_producer = arg.parse().context("invalid ops per producer")?;
    }

    Ok(config)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = parse_config()?;

    let threads = config.producers + config.consumers;
    let cores = num_cpus::get();
    if threads > cores {
        warn!(threads, cores, "more threads than cores; throughput will be scheduler-bound");
    }

    let report = run(&config)?;
    print_summary(&config, &report);

    if !report.passed() {
        std::process::exit(1);
    }
    Ok(())
}
