//! Shared environment configuration for the forecast binaries.
//!
//! Consolidates `FORECAST_THREADS`, `FORECAST_PORT`, `FORECAST_SEED`, and
//! `FORECAST_TRIALS` reads, plus tracing setup.

use tracing_subscriber::EnvFilter;

use crate::constants::{DEFAULT_SEED, DEFAULT_TRIALS};

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

/// Install the fmt subscriber. `RUST_LOG` overrides the default `info` filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .ok(); // May fail if already initialized
}

/// Read `FORECAST_THREADS` (fallback `RAYON_NUM_THREADS`) and build the rayon
/// global pool. Tolerates an already-initialized pool. Returns thread count.
pub fn init_rayon_threads_lenient() -> usize {
    let requested: Option<usize> =
        env_parse("FORECAST_THREADS").or_else(|| env_parse("RAYON_NUM_THREADS"));
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = requested {
        builder = builder.num_threads(n);
    }
    builder.build_global().ok();
    let num_threads = rayon::current_num_threads();
    tracing::info!(threads = num_threads, "rayon pool ready");
    num_threads
}

/// Read `FORECAST_PORT` (default 9000).
pub fn server_port() -> u16 {
    env_parse("FORECAST_PORT").unwrap_or(9000)
}

/// Read `FORECAST_SEED` (default [`DEFAULT_SEED`]).
pub fn default_seed() -> u64 {
    env_parse("FORECAST_SEED").unwrap_or(DEFAULT_SEED)
}

/// Read `FORECAST_TRIALS` (default [`DEFAULT_TRIALS`]).
pub fn default_trials() -> usize {
    env_parse("FORECAST_TRIALS").unwrap_or(DEFAULT_TRIALS)
}
