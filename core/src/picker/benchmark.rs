//! Kernel profiling for the runtime strategy.
//!
//! Candidates are run on the operator's real inputs; timings are comparable
//! only among kernels bound to the same arguments.

use std::time::{Duration, Instant};

use crate::Result;
use crate::config::ProfileConfig;
use crate::kernel::KernelBase;

/// Result of profiling one kernel.
#[derive(Debug, Clone)]
pub struct ProfileResult {
    /// Minimum execution time.
    pub min: Duration,
    /// Mean execution time.
    pub mean: Duration,
    /// All timing measurements.
    pub runs: Vec<Duration>,
}

impl ProfileResult {
    /// Get the timing value based on config preference.
    pub fn timing(&self, take_minimum: bool) -> Duration {
        if take_minimum { self.min } else { self.mean }
    }
}

/// Profile a kernel's execution time.
///
/// Runs warmup iterations (discarded), then timing iterations. The kernel
/// writes its outputs on every run, so profiling leaves them holding the
/// result of the last run.
pub fn profile_kernel(kernel: &mut dyn KernelBase, config: &ProfileConfig) -> Result<ProfileResult> {
    // Warmup runs (discard timing)
    for _ in 0..config.warmup_runs {
        kernel.run()?;
    }

    let mut runs = Vec::with_capacity(config.timing_runs.max(1));
    for _ in 0..config.timing_runs.max(1) {
        let start = Instant::now();
        kernel.run()?;
        runs.push(start.elapsed());
    }

    let min = runs.iter().copied().min().unwrap_or(Duration::ZERO);
    let total: Duration = runs.iter().sum();
    let mean = total / runs.len().max(1) as u32;

    tracing::trace!(kernel = kernel.name(), ?min, ?mean, "profiled kernel");
    Ok(ProfileResult { min, mean, runs })
}
