//! Kernel selection configuration.
//!
//! Provides typed configuration with bon builders and environment variable
//! fallbacks.

use std::str::FromStr;

use bon::bon;
use lite_place::Place;
use snafu::ResultExt;

use crate::error::{Error, PlaceSnafu};

// ============================================================================
// KERNEL STRATEGY
// ============================================================================

/// How an operator chooses among its candidate kernels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KernelStrategy {
    /// The operator's own default place (`static_pick_kernel`).
    #[default]
    Static,

    /// A place fixed externally, e.g. by a placement pass.
    Specified(Place),

    /// Run every candidate once and keep the cheapest.
    Runtime,
}

impl KernelStrategy {
    /// Get the strategy from `LITE_KERNEL_STRATEGY`.
    ///
    /// Accepts `static`, `runtime`, or a place such as `X86/Float`. Unset or
    /// unparsable values fall back to `Static`.
    pub fn from_env() -> Self {
        match std::env::var("LITE_KERNEL_STRATEGY") {
            Ok(value) => value.parse().unwrap_or_else(|err| {
                tracing::warn!(value = %value, error = %err, "ignoring invalid LITE_KERNEL_STRATEGY");
                Self::Static
            }),
            Err(_) => Self::Static,
        }
    }

    pub fn is_runtime(&self) -> bool {
        matches!(self, Self::Runtime)
    }
}

impl FromStr for KernelStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "static" => Ok(Self::Static),
            "runtime" => Ok(Self::Runtime),
            _ => s.parse::<Place>().map(Self::Specified).context(PlaceSnafu),
        }
    }
}

impl std::fmt::Display for KernelStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Static => f.write_str("static"),
            Self::Specified(place) => write!(f, "specified({place})"),
            Self::Runtime => f.write_str("runtime"),
        }
    }
}

// ============================================================================
// PROFILING
// ============================================================================

/// Settings for the runtime strategy's profiling runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileConfig {
    /// Untimed runs before measuring.
    pub warmup_runs: usize,
    /// Timed runs per candidate.
    pub timing_runs: usize,
    /// Use the minimum (true) or the mean (false) of the timed runs.
    pub take_minimum: bool,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self { warmup_runs: 1, timing_runs: 3, take_minimum: true }
    }
}

#[bon]
impl ProfileConfig {
    #[builder]
    pub fn new(
        #[builder(default = 1)] warmup_runs: usize,
        #[builder(default = 3)] timing_runs: usize,
        #[builder(default = true)] take_minimum: bool,
    ) -> Self {
        Self { warmup_runs, timing_runs, take_minimum }
    }

    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// * `LITE_PROFILE_WARMUP` - Warmup runs per candidate (default: 1)
    /// * `LITE_PROFILE_RUNS` - Timed runs per candidate (default: 3, at least 1)
    /// * `LITE_PROFILE_MEAN` - Compare candidates by mean instead of minimum if set
    pub fn from_env() -> Self {
        let warmup_runs = std::env::var("LITE_PROFILE_WARMUP").ok().and_then(|s| s.parse().ok()).unwrap_or(1);
        let timing_runs =
            std::env::var("LITE_PROFILE_RUNS").ok().and_then(|s| s.parse().ok()).unwrap_or(3usize).max(1);
        let take_minimum = std::env::var("LITE_PROFILE_MEAN").is_err();

        Self { warmup_runs, timing_runs, take_minimum }
    }
}

// ============================================================================
// TOP-LEVEL PICKER CONFIGURATION
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PickerConfig {
    /// Strategy returned by `KernelPicker::default_strategy`.
    pub strategy: KernelStrategy,
    pub profile: ProfileConfig,
    /// Timeout for input event waits, in milliseconds (0 = wait forever).
    pub event_timeout_ms: u64,
}

#[bon]
impl PickerConfig {
    #[builder]
    pub fn new(
        #[builder(default)] strategy: KernelStrategy,
        #[builder(default)] profile: ProfileConfig,
        #[builder(default = 0)] event_timeout_ms: u64,
    ) -> Self {
        Self { strategy, profile, event_timeout_ms }
    }

    /// * `LITE_KERNEL_STRATEGY`, `LITE_PROFILE_*` - see [`KernelStrategy::from_env`] and [`ProfileConfig::from_env`]
    /// * `LITE_EVENT_TIMEOUT_MS` - Input event wait timeout (default: 0, no timeout)
    pub fn from_env() -> Self {
        let strategy = KernelStrategy::from_env();
        let profile = ProfileConfig::from_env();
        let event_timeout_ms = std::env::var("LITE_EVENT_TIMEOUT_MS").ok().and_then(|s| s.parse().ok()).unwrap_or(0);

        Self { strategy, profile, event_timeout_ms }
    }
}
