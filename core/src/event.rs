//! Readiness events between producer and consumer operators.
//!
//! An operator that writes a tensor on an asynchronous target records a value on
//! a timeline signal once its kernel finishes; operators reading that tensor wait
//! for the value before their kernel runs. Signals only move forward.
//!
//! ```ignore
//! let signal = Arc::new(CpuTimelineSignal::new());
//!
//! // Producer operator, after its kernel
//! signal.set(1);
//!
//! // Consumer operator, before its kernel
//! signal.wait(1, 1000)?;
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::error::{EventTimeoutSnafu, Result};

/// Monotonic timeline signal.
///
/// Waiters block until the signal reaches or exceeds the target value.
pub trait TimelineSignal: Send + Sync + std::fmt::Debug {
    fn value(&self) -> u64;

    /// Advance the signal. Values lower than the current one are ignored.
    fn set(&self, value: u64);

    /// Wait for the signal to reach `value`; `timeout_ms == 0` waits forever.
    fn wait(&self, value: u64, timeout_ms: u64) -> Result<()>;

    fn is_reached(&self, value: u64) -> bool {
        self.value() >= value
    }
}

/// Host timeline signal on an atomic counter and a parking_lot condvar.
#[derive(Debug)]
pub struct CpuTimelineSignal {
    value: AtomicU64,
    // Guards nothing; the condvar needs a mutex to park on.
    mutex: Mutex<()>,
    condvar: Condvar,
}

impl Default for CpuTimelineSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl CpuTimelineSignal {
    pub fn new() -> Self {
        Self::with_initial(0)
    }

    pub fn with_initial(initial: u64) -> Self {
        Self { value: AtomicU64::new(initial), mutex: Mutex::new(()), condvar: Condvar::new() }
    }
}

impl TimelineSignal for CpuTimelineSignal {
    fn value(&self) -> u64 {
        self.value.load(Ordering::Acquire)
    }

    fn set(&self, value: u64) {
        self.value.fetch_max(value, Ordering::Release);

        // Take the lock so a waiter between its check and its park cannot miss the wakeup.
        let _guard = self.mutex.lock();
        self.condvar.notify_all();
    }

    fn wait(&self, target: u64, timeout_ms: u64) -> Result<()> {
        if self.value() >= target {
            return Ok(());
        }

        let mut guard = self.mutex.lock();

        if timeout_ms == 0 {
            while self.value() < target {
                self.condvar.wait(&mut guard);
            }
            return Ok(());
        }

        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        while self.value() < target {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() || self.condvar.wait_for(&mut guard, remaining).timed_out() {
                let current = self.value();
                if current >= target {
                    break;
                }
                return EventTimeoutSnafu { value: target, current, timeout_ms }.fail();
            }
        }
        Ok(())
    }
}
