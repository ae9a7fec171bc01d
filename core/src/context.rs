//! Per-operator execution resources.

use std::sync::Arc;

use lite_place::TargetType;

use crate::Result;
use crate::event::TimelineSignal;

/// A signal value an operator waits for or records.
#[derive(Debug, Clone)]
pub struct EventPoint {
    pub signal: Arc<dyn TimelineSignal>,
    pub value: u64,
}

/// Resources owned by exactly one operator: its target and the readiness
/// events it synchronizes on.
///
/// Host operators usually carry no events, which makes both hooks no-ops.
#[derive(Debug, Clone)]
pub struct OpContext {
    target: TargetType,
    waits: Vec<EventPoint>,
    record: Option<EventPoint>,
    timeout_ms: u64,
}

impl OpContext {
    pub fn new(target: TargetType) -> Self {
        Self { target, waits: Vec::new(), record: None, timeout_ms: 0 }
    }

    pub fn target(&self) -> TargetType {
        self.target
    }

    /// Wait for `signal` to reach `value` before the kernel runs.
    pub fn wait_on(mut self, signal: Arc<dyn TimelineSignal>, value: u64) -> Self {
        self.waits.push(EventPoint { signal, value });
        self
    }

    /// Set `signal` to `value` after the kernel runs.
    pub fn record_to(mut self, signal: Arc<dyn TimelineSignal>, value: u64) -> Self {
        self.record = Some(EventPoint { signal, value });
        self
    }

    /// Timeout for each input wait; 0 waits forever.
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    pub fn waits(&self) -> &[EventPoint] {
        &self.waits
    }

    pub fn record(&self) -> Option<&EventPoint> {
        self.record.as_ref()
    }

    /// Block until every input event is ready.
    pub fn sync_input_events(&self) -> Result<()> {
        for point in &self.waits {
            point.signal.wait(point.value, self.timeout_ms)?;
        }
        Ok(())
    }

    /// Tell dependent operators the outputs are ready.
    pub fn record_output_events(&self) {
        if let Some(point) = &self.record {
            point.signal.set(point.value);
        }
    }
}
