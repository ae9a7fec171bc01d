//! Kernel selection.
//!
//! The picker turns an operator's candidate places into exactly one bound kernel:
//!
//! - **Static**: the operator's own default place, no runtime comparison.
//! - **Specified**: a place forced by the caller (e.g. a placement pass).
//! - **Runtime**: every candidate is run on the operator's real inputs and the
//!   cheapest one is kept; the rest are dropped. Candidates that fail while
//!   being profiled are skipped.
//!
//! Runtime selection is reproducible: the first candidate in declared place
//! order wins among equal costs.

pub mod benchmark;

use std::time::Duration;

use lite_place::Place;
use snafu::ensure;

use crate::config::{KernelStrategy, PickerConfig, ProfileConfig};
use crate::error::{KernelNotFoundSnafu, Result};
use crate::framework::{OpArgs, OpDesc, Scope};
use crate::kernel::KernelBase;
use crate::op_lite::OpLite;
use crate::registry::Registry;

pub use benchmark::{ProfileResult, profile_kernel};

/// Measures the cost of running a kernel on its bound arguments.
pub trait CostModel: Send + Sync {
    fn measure(&self, kernel: &mut dyn KernelBase, config: &ProfileConfig) -> Result<Duration>;
}

/// Wall-clock timing through [`profile_kernel`].
#[derive(Debug, Clone, Copy, Default)]
pub struct WallClock;

impl CostModel for WallClock {
    fn measure(&self, kernel: &mut dyn KernelBase, config: &ProfileConfig) -> Result<Duration> {
        Ok(profile_kernel(kernel, config)?.timing(config.take_minimum))
    }
}

/// Selects kernels for operators from a registry.
pub struct KernelPicker<'r> {
    registry: &'r Registry,
    config: PickerConfig,
    cost_model: Box<dyn CostModel>,
}

impl<'r> KernelPicker<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry, config: PickerConfig::default(), cost_model: Box::new(WallClock) }
    }

    pub fn with_config(mut self, config: PickerConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the runtime strategy's cost model.
    pub fn with_cost_model(mut self, cost_model: impl CostModel + 'static) -> Self {
        self.cost_model = Box::new(cost_model);
        self
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    pub fn config(&self) -> &PickerConfig {
        &self.config
    }

    /// Strategy from the picker's configuration.
    pub fn default_strategy(&self) -> KernelStrategy {
        self.config.strategy
    }

    /// Choose and construct the kernel for a built operator.
    ///
    /// Fails with `KernelNotFound` when no acceptable place has a registered kernel
    /// (or, under `Runtime`, none that runs); an operator never ends up without one.
    #[tracing::instrument(skip_all, fields(op.type = op.op_type(), strategy = %strategy))]
    pub fn pick<O: OpLite + ?Sized>(
        &self,
        op: &O,
        valid_places: &[Place],
        strategy: KernelStrategy,
    ) -> Result<Box<dyn KernelBase>> {
        let args = op.base().args()?;

        let kernel = match strategy {
            KernelStrategy::Static => {
                let place = op.static_pick_kernel(valid_places);
                ensure!(
                    valid_places.contains(&place),
                    KernelNotFoundSnafu { op_type: op.op_type(), places: vec![place] }
                );
                self.create_exact(place, args)?
            }
            KernelStrategy::Specified(place) => self.create_exact(place, args)?,
            KernelStrategy::Runtime => self.pick_cheapest(valid_places, args)?,
        };

        tracing::debug!(place = %kernel.place(), kernel = kernel.name(), "picked kernel");
        Ok(kernel)
    }

    fn create_exact(&self, place: Place, args: &OpArgs) -> Result<Box<dyn KernelBase>> {
        let mut kernels = self.registry.create_kernels(&[place], args)?;
        ensure!(!kernels.is_empty(), KernelNotFoundSnafu { op_type: args.op_type(), places: vec![place] });
        Ok(kernels.swap_remove(0))
    }

    fn pick_cheapest(&self, valid_places: &[Place], args: &OpArgs) -> Result<Box<dyn KernelBase>> {
        let candidates = self.registry.create_kernels(valid_places, args)?;

        let mut best: Option<(Duration, Box<dyn KernelBase>)> = None;
        for mut kernel in candidates {
            // A candidate that cannot run on the bound inputs is disqualified.
            let cost = match self.cost_model.measure(kernel.as_mut(), &self.config.profile) {
                Ok(cost) => cost,
                Err(error) => {
                    tracing::debug!(place = %kernel.place(), kernel = kernel.name(), %error, "candidate disqualified");
                    continue;
                }
            };
            tracing::debug!(place = %kernel.place(), kernel = kernel.name(), ?cost, "profiled candidate");

            // Strictly lower: ties keep the earlier candidate.
            if best.as_ref().is_none_or(|(best_cost, _)| cost < *best_cost) {
                best = Some((cost, kernel));
            }
        }

        best.map(|(_, kernel)| kernel)
            .ok_or_else(|| KernelNotFoundSnafu { op_type: args.op_type(), places: valid_places.to_vec() }.build())
    }

    /// Graph-builder lifecycle for one node: create the operator, build it against
    /// `scope`, check and infer shapes, then pick its kernel.
    #[tracing::instrument(skip_all, fields(op.type = desc.op_type()))]
    pub fn instantiate(
        &self,
        desc: &OpDesc,
        scope: &Scope,
        valid_places: &[Place],
        strategy: KernelStrategy,
    ) -> Result<Box<dyn OpLite>> {
        let mut op = self.registry.create_op(desc.op_type())?;
        op.build(desc, scope)?;
        op.check_shape()?;
        op.infer_shape()?;
        op.pick_kernel(self, valid_places, strategy)?;

        if self.config.event_timeout_ms > 0 {
            let base = op.base_mut();
            if let Some(context) = base.op_context().filter(|ctx| ctx.timeout_ms() == 0).cloned() {
                base.set_op_context(context.with_timeout_ms(self.config.event_timeout_ms));
            }
        }

        tracing::debug!(op = %op.debug_string(), "instantiated operator");
        Ok(op)
    }
}

impl std::fmt::Debug for KernelPicker<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KernelPicker").field("registry", self.registry).field("config", &self.config).finish()
    }
}
