//! Light-weight operator base.
//!
//! An operator binds one graph node to its runtime environment and to exactly
//! one kernel. It holds its arguments and execution resources and otherwise acts
//! like a function call:
//!
//! ```text
//! Unbuilt --build--> Built --pick_kernel--> KernelSelected --run--> (re-enterable)
//! ```

use lite_place::Place;
use snafu::{OptionExt, ensure};

use crate::config::KernelStrategy;
use crate::context::OpContext;
use crate::error::{AlreadyBuiltSnafu, KernelNotPickedSnafu, NotBuiltSnafu, Result};
use crate::framework::{OpArgs, OpDesc, Scope};
use crate::kernel::KernelBase;
use crate::picker::KernelPicker;
use crate::registry::Registry;

/// Lifecycle state of an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpState {
    Unbuilt,
    Built,
    KernelSelected,
}

/// State shared by every operator: its type, bound arguments, context and kernel.
#[derive(Debug)]
pub struct OpBase {
    op_type: String,
    op_context: Option<OpContext>,
    args: Option<OpArgs>,
    kernel_place: Option<Place>,
    kernel: Option<Box<dyn KernelBase>>,
    state: OpState,
}

impl OpBase {
    pub fn new(op_type: impl Into<String>) -> Self {
        Self {
            op_type: op_type.into(),
            op_context: None,
            args: None,
            kernel_place: None,
            kernel: None,
            state: OpState::Unbuilt,
        }
    }

    pub fn with_context(op_type: impl Into<String>, context: OpContext) -> Self {
        Self { op_context: Some(context), ..Self::new(op_type) }
    }

    pub fn op_type(&self) -> &str {
        &self.op_type
    }

    pub fn state(&self) -> OpState {
        self.state
    }

    /// Resolve `desc` against `scope` and move to [`OpState::Built`].
    ///
    /// Operators call this first from their `build`; it may succeed only once.
    pub fn attach(&mut self, desc: &OpDesc, scope: &Scope) -> Result<&OpArgs> {
        ensure!(self.state == OpState::Unbuilt, AlreadyBuiltSnafu { op_type: &self.op_type, state: self.state });

        let args = OpArgs::resolve(desc, scope)?;
        self.state = OpState::Built;
        Ok(&*self.args.insert(args))
    }

    /// Arguments resolved by [`OpBase::attach`].
    pub fn args(&self) -> Result<&OpArgs> {
        self.args.as_ref().context(NotBuiltSnafu { op_type: &self.op_type })
    }

    pub fn op_context(&self) -> Option<&OpContext> {
        self.op_context.as_ref()
    }

    /// Replace the execution context, e.g. to wire readiness events after building.
    pub fn set_op_context(&mut self, context: OpContext) {
        self.op_context = Some(context);
    }

    pub fn kernel_place(&self) -> Option<Place> {
        self.kernel_place
    }

    pub fn kernel(&self) -> Option<&dyn KernelBase> {
        self.kernel.as_deref()
    }

    /// Bind a picked kernel. The kernel and its place always change together.
    pub fn bind_kernel(&mut self, kernel: Box<dyn KernelBase>) -> Result<()> {
        ensure!(self.state != OpState::Unbuilt, NotBuiltSnafu { op_type: &self.op_type });

        let place = kernel.place();
        self.op_context.get_or_insert_with(|| OpContext::new(place.target));
        self.kernel_place = Some(place);
        self.kernel = Some(kernel);
        self.state = OpState::KernelSelected;
        Ok(())
    }

    /// Wait for input events, run the kernel, then record output events.
    pub fn run(&mut self) -> Result<()> {
        let kernel = self.kernel.as_mut().context(KernelNotPickedSnafu { op_type: &self.op_type })?;

        if let Some(context) = &self.op_context {
            context.sync_input_events()?;
        }

        kernel.run()?;

        if let Some(context) = &self.op_context {
            context.record_output_events();
        }
        Ok(())
    }
}

/// A light-weight inference operator.
///
/// Implementors supply argument binding (`build`), their default place
/// (`static_pick_kernel`) and a description; shape checking and inference default
/// to accepting anything. Kernel creation, picking and running are provided.
pub trait OpLite: Send {
    /// Bind the operator to its descriptor and scope. Called exactly once.
    fn build(&mut self, desc: &OpDesc, scope: &Scope) -> Result<()>;

    /// Human-readable identity for logs.
    fn debug_string(&self) -> String;

    /// The place this operator runs on under [`KernelStrategy::Static`].
    fn static_pick_kernel(&self, valid_places: &[Place]) -> Place;

    fn base(&self) -> &OpBase;

    fn base_mut(&mut self) -> &mut OpBase;

    /// Validate input shapes and attributes.
    fn check_shape(&self) -> Result<()> {
        Ok(())
    }

    /// Compute output shapes from input shapes and attributes. Must be idempotent.
    fn infer_shape(&self) -> Result<()> {
        Ok(())
    }

    fn op_type(&self) -> &str {
        self.base().op_type()
    }

    fn state(&self) -> OpState {
        self.base().state()
    }

    fn kernel_place(&self) -> Option<Place> {
        self.base().kernel_place()
    }

    /// One kernel for every place in `places` that has a registration for this operator.
    fn create_kernels(&self, registry: &Registry, places: &[Place]) -> Result<Vec<Box<dyn KernelBase>>> {
        registry.create_kernels(places, self.base().args()?)
    }

    /// Select and bind a kernel. Calling it again runs a fresh selection pass.
    fn pick_kernel(&mut self, picker: &KernelPicker<'_>, valid_places: &[Place], strategy: KernelStrategy) -> Result<()> {
        let kernel = picker.pick(&*self, valid_places, strategy)?;
        self.base_mut().bind_kernel(kernel)
    }

    fn run(&mut self) -> Result<()> {
        self.base_mut().run()
    }
}

impl std::fmt::Debug for dyn OpLite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.debug_string())
    }
}
