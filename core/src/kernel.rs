//! Kernel interface.

use std::sync::Arc;

use lite_place::Place;

use crate::Result;
use crate::framework::OpArgs;

/// The numeric implementation of one operator on one place.
///
/// A kernel captures its input and output tensors when it is constructed (see
/// [`KernelFactory`]) and writes only to those outputs when run. Each operator
/// owns exactly one kernel; kernels are never shared.
pub trait KernelBase: Send {
    /// Execute the computation on the bound tensors.
    fn run(&mut self) -> Result<()>;

    fn place(&self) -> Place;

    /// Kernel name for logging and profiling.
    fn name(&self) -> &str;
}

impl std::fmt::Debug for dyn KernelBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Kernel").field("name", &self.name()).field("place", &self.place()).finish()
    }
}

/// Constructs a kernel bound to an operator's resolved arguments.
pub type KernelFactory = Arc<dyn Fn(&OpArgs) -> Result<Box<dyn KernelBase>> + Send + Sync>;
