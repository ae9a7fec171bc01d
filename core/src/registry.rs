//! Operator and kernel registry.
//!
//! Registration is explicit: a [`RegistryBuilder`] collects operator and kernel
//! factories from a single startup routine, [`RegistryBuilder::build`] freezes
//! them into an immutable [`Registry`], and [`init`] installs that registry as the
//! process-wide instance. Nothing registers itself through static initializers,
//! so startup order is deterministic and tests can build private registries.
//!
//! ```ignore
//! let mut builder = RegistryBuilder::new();
//! builder.register_op("expand", Some("expand_grad"), Arc::new(|| Box::new(ExpandOp::new())));
//! builder.register_kernel("expand", Place::HOST_FLOAT, "expand_host", Arc::new(ExpandKernel::create));
//! let registry = lite_core::registry::init(builder.build()?)?;
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use lite_place::Place;
use once_cell::sync::OnceCell;
use snafu::ensure;

use crate::error::{
    DuplicateKernelSnafu, DuplicateOpSnafu, OpNotRegisteredSnafu, RegistryInitializedSnafu,
    RegistryUninitializedSnafu, Result,
};
use crate::framework::OpArgs;
use crate::kernel::{KernelBase, KernelFactory};
use crate::op_lite::OpLite;

/// Creates a fresh, unbuilt operator.
pub type OpFactory = Arc<dyn Fn() -> Box<dyn OpLite> + Send + Sync>;

#[derive(Clone)]
struct OpEntry {
    factory: OpFactory,
    grad_op: Option<String>,
}

#[derive(Clone)]
struct KernelEntry {
    alias: String,
    factory: KernelFactory,
}

/// Collects registrations before they are frozen.
#[derive(Default)]
pub struct RegistryBuilder {
    ops: Vec<(String, OpEntry)>,
    kernels: Vec<(String, Place, KernelEntry)>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an operator type, optionally naming the operator that computes its gradient.
    pub fn register_op(&mut self, op_type: &str, grad_op: Option<&str>, factory: OpFactory) -> &mut Self {
        self.ops.push((op_type.to_string(), OpEntry { factory, grad_op: grad_op.map(str::to_string) }));
        self
    }

    /// Register the kernel serving `op_type` on `place`.
    pub fn register_kernel(&mut self, op_type: &str, place: Place, alias: &str, factory: KernelFactory) -> &mut Self {
        self.kernels.push((op_type.to_string(), place, KernelEntry { alias: alias.to_string(), factory }));
        self
    }

    /// Freeze the registrations. Registering the same operator type, or two kernels
    /// for the same `(op_type, place)`, is an error.
    pub fn build(self) -> Result<Registry> {
        let mut ops = HashMap::with_capacity(self.ops.len());
        for (op_type, entry) in self.ops {
            ensure!(!ops.contains_key(&op_type), DuplicateOpSnafu { op_type });
            ops.insert(op_type, entry);
        }

        let mut kernels = BTreeMap::new();
        for (op_type, place, entry) in self.kernels {
            let key = (op_type, place);
            ensure!(!kernels.contains_key(&key), DuplicateKernelSnafu { op_type: key.0, place });
            kernels.insert(key, entry);
        }

        tracing::debug!(ops = ops.len(), kernels = kernels.len(), "registry built");
        Ok(Registry { ops, kernels })
    }
}

/// Immutable mapping from operator type to operator factory, and from
/// `(operator type, place)` to kernel factory.
pub struct Registry {
    ops: HashMap<String, OpEntry>,
    kernels: BTreeMap<(String, Place), KernelEntry>,
}

impl Registry {
    pub fn has_op(&self, op_type: &str) -> bool {
        self.ops.contains_key(op_type)
    }

    /// Instantiate an unbuilt operator of type `op_type`.
    pub fn create_op(&self, op_type: &str) -> Result<Box<dyn OpLite>> {
        let entry = self.ops.get(op_type).ok_or_else(|| OpNotRegisteredSnafu { op_type }.build())?;
        Ok((entry.factory)())
    }

    /// Name of the gradient operator registered for `op_type`, if any.
    pub fn grad_op_type(&self, op_type: &str) -> Result<Option<&str>> {
        let entry = self.ops.get(op_type).ok_or_else(|| OpNotRegisteredSnafu { op_type }.build())?;
        Ok(entry.grad_op.as_deref())
    }

    /// Registration serving `op_type` on `place`: the exact one if present, else the
    /// first (in place order) whose place matches with `Any` as a wildcard.
    fn lookup(&self, op_type: &str, place: Place) -> Option<(Place, &KernelEntry)> {
        if let Some(entry) = self.kernels.get(&(op_type.to_string(), place)) {
            return Some((place, entry));
        }
        self.kernels
            .iter()
            .find(|((ty, registered), _)| ty == op_type && registered.matches(&place))
            .map(|((_, registered), entry)| (*registered, entry))
    }

    /// Whether some registration serves `op_type` on `place`, wildcards included.
    pub fn has_kernel(&self, op_type: &str, place: Place) -> bool {
        self.lookup(op_type, place).is_some()
    }

    /// Places with a registered kernel for `op_type`, in place order.
    pub fn kernel_places(&self, op_type: &str) -> Vec<Place> {
        self.kernels.keys().filter(|(ty, _)| ty == op_type).map(|(_, place)| *place).collect()
    }

    pub fn kernel_alias(&self, op_type: &str, place: Place) -> Option<&str> {
        self.lookup(op_type, place).map(|(_, entry)| entry.alias.as_str())
    }

    /// Construct one kernel per place in `places` that has a registration for
    /// `args.op_type()`, keeping the caller's order.
    ///
    /// A place without an exact registration falls back to one registered with an
    /// `Any` target or precision. Each registration yields at most one kernel.
    pub fn create_kernels(&self, places: &[Place], args: &OpArgs) -> Result<Vec<Box<dyn KernelBase>>> {
        let mut seen = Vec::with_capacity(places.len());
        let mut kernels = Vec::new();
        for place in places {
            let Some((registered, entry)) = self.lookup(args.op_type(), *place) else {
                continue;
            };
            if seen.contains(&registered) {
                continue;
            }
            seen.push(registered);

            tracing::trace!(op.type = args.op_type(), %place, %registered, kernel = %entry.alias, "creating kernel");
            kernels.push((entry.factory)(args)?);
        }
        Ok(kernels)
    }

    pub fn op_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.ops.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("ops", &self.op_types())
            .field("kernels", &self.kernels.iter().map(|((ty, place), e)| (ty, place, &e.alias)).collect::<Vec<_>>())
            .finish()
    }
}

static REGISTRY: OnceCell<Registry> = OnceCell::new();

/// Install `registry` as the process-wide registry. May be called once.
pub fn init(registry: Registry) -> Result<&'static Registry> {
    REGISTRY.set(registry).map_err(|_| RegistryInitializedSnafu.build())?;
    global()
}

/// The process-wide registry installed by [`init`].
pub fn global() -> Result<&'static Registry> {
    REGISTRY.get().ok_or_else(|| RegistryUninitializedSnafu.build())
}
