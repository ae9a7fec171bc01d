//! Operators shipped with the dispatch core.
//!
//! [`init`] is the single startup routine: it registers every operator and
//! kernel in this crate and installs the resulting registry process-wide.

pub mod expand;

#[cfg(test)]
pub mod test;

use lite_core::registry::{self, Registry, RegistryBuilder};

pub use expand::{ExpandGradOp, ExpandOp};

/// Register every shipped operator and kernel.
pub fn register_all(builder: &mut RegistryBuilder) -> &mut RegistryBuilder {
    expand::register(builder)
}

/// Build the registry of shipped operators and install it as the process-wide
/// instance. Fails if a registry was already installed.
pub fn init() -> lite_core::Result<&'static Registry> {
    let mut builder = RegistryBuilder::new();
    register_all(&mut builder);
    let registry = registry::init(builder.build()?)?;
    tracing::debug!(ops = ?registry.op_types(), "operators registered");
    Ok(registry)
}
