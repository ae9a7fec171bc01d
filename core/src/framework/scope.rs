//! Hierarchical variable storage.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::tensor::{Tensor, TensorHandle};
use crate::error::{Result, VarNotFoundSnafu};

/// Maps variable names to tensors.
///
/// Lookups fall back to the parent chain, so operators built in a child scope
/// see weights and feeds held by their ancestors. Variables are created in the
/// scope that `new_var` is called on.
#[derive(Debug, Default)]
pub struct Scope {
    vars: RwLock<HashMap<String, TensorHandle>>,
    parent: Option<Arc<Scope>>,
}

impl Scope {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Create a child scope whose lookups fall back to `self`.
    pub fn new_scope(self: &Arc<Self>) -> Arc<Self> {
        Arc::new(Self { vars: RwLock::new(HashMap::new()), parent: Some(Arc::clone(self)) })
    }

    pub fn parent(&self) -> Option<&Arc<Scope>> {
        self.parent.as_ref()
    }

    /// Return the local variable `name`, creating an empty tensor if absent.
    pub fn new_var(&self, name: &str) -> TensorHandle {
        // Fast path: read lock
        if let Some(var) = self.vars.read().get(name) {
            return Arc::clone(var);
        }

        let mut vars = self.vars.write();
        Arc::clone(vars.entry(name.to_string()).or_insert_with(|| Tensor::new().into_handle()))
    }

    /// Create (or overwrite) the local variable `name` with `tensor`.
    pub fn set_var(&self, name: &str, tensor: Tensor) -> TensorHandle {
        let handle = self.new_var(name);
        *handle.write() = tensor;
        handle
    }

    /// Look `name` up in this scope and then its ancestors.
    pub fn find_var(&self, name: &str) -> Option<TensorHandle> {
        if let Some(var) = self.vars.read().get(name) {
            return Some(Arc::clone(var));
        }
        self.parent.as_ref().and_then(|parent| parent.find_var(name))
    }

    /// Like [`Scope::find_var`] but reports a missing variable as an error.
    pub fn var(&self, name: &str) -> Result<TensorHandle> {
        self.find_var(name).ok_or_else(|| VarNotFoundSnafu { name }.build())
    }

    pub fn contains_local(&self, name: &str) -> bool {
        self.vars.read().contains_key(name)
    }

    /// Names of the variables held directly by this scope, sorted.
    pub fn local_var_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.vars.read().keys().cloned().collect();
        names.sort();
        names
    }
}
