//! Operator descriptors and their resolution against a scope.

use std::collections::BTreeMap;

use super::attribute::{AttrValue, Attribute};
use super::scope::Scope;
use super::tensor::TensorHandle;
use crate::error::{AttrNotFoundSnafu, MissingInputSnafu, MissingOutputSnafu, Result};

/// Suffix appended to a variable name to form its gradient's name.
pub const GRAD_VAR_SUFFIX: &str = "@GRAD";

/// `grad_var_name("X") == "X@GRAD"`.
pub fn grad_var_name(name: &str) -> String {
    format!("{name}{GRAD_VAR_SUFFIX}")
}

/// Read-only description of one graph node: its type, argument slots and attributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OpDesc {
    op_type: String,
    inputs: BTreeMap<String, Vec<String>>,
    outputs: BTreeMap<String, Vec<String>>,
    attrs: BTreeMap<String, Attribute>,
}

impl OpDesc {
    pub fn new(op_type: impl Into<String>) -> Self {
        Self { op_type: op_type.into(), ..Default::default() }
    }

    pub fn input(mut self, slot: &str, vars: &[&str]) -> Self {
        self.inputs.insert(slot.to_string(), vars.iter().map(|v| v.to_string()).collect());
        self
    }

    pub fn output(mut self, slot: &str, vars: &[&str]) -> Self {
        self.outputs.insert(slot.to_string(), vars.iter().map(|v| v.to_string()).collect());
        self
    }

    pub fn attr(mut self, name: &str, value: impl Into<Attribute>) -> Self {
        self.attrs.insert(name.to_string(), value.into());
        self
    }

    pub fn op_type(&self) -> &str {
        &self.op_type
    }

    pub fn inputs(&self) -> &BTreeMap<String, Vec<String>> {
        &self.inputs
    }

    pub fn outputs(&self) -> &BTreeMap<String, Vec<String>> {
        &self.outputs
    }

    /// Variable names bound to input `slot`; empty if the slot is absent.
    pub fn input_names(&self, slot: &str) -> &[String] {
        self.inputs.get(slot).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn output_names(&self, slot: &str) -> &[String] {
        self.outputs.get(slot).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn has_input(&self, slot: &str) -> bool {
        !self.input_names(slot).is_empty()
    }

    pub fn has_output(&self, slot: &str) -> bool {
        !self.output_names(slot).is_empty()
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }

    /// Typed attribute lookup, e.g. `desc.get_attr::<Vec<i32>>("expandTimes")`.
    pub fn get_attr<T: AttrValue>(&self, name: &str) -> Result<T> {
        let attr = self.attrs.get(name).ok_or_else(|| AttrNotFoundSnafu { name }.build())?;
        T::extract(name, attr)
    }

    pub fn attrs(&self) -> &BTreeMap<String, Attribute> {
        &self.attrs
    }
}

/// A descriptor resolved against a scope: every slot maps to live tensor handles.
///
/// Kernel factories receive these so a kernel captures its inputs and outputs
/// when it is constructed.
#[derive(Debug, Clone, Default)]
pub struct OpArgs {
    op_type: String,
    inputs: BTreeMap<String, Vec<TensorHandle>>,
    outputs: BTreeMap<String, Vec<TensorHandle>>,
    attrs: BTreeMap<String, Attribute>,
}

impl OpArgs {
    /// Resolve all slots of `desc`. Inputs must already exist in `scope` or an
    /// ancestor; outputs are created in `scope` when missing.
    pub fn resolve(desc: &OpDesc, scope: &Scope) -> Result<Self> {
        let mut inputs = BTreeMap::new();
        for (slot, names) in desc.inputs() {
            let handles = names.iter().map(|name| scope.var(name)).collect::<Result<Vec<_>>>()?;
            inputs.insert(slot.clone(), handles);
        }

        let mut outputs = BTreeMap::new();
        for (slot, names) in desc.outputs() {
            let handles =
                names.iter().map(|name| scope.find_var(name).unwrap_or_else(|| scope.new_var(name))).collect();
            outputs.insert(slot.clone(), handles);
        }

        Ok(Self { op_type: desc.op_type().to_string(), inputs, outputs, attrs: desc.attrs().clone() })
    }

    pub fn op_type(&self) -> &str {
        &self.op_type
    }

    /// First tensor bound to input `slot`.
    pub fn input(&self, slot: &str) -> Result<TensorHandle> {
        self.inputs
            .get(slot)
            .and_then(|v| v.first())
            .cloned()
            .ok_or_else(|| MissingInputSnafu { op_type: &self.op_type, slot }.build())
    }

    pub fn output(&self, slot: &str) -> Result<TensorHandle> {
        self.outputs
            .get(slot)
            .and_then(|v| v.first())
            .cloned()
            .ok_or_else(|| MissingOutputSnafu { op_type: &self.op_type, slot }.build())
    }

    pub fn inputs(&self, slot: &str) -> &[TensorHandle] {
        self.inputs.get(slot).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn outputs(&self, slot: &str) -> &[TensorHandle] {
        self.outputs.get(slot).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn has_output(&self, slot: &str) -> bool {
        !self.outputs(slot).is_empty()
    }

    pub fn attr<T: AttrValue>(&self, name: &str) -> Result<T> {
        let attr = self.attrs.get(name).ok_or_else(|| AttrNotFoundSnafu { name }.build())?;
        T::extract(name, attr)
    }
}
