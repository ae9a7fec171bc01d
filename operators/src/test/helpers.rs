//! Scopes, descriptors and a private registry for expand tests.

use std::sync::Arc;

use lite_core::framework::grad_var_name;
use lite_core::{KernelPicker, KernelStrategy, OpDesc, OpLite, Registry, RegistryBuilder, Scope, Tensor};
use lite_place::Place;

use crate::expand::{EXPAND, EXPAND_GRAD, EXPAND_TIMES};
use crate::register_all;

/// Registry with every shipped operator, not installed globally.
pub fn registry() -> Registry {
    let mut builder = RegistryBuilder::new();
    register_all(&mut builder);
    builder.build().unwrap()
}

/// Row-major `0, 1, 2, ...` of the given shape.
pub fn iota(dims: &[i64]) -> Vec<f32> {
    let numel: i64 = dims.iter().product();
    (0..numel).map(|i| i as f32).collect()
}

/// Scope holding `x` filled with [`iota`].
pub fn scope_with_x(dims: &[i64]) -> Arc<Scope> {
    let scope = Scope::new();
    scope.set_var("x", Tensor::from_vec(dims, iota(dims)));
    scope
}

pub fn expand_desc(expand_times: &[i32]) -> OpDesc {
    OpDesc::new(EXPAND).input("X", &["x"]).output("Out", &["out"]).attr(EXPAND_TIMES, expand_times.to_vec())
}

pub fn grad_desc(expand_times: &[i32]) -> OpDesc {
    OpDesc::new(EXPAND_GRAD)
        .input("X", &["x"])
        .input(&grad_var_name("Out"), &["out@GRAD"])
        .output(&grad_var_name("X"), &["x@GRAD"])
        .attr(EXPAND_TIMES, expand_times.to_vec())
}

pub fn dims_of(scope: &Scope, name: &str) -> Vec<i64> {
    scope.var(name).unwrap().read().dims().to_vec()
}

pub fn values_of(scope: &Scope, name: &str) -> Vec<f32> {
    scope.var(name).unwrap().read().as_slice::<f32>().unwrap().to_vec()
}

/// Build, check, infer and pick `place` for `desc`.
pub fn instantiate_on(registry: &Registry, desc: &OpDesc, scope: &Scope, place: Place) -> Box<dyn OpLite> {
    KernelPicker::new(registry).instantiate(desc, scope, &[place], KernelStrategy::Specified(place)).unwrap()
}
