//! Expand: tile a tensor along every dimension.
//!
//! `Out[i] = X[i % x_dims]` with `out_dims[d] = x_dims[d] * expandTimes[d]`. The
//! gradient folds `Out@GRAD` back onto `X`'s shape by summing every tile.

pub mod grad;
pub mod kernels;

use std::sync::Arc;

use lite_core::error::{
    AttrLengthMismatchSnafu, AttrValueOutOfRangeSnafu, MissingInputSnafu, MissingOutputSnafu, NegativeDimSnafu,
    RankOutOfRangeSnafu, ShapeOverflowSnafu,
};
use lite_core::{DDim, OpBase, OpDesc, OpLite, RegistryBuilder, Result, Scope};
use lite_place::Place;
use snafu::{OptionExt, ensure};

pub use grad::ExpandGradOp;
use kernels::{ExpandGradKernel, ExpandKernel, Layout};

pub const EXPAND: &str = "expand";
pub const EXPAND_GRAD: &str = "expand_grad";
pub const EXPAND_TIMES: &str = "expandTimes";

/// Highest input rank the kernels support.
pub const MAX_RANK: usize = 6;

/// Register both operators and their kernels.
pub fn register(builder: &mut RegistryBuilder) -> &mut RegistryBuilder {
    builder
        .register_op(EXPAND, Some(EXPAND_GRAD), Arc::new(|| Box::new(ExpandOp::new()) as Box<dyn OpLite>))
        .register_op(EXPAND_GRAD, None, Arc::new(|| Box::new(ExpandGradOp::new()) as Box<dyn OpLite>))
        .register_kernel(
            EXPAND,
            Place::HOST_FLOAT,
            "expand_host_f32",
            ExpandKernel::<f32>::factory("expand_host_f32", Place::HOST_FLOAT, Layout::Elementwise),
        )
        .register_kernel(
            EXPAND,
            Place::X86_FLOAT,
            "expand_x86_f32",
            ExpandKernel::<f32>::factory("expand_x86_f32", Place::X86_FLOAT, Layout::Rows),
        )
        .register_kernel(
            EXPAND,
            Place::HOST_INT32,
            "expand_host_i32",
            ExpandKernel::<i32>::factory("expand_host_i32", Place::HOST_INT32, Layout::Elementwise),
        )
        .register_kernel(
            EXPAND_GRAD,
            Place::HOST_FLOAT,
            "expand_grad_host_f32",
            ExpandGradKernel::<f32>::factory("expand_grad_host_f32", Place::HOST_FLOAT, Layout::Elementwise),
        )
        .register_kernel(
            EXPAND_GRAD,
            Place::X86_FLOAT,
            "expand_grad_x86_f32",
            ExpandGradKernel::<f32>::factory("expand_grad_x86_f32", Place::X86_FLOAT, Layout::Rows),
        )
}

/// Validate `expandTimes` against the input shape and return the expanded shape,
/// `out_dims[d] = x_dims[d] * expandTimes[d]`.
///
/// The input rank must be in `[1, MAX_RANK]` with one multiplier per dimension,
/// every multiplier at least 1, every input dimension non-negative, and the
/// expanded shape must fit in `i64` elements.
pub fn resolve_expand_shape(op_type: &str, x_dims: &DDim, expand_times: &[i32]) -> Result<DDim> {
    let rank = x_dims.rank();
    ensure!(
        (1..=MAX_RANK).contains(&rank),
        RankOutOfRangeSnafu { op_type, slot: "X", rank, min: 1usize, max: MAX_RANK }
    );
    ensure!(
        expand_times.len() == rank,
        AttrLengthMismatchSnafu { op_type, attr: EXPAND_TIMES, len: expand_times.len(), expected: rank }
    );
    for (index, &times) in expand_times.iter().enumerate() {
        ensure!(
            times >= 1,
            AttrValueOutOfRangeSnafu { op_type, attr: EXPAND_TIMES, index, value: times as i64, min: 1i64 }
        );
    }
    for (dim, &size) in x_dims.dims().iter().enumerate() {
        ensure!(size >= 0, NegativeDimSnafu { op_type, slot: "X", dim, size });
    }

    let overflow = || ShapeOverflowSnafu { op_type, slot: "X", dims: x_dims.to_vec(), times: expand_times.to_vec() };
    let out_dims = x_dims
        .dims()
        .iter()
        .zip(expand_times)
        .map(|(&size, &times)| size.checked_mul(times as i64))
        .collect::<Option<Vec<_>>>()
        .map(DDim::from)
        .context(overflow())?;
    ensure!(out_dims.checked_product().is_some(), overflow());
    Ok(out_dims)
}

/// Require the slots every expand-family descriptor must bind, and read `expandTimes`.
fn bind_expand_desc(desc: &OpDesc, inputs: &[&str], outputs: &[&str]) -> Result<Vec<i32>> {
    for slot in inputs {
        ensure!(desc.has_input(slot), MissingInputSnafu { op_type: desc.op_type(), slot: *slot });
    }
    for slot in outputs {
        ensure!(desc.has_output(slot), MissingOutputSnafu { op_type: desc.op_type(), slot: *slot });
    }
    desc.get_attr::<Vec<i32>>(EXPAND_TIMES)
}

/// Forward operator: inputs `X`, output `Out`, attribute `expandTimes`.
#[derive(Debug)]
pub struct ExpandOp {
    base: OpBase,
    expand_times: Vec<i32>,
}

impl Default for ExpandOp {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpandOp {
    pub fn new() -> Self {
        Self { base: OpBase::new(EXPAND), expand_times: Vec::new() }
    }

    pub fn expand_times(&self) -> &[i32] {
        &self.expand_times
    }
}

impl OpLite for ExpandOp {
    fn build(&mut self, desc: &OpDesc, scope: &Scope) -> Result<()> {
        let expand_times = bind_expand_desc(desc, &["X"], &["Out"])?;
        self.base.attach(desc, scope)?;
        self.expand_times = expand_times;
        Ok(())
    }

    fn debug_string(&self) -> String {
        format!("{EXPAND}(expandTimes={:?})", self.expand_times)
    }

    fn static_pick_kernel(&self, _valid_places: &[Place]) -> Place {
        Place::HOST_FLOAT
    }

    fn base(&self) -> &OpBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut OpBase {
        &mut self.base
    }

    fn check_shape(&self) -> Result<()> {
        let x_dims = self.base.args()?.input("X")?.read().dims().clone();
        resolve_expand_shape(EXPAND, &x_dims, &self.expand_times).map(|_| ())
    }

    fn infer_shape(&self) -> Result<()> {
        let args = self.base.args()?;
        let (x_dims, x_lod) = {
            let x = args.input("X")?;
            let x = x.read();
            (x.dims().clone(), x.lod().clone())
        };
        let out_dims = resolve_expand_shape(EXPAND, &x_dims, &self.expand_times)?;
        tracing::trace!(x = %x_dims, out = %out_dims, "expand infer_shape");

        let out = args.output("Out")?;
        let mut out = out.write();
        out.resize(out_dims);
        out.set_lod(x_lod);
        Ok(())
    }
}
