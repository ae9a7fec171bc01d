//! Gradient of [`ExpandOp`](super::ExpandOp).

use lite_core::error::{DimMismatchSnafu, RankOutOfRangeSnafu};
use lite_core::framework::grad_var_name;
use lite_core::{OpBase, OpDesc, OpLite, Result, Scope};
use lite_place::Place;
use snafu::ensure;

use super::{EXPAND_GRAD, bind_expand_desc, resolve_expand_shape};

/// Backward operator: inputs `X` and `Out@GRAD`, optional output `X@GRAD`,
/// attribute `expandTimes`.
///
/// The incoming gradient must have exactly the shape the forward operator would
/// produce from `X`; anything else is rejected rather than reshaped.
#[derive(Debug)]
pub struct ExpandGradOp {
    base: OpBase,
    expand_times: Vec<i32>,
    out_grad: String,
    x_grad: String,
}

impl Default for ExpandGradOp {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpandGradOp {
    pub fn new() -> Self {
        Self {
            base: OpBase::new(EXPAND_GRAD),
            expand_times: Vec::new(),
            out_grad: grad_var_name("Out"),
            x_grad: grad_var_name("X"),
        }
    }

    pub fn expand_times(&self) -> &[i32] {
        &self.expand_times
    }
}

impl OpLite for ExpandGradOp {
    fn build(&mut self, desc: &OpDesc, scope: &Scope) -> Result<()> {
        let expand_times = bind_expand_desc(desc, &["X", self.out_grad.as_str()], &[])?;
        self.base.attach(desc, scope)?;
        self.expand_times = expand_times;
        Ok(())
    }

    fn debug_string(&self) -> String {
        format!("{EXPAND_GRAD}(expandTimes={:?})", self.expand_times)
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
        let args = self.base.args()?;
        let x_dims = args.input("X")?.read().dims().clone();
        let out_dims = args.input(&self.out_grad)?.read().dims().clone();

        let expected_dims = resolve_expand_shape(EXPAND_GRAD, &x_dims, &self.expand_times)?;
        ensure!(
            out_dims.rank() == x_dims.rank(),
            RankOutOfRangeSnafu {
                op_type: EXPAND_GRAD,
                slot: &self.out_grad,
                rank: out_dims.rank(),
                min: x_dims.rank(),
                max: x_dims.rank(),
            }
        );

        for (dim, &expected) in expected_dims.dims().iter().enumerate() {
            ensure!(
                out_dims[dim] == expected,
                DimMismatchSnafu { op_type: EXPAND_GRAD, slot: &self.out_grad, dim, expected, actual: out_dims[dim] }
            );
        }
        Ok(())
    }

    fn infer_shape(&self) -> Result<()> {
        self.check_shape()?;

        let args = self.base.args()?;
        if let Some(x_grad) = args.outputs(&self.x_grad).first() {
            let x_dims = args.input("X")?.read().dims().clone();
            x_grad.write().resize(x_dims);
        }
        Ok(())
    }
}
