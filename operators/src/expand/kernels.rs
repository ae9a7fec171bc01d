//! Host kernels for expand and its gradient.
//!
//! Both directions walk the same mapping from an output element to the input
//! element it tiles. [`Layout::Rows`] walks it one innermost row at a time and
//! moves whole slices, which is what the X86 registrations use.

use std::marker::PhantomData;
use std::ops::AddAssign;
use std::sync::Arc;

use lite_core::error::{KernelSnafu, Result};
use lite_core::framework::{Element, grad_var_name};
use lite_core::{DDim, KernelBase, KernelFactory, OpArgs, TensorHandle};
use lite_place::Place;
use smallvec::SmallVec;
use snafu::ensure;

use super::{EXPAND, EXPAND_GRAD, EXPAND_TIMES, resolve_expand_shape};

/// How a kernel walks the tiled output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// One element at a time.
    Elementwise,
    /// Whole innermost rows at a time.
    Rows,
}

type Extents = SmallVec<[usize; 6]>;

fn extents(dims: &DDim) -> Extents {
    dims.dims().iter().map(|&dim| dim as usize).collect()
}

/// Call `f(out_index, src_index)` for every element of an output of shape
/// `out_dims` tiled from a source of shape `x_dims`, both row-major.
fn for_each_source(x_dims: &[usize], out_dims: &[usize], mut f: impl FnMut(usize, usize)) {
    let numel: usize = out_dims.iter().product();
    for out_index in 0..numel {
        let mut rem = out_index;
        let mut src_index = 0;
        let mut stride = 1;
        for d in (0..out_dims.len()).rev() {
            let coord = rem % out_dims[d];
            rem /= out_dims[d];
            src_index += (coord % x_dims[d]) * stride;
            stride *= x_dims[d];
        }
        f(out_index, src_index);
    }
}

/// Like [`for_each_source`] over the outer dimensions only, yielding row indices.
/// Each output row holds `out_dims[last] / x_dims[last]` copies of its source row.
fn for_each_source_row(x_dims: &[usize], out_dims: &[usize], f: impl FnMut(usize, usize)) {
    let outer = out_dims.len() - 1;
    for_each_source(&x_dims[..outer], &out_dims[..outer], f);
}

fn tile<T: Copy>(layout: Layout, x: &[T], x_dims: &[usize], out: &mut [T], out_dims: &[usize]) {
    match layout {
        Layout::Elementwise => for_each_source(x_dims, out_dims, |o, s| out[o] = x[s]),
        Layout::Rows => {
            let (inner, out_inner) = (x_dims[x_dims.len() - 1], out_dims[out_dims.len() - 1]);
            if inner == 0 {
                return;
            }
            for_each_source_row(x_dims, out_dims, |o, s| {
                let src = &x[s * inner..(s + 1) * inner];
                for chunk in out[o * out_inner..(o + 1) * out_inner].chunks_exact_mut(inner) {
                    chunk.copy_from_slice(src);
                }
            });
        }
    }
}

fn fold<T: Copy + AddAssign>(layout: Layout, dout: &[T], x_dims: &[usize], dx: &mut [T], out_dims: &[usize]) {
    match layout {
        Layout::Elementwise => for_each_source(x_dims, out_dims, |o, s| dx[s] += dout[o]),
        Layout::Rows => {
            let (inner, out_inner) = (x_dims[x_dims.len() - 1], out_dims[out_dims.len() - 1]);
            if inner == 0 {
                return;
            }
            for_each_source_row(x_dims, out_dims, |o, s| {
                let dst = &mut dx[s * inner..(s + 1) * inner];
                for chunk in dout[o * out_inner..(o + 1) * out_inner].chunks_exact(inner) {
                    for (acc, &grad) in dst.iter_mut().zip(chunk) {
                        *acc += grad;
                    }
                }
            });
        }
    }
}

/// Forward tile kernel: `Out = tile(X, expandTimes)`.
pub struct ExpandKernel<T> {
    name: &'static str,
    place: Place,
    layout: Layout,
    x: TensorHandle,
    out: TensorHandle,
    expand_times: Vec<i32>,
    _element: PhantomData<fn() -> T>,
}

impl<T: Element> ExpandKernel<T> {
    pub fn create(name: &'static str, place: Place, layout: Layout, args: &OpArgs) -> Result<Box<dyn KernelBase>> {
        let x = args.input("X")?;
        let out = args.output("Out")?;
        ensure!(!Arc::ptr_eq(&x, &out), KernelSnafu { kernel: name, reason: "X and Out must not alias" });

        Ok(Box::new(Self {
            name,
            place,
            layout,
            x,
            out,
            expand_times: args.attr(EXPAND_TIMES)?,
            _element: PhantomData,
        }))
    }

    pub fn factory(name: &'static str, place: Place, layout: Layout) -> KernelFactory {
        Arc::new(move |args: &OpArgs| Self::create(name, place, layout, args))
    }
}

impl<T: Element> KernelBase for ExpandKernel<T> {
    fn run(&mut self) -> Result<()> {
        let x = self.x.read();
        let out_dims = resolve_expand_shape(EXPAND, x.dims(), &self.expand_times)?;
        // Reject the input before touching the output.
        let x_values = x.as_slice::<T>()?;

        let mut out = self.out.write();
        out.resize_as::<T>(out_dims.clone());
        out.share_lod_from(&x);

        tile(self.layout, x_values, &extents(x.dims()), out.as_mut_slice::<T>()?, &extents(&out_dims));
        Ok(())
    }

    fn place(&self) -> Place {
        self.place
    }

    fn name(&self) -> &str {
        self.name
    }
}

/// Backward kernel: `X@GRAD[i] = sum of Out@GRAD over every tile of element i`.
///
/// Without an `X@GRAD` output there is nothing to compute and `run` does nothing.
pub struct ExpandGradKernel<T> {
    name: &'static str,
    place: Place,
    layout: Layout,
    x: TensorHandle,
    out_grad: TensorHandle,
    x_grad: Option<TensorHandle>,
    expand_times: Vec<i32>,
    _element: PhantomData<fn() -> T>,
}

impl<T: Element + AddAssign> ExpandGradKernel<T> {
    pub fn create(name: &'static str, place: Place, layout: Layout, args: &OpArgs) -> Result<Box<dyn KernelBase>> {
        let x = args.input("X")?;
        let out_grad = args.input(&grad_var_name("Out"))?;
        let x_grad = args.outputs(&grad_var_name("X")).first().cloned();
        if let Some(x_grad) = &x_grad {
            ensure!(
                !Arc::ptr_eq(x_grad, &out_grad) && !Arc::ptr_eq(x_grad, &x),
                KernelSnafu { kernel: name, reason: "X@GRAD must not alias an input" }
            );
        }

        Ok(Box::new(Self {
            name,
            place,
            layout,
            x,
            out_grad,
            x_grad,
            expand_times: args.attr(EXPAND_TIMES)?,
            _element: PhantomData,
        }))
    }

    pub fn factory(name: &'static str, place: Place, layout: Layout) -> KernelFactory {
        Arc::new(move |args: &OpArgs| Self::create(name, place, layout, args))
    }
}

impl<T: Element + AddAssign> KernelBase for ExpandGradKernel<T> {
    fn run(&mut self) -> Result<()> {
        let Some(x_grad) = &self.x_grad else {
            return Ok(());
        };

        let x_dims = self.x.read().dims().clone();
        let out_dims = resolve_expand_shape(EXPAND_GRAD, &x_dims, &self.expand_times)?;

        let dout = self.out_grad.read();
        ensure!(
            dout.dims() == &out_dims,
            KernelSnafu { kernel: self.name, reason: format!("Out@GRAD has dims {}, expected {out_dims}", dout.dims()) }
        );
        let dout_values = dout.as_slice::<T>()?;

        let mut dx = x_grad.write();
        dx.resize_as::<T>(x_dims.clone());
        let dx_values = dx.as_mut_slice::<T>()?;
        dx_values.fill(T::default());

        fold(self.layout, dout_values, &extents(&x_dims), dx_values, &extents(&out_dims));
        Ok(())
    }

    fn place(&self) -> Place {
        self.place
    }

    fn name(&self) -> &str {
        self.name
    }
}
