//! Host tensors bound to scope variables.

use std::sync::Arc;

use lite_place::PrecisionType;
use lite_place::ext::HasPrecision;
use parking_lot::RwLock;

use super::ddim::{DDim, LoD};
use crate::error::{PrecisionMismatchSnafu, Result};

/// Typed element storage.
#[derive(Debug, Clone, PartialEq)]
pub enum TensorData {
    Float(Vec<f32>),
    Int8(Vec<i8>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
}

impl TensorData {
    pub fn precision(&self) -> PrecisionType {
        match self {
            Self::Float(_) => PrecisionType::Float,
            Self::Int8(_) => PrecisionType::Int8,
            Self::Int32(_) => PrecisionType::Int32,
            Self::Int64(_) => PrecisionType::Int64,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Float(v) => v.len(),
            Self::Int8(v) => v.len(),
            Self::Int32(v) => v.len(),
            Self::Int64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn resize(&mut self, len: usize) {
        match self {
            Self::Float(v) => v.resize(len, 0.0),
            Self::Int8(v) => v.resize(len, 0),
            Self::Int32(v) => v.resize(len, 0),
            Self::Int64(v) => v.resize(len, 0),
        }
    }
}

impl Default for TensorData {
    fn default() -> Self {
        Self::Float(Vec::new())
    }
}

/// Element types that have a [`TensorData`] variant.
pub trait Element: HasPrecision {
    fn slice(data: &TensorData) -> Option<&[Self]>;
    fn slice_mut(data: &mut TensorData) -> Option<&mut Vec<Self>>;
    fn wrap(values: Vec<Self>) -> TensorData;
}

macro_rules! impl_element {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(impl Element for $ty {
            fn slice(data: &TensorData) -> Option<&[Self]> {
                match data {
                    TensorData::$variant(v) => Some(v.as_slice()),
                    _ => None,
                }
            }

            fn slice_mut(data: &mut TensorData) -> Option<&mut Vec<Self>> {
                match data {
                    TensorData::$variant(v) => Some(v),
                    _ => None,
                }
            }

            fn wrap(values: Vec<Self>) -> TensorData {
                TensorData::$variant(values)
            }
        })*
    };
}

impl_element! { f32 => Float, i8 => Int8, i32 => Int32, i64 => Int64 }

/// Dense host tensor with sequence metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tensor {
    dims: DDim,
    lod: LoD,
    data: TensorData,
}

/// Shared handle to a tensor owned by a scope variable.
pub type TensorHandle = Arc<RwLock<Tensor>>;

impl Tensor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vec<T: Element>(dims: impl Into<DDim>, values: Vec<T>) -> Self {
        let dims = dims.into();
        let mut data = T::wrap(values);
        data.resize(dims.numel());
        Self { dims, lod: LoD::new(), data }
    }

    pub fn dims(&self) -> &DDim {
        &self.dims
    }

    pub fn lod(&self) -> &LoD {
        &self.lod
    }

    pub fn set_lod(&mut self, lod: LoD) {
        self.lod = lod;
    }

    pub fn precision(&self) -> PrecisionType {
        self.data.precision()
    }

    pub fn data(&self) -> &TensorData {
        &self.data
    }

    /// Set the dimensions and size the storage to match, keeping the element type.
    ///
    /// Calling it again with the same dims leaves the tensor unchanged.
    pub fn resize(&mut self, dims: impl Into<DDim>) {
        self.dims = dims.into();
        self.data.resize(self.dims.numel());
    }

    /// Like [`Tensor::resize`] but switches storage to `T`, dropping old values on a
    /// precision change.
    pub fn resize_as<T: Element>(&mut self, dims: impl Into<DDim>) {
        if self.data.precision() != T::PRECISION {
            self.data = T::wrap(Vec::new());
        }
        self.resize(dims);
    }

    pub fn share_lod_from(&mut self, other: &Tensor) {
        self.lod = other.lod.clone();
    }

    pub fn as_slice<T: Element>(&self) -> Result<&[T]> {
        let actual = self.data.precision();
        T::slice(&self.data).ok_or_else(|| PrecisionMismatchSnafu { expected: T::PRECISION, actual }.build())
    }

    pub fn as_mut_slice<T: Element>(&mut self) -> Result<&mut [T]> {
        let actual = self.data.precision();
        T::slice_mut(&mut self.data)
            .map(|v| v.as_mut_slice())
            .ok_or_else(|| PrecisionMismatchSnafu { expected: T::PRECISION, actual }.build())
    }

    pub fn into_handle(self) -> TensorHandle {
        Arc::new(RwLock::new(self))
    }
}
