//! Execution places for lite kernels.
//!
//! A [`Place`] pairs a hardware [`TargetType`] with a numeric [`PrecisionType`].
//! Kernels are registered per place and operators bind to exactly one place
//! once a kernel has been picked.

pub mod error;
pub mod ext;
pub mod parse;


pub use error::{Error, Result};

/// Hardware target a kernel executes on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[derive(strum::EnumCount, strum::EnumIter, strum::VariantArray)]
#[cfg_attr(feature = "proptest", derive(proptest_derive::Arbitrary))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TargetType {
    Unknown,
    /// Plain host code with no ISA-specific paths.
    #[default]
    Host,
    X86,
    CUDA,
    ARM,
    OpenCL,
    /// Wildcard used by kernels that run anywhere.
    Any,
}

/// Numeric precision of a kernel's inputs and outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[derive(strum::EnumCount, strum::EnumIter, strum::VariantArray)]
#[cfg_attr(feature = "proptest", derive(proptest_derive::Arbitrary))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PrecisionType {
    Unknown,
    #[default]
    Float,
    Int8,
    Int32,
    Int64,
    FP16,
    Bool,
    Any,
}

impl TargetType {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Host => "Host",
            Self::X86 => "X86",
            Self::CUDA => "CUDA",
            Self::ARM => "ARM",
            Self::OpenCL => "OpenCL",
            Self::Any => "Any",
        }
    }
}

impl PrecisionType {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Float => "Float",
            Self::Int8 => "Int8",
            Self::Int32 => "Int32",
            Self::Int64 => "Int64",
            Self::FP16 => "FP16",
            Self::Bool => "Bool",
            Self::Any => "Any",
        }
    }
}

impl std::fmt::Display for TargetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::fmt::Display for PrecisionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Where and how a kernel executes.
///
/// Ordering is lexicographic over `(target, precision)`, which keeps places
/// usable as `BTreeMap` keys in the kernel registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "proptest", derive(proptest_derive::Arbitrary))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Place {
    pub target: TargetType,
    pub precision: PrecisionType,
}

impl Place {
    pub const fn new(target: TargetType, precision: PrecisionType) -> Self {
        Self { target, precision }
    }

    /// Whether this place can serve a request for `other`, treating `Any` as a wildcard
    /// on either side.
    pub fn matches(&self, other: &Place) -> bool {
        let target = self.target == other.target || self.target == TargetType::Any || other.target == TargetType::Any;
        let precision = self.precision == other.precision
            || self.precision == PrecisionType::Any
            || other.precision == PrecisionType::Any;
        target && precision
    }

    /// Canonical `"<target>/<precision>"` form, accepted back by [`str::parse`].
    pub fn canonicalize(&self) -> String {
        format!("{}/{}", self.target, self.precision)
    }
}

impl std::fmt::Display for Place {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.target, self.precision)
    }
}

// Common places
impl Place {
    pub const HOST_FLOAT: Self = Self::new(TargetType::Host, PrecisionType::Float);
    pub const HOST_INT32: Self = Self::new(TargetType::Host, PrecisionType::Int32);
    pub const X86_FLOAT: Self = Self::new(TargetType::X86, PrecisionType::Float);
    pub const CUDA_FLOAT: Self = Self::new(TargetType::CUDA, PrecisionType::Float);
    pub const ARM_FLOAT: Self = Self::new(TargetType::ARM, PrecisionType::Float);
}
