//! Text parsing for places.
//!
//! Examples:
//! - "X86/Float" -> Place { X86, Float }
//! - "cuda/fp16" -> Place { CUDA, FP16 }
//! - "arm" -> Place { ARM, Float } (precision defaults to Float)

use std::str::FromStr;

use crate::error::{Error, MalformedPlaceSnafu, UnknownPrecisionSnafu, UnknownTargetSnafu};
use crate::{Place, PrecisionType, TargetType};

impl FromStr for TargetType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "HOST" => Ok(Self::Host),
            "X86" => Ok(Self::X86),
            "CUDA" | "GPU" => Ok(Self::CUDA),
            "ARM" => Ok(Self::ARM),
            "OPENCL" => Ok(Self::OpenCL),
            "ANY" => Ok(Self::Any),
            "UNKNOWN" => Ok(Self::Unknown),
            _ => UnknownTargetSnafu { target: s }.fail(),
        }
    }
}

impl FromStr for PrecisionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "FLOAT" | "FP32" | "F32" => Ok(Self::Float),
            "INT8" | "I8" => Ok(Self::Int8),
            "INT32" | "I32" => Ok(Self::Int32),
            "INT64" | "I64" => Ok(Self::Int64),
            "FP16" | "HALF" => Ok(Self::FP16),
            "BOOL" => Ok(Self::Bool),
            "ANY" => Ok(Self::Any),
            "UNKNOWN" => Ok(Self::Unknown),
            _ => UnknownPrecisionSnafu { precision: s }.fail(),
        }
    }
}

impl FromStr for Place {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('/').collect();

        match parts.as_slice() {
            [target] if !target.trim().is_empty() => Ok(Place::new(target.parse()?, PrecisionType::Float)),
            [target, precision] => Ok(Place::new(target.parse()?, precision.parse()?)),
            _ => MalformedPlaceSnafu { place: s }.fail(),
        }
    }
}
