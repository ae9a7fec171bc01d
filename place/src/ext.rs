use super::*;

/// Rust element types with a fixed kernel precision.
pub trait HasPrecision: Copy + Default + Send + Sync + 'static {
    const PRECISION: PrecisionType;
}

macro_rules! impl_precision_ext {
    ($($ty:ty => $precision:expr),* $(,)?) => {
        $(impl HasPrecision for $ty { const PRECISION: PrecisionType = $precision; })*
    };
}

impl_precision_ext! {
    bool => PrecisionType::Bool,
    i8 => PrecisionType::Int8, i32 => PrecisionType::Int32, i64 => PrecisionType::Int64,
    f32 => PrecisionType::Float,
}
