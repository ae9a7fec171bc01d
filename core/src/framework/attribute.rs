//! Operator attributes.

use crate::error::{AttrKindMismatchSnafu, Result};

/// Attribute value attached to an operator descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum Attribute {
    Int(i32),
    Float(f32),
    String(String),
    Bool(bool),
    Long(i64),
    Ints(Vec<i32>),
    Floats(Vec<f32>),
    Strings(Vec<String>),
    Longs(Vec<i64>),
}

impl Attribute {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Bool(_) => "bool",
            Self::Long(_) => "long",
            Self::Ints(_) => "ints",
            Self::Floats(_) => "floats",
            Self::Strings(_) => "strings",
            Self::Longs(_) => "longs",
        }
    }
}

/// Rust types an [`Attribute`] can be read back as.
pub trait AttrValue: Sized {
    const KIND: &'static str;

    fn from_attr(attr: &Attribute) -> Option<Self>;

    fn extract(name: &str, attr: &Attribute) -> Result<Self> {
        Self::from_attr(attr).ok_or_else(|| AttrKindMismatchSnafu { name, expected: Self::KIND, actual: attr.kind() }.build())
    }
}

macro_rules! impl_attr_value {
    ($($ty:ty => $variant:ident, $kind:literal);* $(;)?) => {
        $(
            impl AttrValue for $ty {
                const KIND: &'static str = $kind;

                fn from_attr(attr: &Attribute) -> Option<Self> {
                    match attr {
                        Attribute::$variant(v) => Some(v.clone()),
                        _ => None,
                    }
                }
            }

            impl From<$ty> for Attribute {
                fn from(value: $ty) -> Self {
                    Attribute::$variant(value)
                }
            }
        )*
    };
}

impl_attr_value! {
    i32 => Int, "int";
    f32 => Float, "float";
    String => String, "string";
    bool => Bool, "bool";
    i64 => Long, "long";
    Vec<i32> => Ints, "ints";
    Vec<f32> => Floats, "floats";
    Vec<String> => Strings, "strings";
    Vec<i64> => Longs, "longs";
}

impl From<&str> for Attribute {
    fn from(value: &str) -> Self {
        Attribute::String(value.to_string())
    }
}
