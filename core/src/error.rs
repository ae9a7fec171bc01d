//! Error types for operator building, kernel selection and execution.

use lite_place::{Place, PrecisionType};
use snafu::Snafu;

use crate::op_lite::OpState;

/// Result type for lite-core operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised by the operator layer.
///
/// Precondition violations (missing inputs, malformed attributes, shape
/// mismatches) and configuration errors are separate variants so that graph
/// builders can abort on them without the process terminating.
#[derive(Debug, Clone, PartialEq, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    // =========================================================================
    // Descriptor / scope binding
    // =========================================================================
    /// Required input slot is absent from the descriptor.
    #[snafu(display("{op_type}: input '{slot}' must be set"))]
    MissingInput { op_type: String, slot: String },

    /// Required output slot is absent from the descriptor.
    #[snafu(display("{op_type}: output '{slot}' must be set"))]
    MissingOutput { op_type: String, slot: String },

    /// Descriptor names a variable the scope does not hold.
    #[snafu(display("variable '{name}' not found in scope"))]
    VarNotFound { name: String },

    #[snafu(display("attribute '{name}' not found"))]
    AttrNotFound { name: String },

    /// Attribute exists but holds a different kind of value.
    #[snafu(display("attribute '{name}' has kind {actual}, expected {expected}"))]
    AttrKindMismatch { name: String, expected: &'static str, actual: &'static str },

    // =========================================================================
    // Shape contract
    // =========================================================================
    #[snafu(display("{op_type}: rank of '{slot}' is {rank}, must be in [{min}, {max}]"))]
    RankOutOfRange { op_type: String, slot: String, rank: usize, min: usize, max: usize },

    /// A list attribute's length does not agree with a tensor rank.
    #[snafu(display("{op_type}: attribute '{attr}' has {len} values, expected {expected}"))]
    AttrLengthMismatch { op_type: String, attr: String, len: usize, expected: usize },

    #[snafu(display("{op_type}: attribute '{attr}'[{index}] = {value}, must be at least {min}"))]
    AttrValueOutOfRange { op_type: String, attr: String, index: usize, value: i64, min: i64 },

    /// Dimension disagrees with the value derived from the forward relation.
    #[snafu(display("{op_type}: dimension {dim} of '{slot}' is {actual}, expected {expected}"))]
    DimMismatch { op_type: String, slot: String, dim: usize, expected: i64, actual: i64 },

    #[snafu(display("{op_type}: dimension {dim} of '{slot}' is {size}, must be non-negative"))]
    NegativeDim { op_type: String, slot: String, dim: usize, size: i64 },

    /// A derived shape does not fit in `i64` elements.
    #[snafu(display("{op_type}: expanding '{slot}' of {dims:?} by {times:?} overflows"))]
    ShapeOverflow { op_type: String, slot: String, dims: Vec<i64>, times: Vec<i32> },

    #[snafu(display("tensor holds {actual:?} data, kernel expects {expected:?}"))]
    PrecisionMismatch { expected: PrecisionType, actual: PrecisionType },

    // =========================================================================
    // Lifecycle
    // =========================================================================
    #[snafu(display("{op_type}: build called in state {state:?}"))]
    AlreadyBuilt { op_type: String, state: OpState },

    #[snafu(display("{op_type}: operator used before build"))]
    NotBuilt { op_type: String },

    /// `run` invoked before any kernel was picked.
    #[snafu(display("{op_type}: no kernel picked"))]
    KernelNotPicked { op_type: String },

    // =========================================================================
    // Registry / picker
    // =========================================================================
    #[snafu(display("operator '{op_type}' is not registered"))]
    OpNotRegistered { op_type: String },

    #[snafu(display("no kernel registered for '{op_type}' on any of {places:?}"))]
    KernelNotFound { op_type: String, places: Vec<Place> },

    #[snafu(display("operator '{op_type}' registered twice"))]
    DuplicateOp { op_type: String },

    #[snafu(display("kernel for '{op_type}' on {place} registered twice"))]
    DuplicateKernel { op_type: String, place: Place },

    /// The process-wide registry was already installed.
    #[snafu(display("global registry already initialized"))]
    RegistryInitialized,

    #[snafu(display("global registry used before init"))]
    RegistryUninitialized,

    // =========================================================================
    // Execution
    // =========================================================================
    #[snafu(display("timed out after {timeout_ms}ms waiting for signal value {value} (current {current})"))]
    EventTimeout { value: u64, current: u64, timeout_ms: u64 },

    /// Kernel could not execute on its bound inputs.
    #[snafu(display("kernel '{kernel}' failed: {reason}"))]
    Kernel { kernel: String, reason: String },

    #[snafu(display("invalid configuration: {reason}"))]
    Config { reason: String },

    #[snafu(display("place error"))]
    Place { source: lite_place::Error },
}
