//! Operator and kernel dispatch core for light-weight inference.
//!
//! An [`OpLite`] binds one graph node to its variables, validates and infers
//! shapes, and owns exactly one [`KernelBase`] chosen by the [`KernelPicker`]
//! from the kernels registered for its type in the [`Registry`].
//!
//! # Lifecycle
//!
//! ```ignore
//! let picker = KernelPicker::new(registry).with_config(PickerConfig::from_env());
//! let mut op = picker.instantiate(&desc, &scope, &[Place::HOST_FLOAT], picker.default_strategy())?;
//! op.run()?;
//! ```
//!
//! # Events
//!
//! Operators synchronize on [`TimelineSignal`]s through their [`OpContext`];
//! host operators without events run without waiting.

pub mod config;
pub mod context;
pub mod error;
pub mod event;
pub mod framework;
pub mod kernel;
pub mod op_lite;
pub mod picker;
pub mod registry;


pub use config::{KernelStrategy, PickerConfig, ProfileConfig};
pub use context::{EventPoint, OpContext};
pub use error::{Error, Result};
pub use event::{CpuTimelineSignal, TimelineSignal};
pub use framework::{AttrValue, Attribute, DDim, OpArgs, OpDesc, Scope, Tensor, TensorHandle};
pub use kernel::{KernelBase, KernelFactory};
pub use op_lite::{OpBase, OpLite, OpState};
pub use picker::{CostModel, KernelPicker, WallClock};
pub use registry::{OpFactory, Registry, RegistryBuilder};
