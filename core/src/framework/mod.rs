//! Collaborators the operator layer consumes: shapes, tensors, scopes and descriptors.

pub mod attribute;
pub mod ddim;
pub mod op_desc;
pub mod scope;
pub mod tensor;

pub use attribute::{AttrValue, Attribute};
pub use ddim::{DDim, Dims, LoD};
pub use op_desc::{GRAD_VAR_SUFFIX, OpArgs, OpDesc, grad_var_name};
pub use scope::Scope;
pub use tensor::{Element, Tensor, TensorData, TensorHandle};
