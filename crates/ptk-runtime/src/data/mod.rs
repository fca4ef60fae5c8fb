//! In-process tensor model shared by every other module.
mod buffer;
mod frame;
mod tensor;

pub use buffer::{BufferView, BufferViewMut};
pub use frame::Frame;
pub use tensor::{Tensor, TensorShape, TensorStorage, TensorView, TensorViewMut};
