use super::buffer::{BufferView, BufferViewMut};
use crate::error::{Result, RuntimeError};
use crate::types::{DataType, DeviceType, Element};
use derive_more::From;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered tensor dimensions. An empty shape means "unset", not a scalar.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, From, Serialize, Deserialize)]
pub struct TensorShape(Vec<i64>);

impl TensorShape {
    pub fn new(dims: impl Into<Vec<i64>>) -> Self {
        Self(dims.into())
    }

    pub fn dims(&self) -> &[i64] {
        &self.0
    }

    pub fn dims_mut(&mut self) -> &mut Vec<i64> {
        &mut self.0
    }

    pub fn rank(&self) -> usize {
        self.0.len()
    }

    /// Dimension at `index`. Callers check [`TensorShape::rank`] first.
    pub fn dim(&self, index: usize) -> i64 {
        self.0[index]
    }

    fn checked_product(&self) -> Option<i64> {
        self.0.iter().try_fold(1i64, |acc, d| acc.checked_mul(*d))
    }

    /// Product of all dimensions. 0 for an unset shape and for one whose
    /// product does not fit in an `i64`.
    pub fn num_elements(&self) -> i64 {
        if self.0.is_empty() {
            return 0;
        }
        self.checked_product().unwrap_or(0)
    }

    /// [`TensorShape::num_elements`] as a `usize`, or `None` when a dimension is negative
    /// (e.g. a `-1` wildcard in an `InputSpec`) or the product overflows.
    pub fn element_count(&self) -> Option<usize> {
        if self.0.iter().any(|d| *d < 0) {
            return None;
        }
        if self.0.is_empty() {
            return Some(0);
        }
        usize::try_from(self.checked_product()?).ok()
    }
}

impl From<&[i64]> for TensorShape {
    fn from(dims: &[i64]) -> Self {
        Self(dims.to_vec())
    }
}

impl<const N: usize> From<[i64; N]> for TensorShape {
    fn from(dims: [i64; N]) -> Self {
        Self(dims.to_vec())
    }
}

impl fmt::Display for TensorShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

/// A borrowed tensor: raw bytes plus dtype and shape metadata.
#[derive(Clone, Debug, Default)]
pub struct TensorView<'a> {
    buffer: BufferView<'a>,
    dtype: DataType,
    shape: TensorShape,
}

impl<'a> TensorView<'a> {
    pub fn new(buffer: BufferView<'a>, dtype: DataType, shape: impl Into<TensorShape>) -> Self {
        Self {
            buffer,
            dtype,
            shape: shape.into(),
        }
    }

    pub fn from_slice<T: Element>(data: &'a [T], shape: impl Into<TensorShape>) -> Self {
        Self::new(BufferView::from_slice(data, DeviceType::Cpu), T::DTYPE, shape)
    }

    pub fn buffer(&self) -> &BufferView<'a> {
        &self.buffer
    }

    pub fn dtype(&self) -> DataType {
        self.dtype
    }

    pub fn shape(&self) -> &TensorShape {
        &self.shape
    }

    pub fn device_type(&self) -> DeviceType {
        self.buffer.device_type()
    }

    pub fn num_elements(&self) -> i64 {
        self.shape.num_elements()
    }

    pub fn element_size(&self) -> usize {
        self.dtype.element_size()
    }

    pub fn bytes(&self) -> usize {
        self.shape
            .element_count()
            .and_then(|n| n.checked_mul(self.element_size()))
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty() || self.dtype == DataType::Unknown
    }

    /// Same bytes, different shape. The element count must not change.
    pub fn reshaped(&self, shape: impl Into<TensorShape>) -> Result<TensorView<'a>> {
        let shape = shape.into();
        if shape.num_elements() != self.num_elements() {
            return Err(RuntimeError::invalid_argument(format!(
                "Cannot reshape {} into {shape}",
                self.shape
            )));
        }
        Ok(TensorView::new(self.buffer, self.dtype, shape))
    }

    /// Typed access to exactly `num_elements()` values.
    pub fn as_slice<T: Element>(&self) -> Result<&'a [T]> {
        typed_prefix(self.buffer.cast::<T>(), self.dtype, &self.shape)
    }
}

/// A mutably borrowed tensor, the destination side of operators.
#[derive(Debug)]
pub struct TensorViewMut<'a> {
    buffer: BufferViewMut<'a>,
    dtype: DataType,
    shape: TensorShape,
}

impl<'a> TensorViewMut<'a> {
    pub fn new(buffer: BufferViewMut<'a>, dtype: DataType, shape: impl Into<TensorShape>) -> Self {
        Self {
            buffer,
            dtype,
            shape: shape.into(),
        }
    }

    pub fn from_slice<T: Element>(data: &'a mut [T], shape: impl Into<TensorShape>) -> Self {
        Self::new(
            BufferViewMut::from_slice(data, DeviceType::Cpu),
            T::DTYPE,
            shape,
        )
    }

    pub fn as_view(&self) -> TensorView<'_> {
        TensorView::new(self.buffer.as_view(), self.dtype, self.shape.clone())
    }

    pub fn dtype(&self) -> DataType {
        self.dtype
    }

    pub fn shape(&self) -> &TensorShape {
        &self.shape
    }

    pub fn num_elements(&self) -> i64 {
        self.shape.num_elements()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty() || self.dtype == DataType::Unknown
    }

    pub fn element_size(&self) -> usize {
        self.dtype.element_size()
    }

    /// Raw destination bytes, for dtype-agnostic kernels.
    pub fn data_mut(&mut self) -> &mut [u8] {
        self.buffer.data_mut()
    }

    pub fn as_mut_slice<T: Element>(&mut self) -> Result<&mut [T]> {
        let dtype = self.dtype;
        let shape = self.shape.clone();
        typed_prefix_mut(self.buffer.cast_mut::<T>(), dtype, &shape)
    }
}

fn check_typed<T: Element>(dtype: DataType, shape: &TensorShape, available: usize) -> Result<usize> {
    if dtype != T::DTYPE {
        return Err(RuntimeError::invalid_argument(format!(
            "Tensor holds {dtype}, requested {}",
            T::DTYPE
        )));
    }
    let count = shape.element_count().ok_or_else(|| {
        RuntimeError::invalid_argument(format!(
            "Tensor shape {shape} has negative dimensions or too many elements"
        ))
    })?;
    if available < count {
        return Err(RuntimeError::invalid_argument(format!(
            "Tensor shape {shape} needs {count} elements, buffer holds {available}"
        )));
    }
    Ok(count)
}

fn typed_prefix<'a, T: Element>(
    cast: Result<&'a [T]>,
    dtype: DataType,
    shape: &TensorShape,
) -> Result<&'a [T]> {
    if dtype != T::DTYPE {
        // report the dtype mismatch before any cast error
        check_typed::<T>(dtype, shape, 0)?;
    }
    let values = cast?;
    let count = check_typed::<T>(dtype, shape, values.len())?;
    Ok(&values[..count])
}

fn typed_prefix_mut<'a, T: Element>(
    cast: Result<&'a mut [T]>,
    dtype: DataType,
    shape: &TensorShape,
) -> Result<&'a mut [T]> {
    if dtype != T::DTYPE {
        check_typed::<T>(dtype, shape, 0)?;
    }
    let values = cast?;
    let count = check_typed::<T>(dtype, shape, values.len())?;
    Ok(&mut values[..count])
}

/// Typed owned storage backing a [`Tensor`].
#[derive(Clone, Debug, PartialEq)]
pub enum TensorStorage {
    Uint8(Vec<u8>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
}

impl TensorStorage {
    pub fn zeros(dtype: DataType, len: usize) -> Result<Self> {
        Ok(match dtype {
            DataType::Uint8 => Self::Uint8(vec![0; len]),
            DataType::Int32 => Self::Int32(vec![0; len]),
            DataType::Int64 => Self::Int64(vec![0; len]),
            DataType::Float32 => Self::Float32(vec![0.0; len]),
            DataType::Float64 => Self::Float64(vec![0.0; len]),
            DataType::Unknown => {
                return Err(RuntimeError::invalid_argument(
                    "Cannot allocate storage for unknown dtype",
                ));
            }
        })
    }

    pub fn dtype(&self) -> DataType {
        match self {
            Self::Uint8(_) => DataType::Uint8,
            Self::Int32(_) => DataType::Int32,
            Self::Int64(_) => DataType::Int64,
            Self::Float32(_) => DataType::Float32,
            Self::Float64(_) => DataType::Float64,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Uint8(v) => v.len(),
            Self::Int32(v) => v.len(),
            Self::Int64(v) => v.len(),
            Self::Float32(v) => v.len(),
            Self::Float64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Uint8(v) => v,
            Self::Int32(v) => bytemuck::cast_slice(v),
            Self::Int64(v) => bytemuck::cast_slice(v),
            Self::Float32(v) => bytemuck::cast_slice(v),
            Self::Float64(v) => bytemuck::cast_slice(v),
        }
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        match self {
            Self::Uint8(v) => v,
            Self::Int32(v) => bytemuck::cast_slice_mut(v),
            Self::Int64(v) => bytemuck::cast_slice_mut(v),
            Self::Float32(v) => bytemuck::cast_slice_mut(v),
            Self::Float64(v) => bytemuck::cast_slice_mut(v),
        }
    }
}

impl Default for TensorStorage {
    fn default() -> Self {
        Self::Uint8(Vec::new())
    }
}

/// An owned tensor, for data that has to outlive a single call: frames held
/// behind ports and engine outputs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Tensor {
    storage: TensorStorage,
    shape: TensorShape,
    device: DeviceType,
}

impl Tensor {
    pub fn from_vec<T: Element>(values: Vec<T>, shape: impl Into<TensorShape>) -> Result<Self> {
        let shape = shape.into();
        if shape.element_count() != Some(values.len()) {
            return Err(RuntimeError::invalid_argument(format!(
                "{} values do not fill shape {shape}",
                values.len()
            )));
        }
        Ok(Self {
            storage: T::into_storage(values),
            shape,
            device: DeviceType::Cpu,
        })
    }

    pub fn zeros(dtype: DataType, shape: impl Into<TensorShape>) -> Result<Self> {
        let shape = shape.into();
        let len = shape
            .element_count()
            .filter(|n| {
                n.checked_mul(dtype.element_size())
                    .is_some_and(|bytes| bytes <= isize::MAX as usize)
            })
            .ok_or_else(|| {
                RuntimeError::invalid_argument(format!("Cannot allocate tensor of shape {shape}"))
            })?;
        Ok(Self {
            storage: TensorStorage::zeros(dtype, len)?,
            shape,
            device: DeviceType::Cpu,
        })
    }

    /// Deep copy of a view, the explicit way to keep tensor data across ticks.
    pub fn from_view(view: &TensorView<'_>) -> Result<Self> {
        let shape = view.shape().clone();
        match view.dtype() {
            DataType::Uint8 => Self::from_vec(view.as_slice::<u8>()?.to_vec(), shape),
            DataType::Int32 => Self::from_vec(view.as_slice::<i32>()?.to_vec(), shape),
            DataType::Int64 => Self::from_vec(view.as_slice::<i64>()?.to_vec(), shape),
            DataType::Float32 => Self::from_vec(view.as_slice::<f32>()?.to_vec(), shape),
            DataType::Float64 => Self::from_vec(view.as_slice::<f64>()?.to_vec(), shape),
            DataType::Unknown => Err(RuntimeError::invalid_argument(
                "Cannot copy a tensor of unknown dtype",
            )),
        }
    }

    pub fn dtype(&self) -> DataType {
        self.storage.dtype()
    }

    pub fn shape(&self) -> &TensorShape {
        &self.shape
    }

    pub fn device_type(&self) -> DeviceType {
        self.device
    }

    pub fn storage(&self) -> &TensorStorage {
        &self.storage
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    pub fn reshape(&mut self, shape: impl Into<TensorShape>) -> Result<()> {
        let shape = shape.into();
        if shape.element_count() != Some(self.storage.len()) {
            return Err(RuntimeError::invalid_argument(format!(
                "Cannot reshape {} into {shape}",
                self.shape
            )));
        }
        self.shape = shape;
        Ok(())
    }

    pub fn view(&self) -> TensorView<'_> {
        TensorView::new(
            BufferView::new(self.storage.as_bytes(), self.device),
            self.dtype(),
            self.shape.clone(),
        )
    }

    pub fn view_mut(&mut self) -> TensorViewMut<'_> {
        let dtype = self.dtype();
        TensorViewMut::new(
            BufferViewMut::new(self.storage.as_bytes_mut(), self.device),
            dtype,
            self.shape.clone(),
        )
    }

    pub fn as_slice<T: Element>(&self) -> Result<&[T]> {
        self.view().as_slice::<T>()
    }
}
