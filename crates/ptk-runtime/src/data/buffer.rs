use crate::error::{Result, RuntimeError};
use crate::types::{DeviceType, Element};

/// A non-owning, device-tagged view over raw bytes.
///
/// The view borrows the memory it describes, so it can never outlive the scope
/// that produced it (typically one tick or one call).
#[derive(Clone, Copy, Debug, Default)]
pub struct BufferView<'a> {
    data: &'a [u8],
    device: DeviceType,
}

impl<'a> BufferView<'a> {
    pub fn new(data: &'a [u8], device: DeviceType) -> Self {
        Self { data, device }
    }

    pub fn from_slice<T: Element>(data: &'a [T], device: DeviceType) -> Self {
        Self::new(bytemuck::cast_slice(data), device)
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    pub fn device_type(&self) -> DeviceType {
        self.device
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Reinterprets the bytes as a slice of `T`.
    pub fn cast<T: Element>(&self) -> Result<&'a [T]> {
        ensure_host(self.device)?;
        bytemuck::try_cast_slice(self.data).map_err(|e| {
            RuntimeError::invalid_argument(format!(
                "Buffer of {} bytes cannot be viewed as {}: {e}",
                self.data.len(),
                T::DTYPE
            ))
        })
    }
}

/// Mutable counterpart of [`BufferView`], used as the destination of operators.
#[derive(Debug)]
pub struct BufferViewMut<'a> {
    data: &'a mut [u8],
    device: DeviceType,
}

impl<'a> BufferViewMut<'a> {
    pub fn new(data: &'a mut [u8], device: DeviceType) -> Self {
        Self { data, device }
    }

    pub fn from_slice<T: Element>(data: &'a mut [T], device: DeviceType) -> Self {
        Self::new(bytemuck::cast_slice_mut(data), device)
    }

    pub fn as_view(&self) -> BufferView<'_> {
        BufferView::new(&*self.data, self.device)
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut *self.data
    }

    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    pub fn device_type(&self) -> DeviceType {
        self.device
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn cast_mut<T: Element>(&mut self) -> Result<&mut [T]> {
        ensure_host(self.device)?;
        let len = self.data.len();
        bytemuck::try_cast_slice_mut(&mut *self.data).map_err(|e| {
            RuntimeError::invalid_argument(format!(
                "Buffer of {len} bytes cannot be viewed as {}: {e}",
                T::DTYPE
            ))
        })
    }
}

fn ensure_host(device: DeviceType) -> Result<()> {
    match device {
        DeviceType::Cpu => Ok(()),
        other => Err(RuntimeError::invalid_argument(format!(
            "Buffer lives on {other}; host access is not supported"
        ))),
    }
}
