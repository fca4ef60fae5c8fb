use crate::data::TensorStorage;
use serde::{Deserialize, Serialize};

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DeviceType {
    #[default]
    Cpu,
    Cuda,
}

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DataType {
    #[default]
    Unknown,
    Uint8,
    Int32,
    Int64,
    Float32,
    Float64,
}

impl DataType {
    /// Size in bytes of one element, 0 for [`DataType::Unknown`].
    pub fn element_size(self) -> usize {
        match self {
            DataType::Unknown => 0,
            DataType::Uint8 => 1,
            DataType::Int32 | DataType::Float32 => 4,
            DataType::Int64 | DataType::Float64 => 8,
        }
    }
}

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TensorLayout {
    #[default]
    Unknown,
    /// height, width, channels
    Hwc,
    /// channels, height, width
    Chw,
    /// batch, height, width, channels
    Nhwc,
    /// batch, channels, height, width
    Nchw,
}

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PixelFormat {
    #[default]
    Unknown,
    Gray8,
    Rgb8,
    Bgr8,
    Rgba8,
}

impl PixelFormat {
    pub fn channels(self) -> Option<usize> {
        match self {
            PixelFormat::Unknown => None,
            PixelFormat::Gray8 => Some(1),
            PixelFormat::Rgb8 | PixelFormat::Bgr8 => Some(3),
            PixelFormat::Rgba8 => Some(4),
        }
    }
}

/// Plain-old-data element types a tensor can hold.
pub trait Element: bytemuck::Pod + Default + Send + Sync + 'static {
    const DTYPE: DataType;

    fn into_storage(values: Vec<Self>) -> TensorStorage;
}

impl Element for u8 {
    const DTYPE: DataType = DataType::Uint8;

    fn into_storage(values: Vec<Self>) -> TensorStorage {
        TensorStorage::Uint8(values)
    }
}

impl Element for i32 {
    const DTYPE: DataType = DataType::Int32;

    fn into_storage(values: Vec<Self>) -> TensorStorage {
        TensorStorage::Int32(values)
    }
}

impl Element for i64 {
    const DTYPE: DataType = DataType::Int64;

    fn into_storage(values: Vec<Self>) -> TensorStorage {
        TensorStorage::Int64(values)
    }
}

impl Element for f32 {
    const DTYPE: DataType = DataType::Float32;

    fn into_storage(values: Vec<Self>) -> TensorStorage {
        TensorStorage::Float32(values)
    }
}

impl Element for f64 {
    const DTYPE: DataType = DataType::Float64;

    fn into_storage(values: Vec<Self>) -> TensorStorage {
        TensorStorage::Float64(values)
    }
}
