//! Element types, devices, and flat tensor storage.

use std::fmt;

/// Tensor element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    F32,
    F64,
    I32,
    I64,
    Bool,
}

impl DataType {
    /// Size of this data type in bytes.
    pub fn size(&self) -> usize {
        match self {
            DataType::F32 | DataType::I32 => 4,
            DataType::F64 | DataType::I64 => 8,
            DataType::Bool => 1,
        }
    }

    pub fn is_floating_point(&self) -> bool {
        matches!(self, DataType::F32 | DataType::F64)
    }

    /// Result type of a binary arithmetic op over `self` and `other`.
    pub fn promote(self, other: DataType) -> DataType {
        use DataType::*;
        match (self, other) {
            (a, b) if a == b => a,
            (F64, _) | (_, F64) => F64,
            (F32, _) | (_, F32) => F32,
            (I64, _) | (_, I64) => I64,
            (I32, _) | (_, I32) => I32,
            _ => Bool,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::F32 => "float32",
            DataType::F64 => "float64",
            DataType::I32 => "int32",
            DataType::I64 => "int64",
            DataType::Bool => "bool",
        };
        f.write_str(name)
    }
}

/// Where a tensor's storage lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Device {
    Cpu,
    Cuda(u32),
    /// Storage-less placeholder device.
    Meta,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => f.write_str("cpu"),
            Device::Cuda(index) => write!(f, "cuda:{index}"),
            Device::Meta => f.write_str("meta"),
        }
    }
}

/// Flat element buffer backing a real tensor.
///
/// Separated from layout metadata (shape, strides, offset) so that views can
/// share one buffer under different layouts.
#[derive(Debug, Clone, PartialEq)]
pub enum TensorData {
    F32(Vec<f32>),
    F64(Vec<f64>),
    I32(Vec<i32>),
    I64(Vec<i64>),
    Bool(Vec<bool>),
}

impl TensorData {
    /// Get the number of elements in this buffer.
    pub fn len(&self) -> usize {
        match self {
            TensorData::F32(v) => v.len(),
            TensorData::F64(v) => v.len(),
            TensorData::I32(v) => v.len(),
            TensorData::I64(v) => v.len(),
            TensorData::Bool(v) => v.len(),
        }
    }

    /// Check if this buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the element type of this buffer.
    pub fn dtype(&self) -> DataType {
        match self {
            TensorData::F32(_) => DataType::F32,
            TensorData::F64(_) => DataType::F64,
            TensorData::I32(_) => DataType::I32,
            TensorData::I64(_) => DataType::I64,
            TensorData::Bool(_) => DataType::Bool,
        }
    }

    /// Read one element widened to `f64`.
    pub fn get_f64(&self, index: usize) -> Option<f64> {
        match self {
            TensorData::F32(v) => v.get(index).map(|&x| x as f64),
            TensorData::F64(v) => v.get(index).copied(),
            TensorData::I32(v) => v.get(index).map(|&x| x as f64),
            TensorData::I64(v) => v.get(index).map(|&x| x as f64),
            TensorData::Bool(v) => v.get(index).map(|&x| if x { 1.0 } else { 0.0 }),
        }
    }

    /// Build a buffer of `dtype` from values produced in `f64`.
    pub fn from_f64(values: Vec<f64>, dtype: DataType) -> Self {
        match dtype {
            DataType::F32 => TensorData::F32(values.into_iter().map(|x| x as f32).collect()),
            DataType::F64 => TensorData::F64(values),
            DataType::I32 => TensorData::I32(values.into_iter().map(|x| x as i32).collect()),
            DataType::I64 => TensorData::I64(values.into_iter().map(|x| x as i64).collect()),
            DataType::Bool => TensorData::Bool(values.into_iter().map(|x| x != 0.0).collect()),
        }
    }

    /// Gather elements by storage index into a new buffer of the same type.
    pub fn gather(&self, indices: &[usize]) -> Option<Self> {
        fn pick<T: Copy>(v: &[T], indices: &[usize]) -> Option<Vec<T>> {
            indices.iter().map(|&i| v.get(i).copied()).collect()
        }
        Some(match self {
            TensorData::F32(v) => TensorData::F32(pick(v, indices)?),
            TensorData::F64(v) => TensorData::F64(pick(v, indices)?),
            TensorData::I32(v) => TensorData::I32(pick(v, indices)?),
            TensorData::I64(v) => TensorData::I64(pick(v, indices)?),
            TensorData::Bool(v) => TensorData::Bool(pick(v, indices)?),
        })
    }
}
