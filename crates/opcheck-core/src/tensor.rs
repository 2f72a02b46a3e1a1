//! Tensors with real or abstract storage.

use crate::meta::TensorMeta;
use crate::types::{DataType, Device, TensorData};
use crate::{Error, Result};
use std::sync::Arc;

/// Backing storage of a tensor.
///
/// Real storage is `Arc`-shared, so a view and its base read the same buffer.
/// Abstract storage carries no data at all; only the tensor's metadata is
/// meaningful.
#[derive(Debug, Clone)]
pub enum Storage {
    Real(Arc<TensorData>),
    Abstract,
}

/// A tensor value: metadata plus storage.
///
/// Cheap to clone (the buffer is shared, not copied).
#[derive(Debug, Clone)]
pub struct Tensor {
    meta: TensorMeta,
    storage: Storage,
}

impl Tensor {
    /// Create a contiguous CPU tensor from a flat buffer.
    pub fn from_data(data: TensorData, shape: &[usize]) -> Result<Self> {
        let meta = TensorMeta::contiguous(shape.to_vec(), data.dtype(), Device::Cpu);
        if data.len() != meta.numel() {
            return Err(Error::Shape(format!(
                "Data length {} doesn't match shape {:?} (product = {})",
                data.len(),
                shape,
                meta.numel()
            )));
        }
        Ok(Self {
            meta,
            storage: Storage::Real(Arc::new(data)),
        })
    }

    /// Create a real tensor with an explicit layout over `data`.
    pub fn from_parts(data: Arc<TensorData>, meta: TensorMeta) -> Result<Self> {
        check_layout(&meta, &data)?;
        Ok(Self {
            meta,
            storage: Storage::Real(data),
        })
    }

    /// Create an abstract tensor that carries only `meta`.
    pub fn new_abstract(meta: TensorMeta) -> Self {
        Self {
            meta,
            storage: Storage::Abstract,
        }
    }

    pub fn meta(&self) -> &TensorMeta {
        &self.meta
    }

    pub fn shape(&self) -> &[usize] {
        &self.meta.shape
    }

    pub fn strides(&self) -> &[usize] {
        &self.meta.strides
    }

    pub fn dtype(&self) -> DataType {
        self.meta.dtype
    }

    pub fn device(&self) -> Device {
        self.meta.device
    }

    pub fn ndim(&self) -> usize {
        self.meta.ndim()
    }

    pub fn numel(&self) -> usize {
        self.meta.numel()
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn is_abstract(&self) -> bool {
        matches!(self.storage, Storage::Abstract)
    }

    /// Check whether two tensors read the same real buffer.
    pub fn shares_storage(&self, other: &Tensor) -> bool {
        match (&self.storage, &other.storage) {
            (Storage::Real(a), Storage::Real(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// A new tensor over the same storage with a different layout.
    ///
    /// Used by view operations; the result aliases `self`.
    pub fn alias(&self, meta: TensorMeta) -> Result<Tensor> {
        if meta.dtype != self.meta.dtype {
            return Err(Error::Shape(format!(
                "Cannot alias a {} tensor as {}",
                self.meta.dtype, meta.dtype
            )));
        }
        if let Storage::Real(data) = &self.storage {
            check_layout(&meta, data)?;
        }
        Ok(Tensor {
            meta,
            storage: self.storage.clone(),
        })
    }

    /// Copy the elements into a fresh row-major buffer.
    ///
    /// Abstract tensors have no elements to copy.
    pub fn contiguous_data(&self) -> Result<TensorData> {
        match &self.storage {
            Storage::Real(data) => data
                .gather(&self.meta.storage_indices())
                .ok_or_else(|| Error::Shape("Tensor layout exceeds its storage".to_string())),
            Storage::Abstract => Err(Error::UnsupportedAbstract(
                "abstract tensors carry no data".to_string(),
            )),
        }
    }

    /// Elements in row-major order, widened to `f64`.
    pub fn to_f64_vec(&self) -> Result<Vec<f64>> {
        let data = self.contiguous_data()?;
        Ok((0..data.len()).filter_map(|i| data.get_f64(i)).collect())
    }
}

fn check_layout(meta: &TensorMeta, data: &TensorData) -> Result<()> {
    if meta.strides.len() != meta.shape.len() {
        return Err(Error::Shape(format!(
            "Shape {:?} and strides {:?} have different ranks",
            meta.shape, meta.strides
        )));
    }
    if meta.dtype != data.dtype() {
        return Err(Error::Shape(format!(
            "Layout dtype {} doesn't match storage dtype {}",
            meta.dtype,
            data.dtype()
        )));
    }
    if meta.required_storage_len() > data.len() {
        return Err(Error::Shape(format!(
            "Layout {:?}/{:?}+{} needs {} elements but storage has {}",
            meta.shape,
            meta.strides,
            meta.storage_offset,
            meta.required_storage_len(),
            data.len()
        )));
    }
    Ok(())
}
