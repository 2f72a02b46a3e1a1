//! Reference execution substrates for opcheck.
//!
//! This crate provides the two execution engines the checks run against:
//!
//! 1. **Eager runtime** (`EagerRuntime`) - real data, implements `Dispatcher`
//! 2. **Fake tensor mode** (`FakeTensorMode`) - metadata only, implements
//!    `AbstractSubstrate`
//!
//! plus a `GraphExecutor` that runs a whole `IrGraph` through any dispatcher.
//!
//! # Example
//!
//! ```
//! use opcheck_core::{Dispatcher, Kwargs, OpId, Tensor, TensorData, Value};
//! use opcheck_runtime::EagerRuntime;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let runtime = EagerRuntime::new();
//! let x = Tensor::from_data(TensorData::F32(vec![1.0, 2.0, 3.0, 4.0]), &[2, 2])?;
//!
//! let out = runtime.call(&OpId::aten("t", ""), &[x.into()], &Kwargs::new())?;
//! assert_eq!(out.as_tensor().unwrap().strides(), &[1, 2]);
//! # Ok(())
//! # }
//! ```

mod eager;
mod error;
mod executor;
mod fake;

// Public exports
pub use eager::EagerRuntime;
pub use error::{Result, RuntimeError};
pub use executor::GraphExecutor;
pub use fake::{FakeTensorMode, FakeTensorScope};
