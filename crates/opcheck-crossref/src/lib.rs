//! Cross-reference checking of abstract execution.
//!
//! [`CrossRefFakeMode`] sits in front of a real [`Dispatcher`]. Every call is
//! first run on abstract copies of its arguments inside a fresh scope, then
//! for real; the two results must agree on shape, dtype, device and layout.
//! A disagreement means the abstract implementation of that operator is
//! wrong.
//!
//! # Example
//!
//! ```no_run
//! use opcheck_core::{Dispatcher, Kwargs, OpId, Value};
//! use opcheck_crossref::CrossRefFakeMode;
//! use opcheck_runtime::{EagerRuntime, FakeTensorMode};
//!
//! # fn main() -> opcheck_core::Result<()> {
//! # let x = opcheck_core::Tensor::from_data(opcheck_core::TensorData::F32(vec![0.0; 6]), &[2, 3])?;
//! let registry = opcheck_aten::aten_registry()?;
//! let (runtime, fake) = (EagerRuntime::new(), FakeTensorMode::new());
//! let checked = CrossRefFakeMode::new(&runtime, &fake, &registry)
//!     .with_ignore_op(|op| op.name() == "relu");
//!
//! let _out = checked.call(&OpId::aten("t", ""), &[Value::Tensor(x)], &Kwargs::new())?;
//! # Ok(())
//! # }
//! ```

mod compare;
mod mode;

pub use compare::compare_results;
pub use mode::{CrossRefFakeMode, IgnoreOp, Outcome, SkipReason};
