//! Execution seams.
//!
//! Operators are executed through a [`Dispatcher`] on real tensors, or inside
//! an [`AbstractScope`] on tensors that carry metadata only. Both take the
//! same `(op, args, kwargs)` triple and return a result tree.

use crate::op::OpId;
use crate::tensor::Tensor;
use crate::value::{Kwargs, Value};
use crate::Result;

/// Executes operators on real tensors.
///
/// # Example
///
/// ```ignore
/// let out = runtime.call(&OpId::aten("t", "default"), &[Value::Tensor(x)], &Kwargs::new())?;
/// ```
pub trait Dispatcher: Send + Sync {
    /// Run `op` and return its result tree.
    fn call(&self, op: &OpId, args: &[Value], kwargs: &Kwargs) -> Result<Value>;
}

/// A shape-only execution engine.
///
/// Each call to [`AbstractSubstrate::enter`] opens an independent scope.
/// Dropping the returned scope tears it down; scopes never outlive the code
/// that opened them, including early returns.
pub trait AbstractSubstrate: Send + Sync {
    fn enter(&self) -> Result<Box<dyn AbstractScope + '_>>;
}

/// One live abstract-execution scope.
pub trait AbstractScope {
    /// Convert a real tensor into an abstract tensor with identical metadata.
    fn lift(&mut self, tensor: &Tensor) -> Result<Tensor>;

    /// Run `op` on abstract arguments.
    ///
    /// Returns `Error::UnsupportedAbstract` when the result metadata cannot be
    /// computed without real data.
    fn call(&mut self, op: &OpId, args: &[Value], kwargs: &Kwargs) -> Result<Value>;
}
