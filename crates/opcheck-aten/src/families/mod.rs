//! Operator families that share one implementation.
//!
//! Each family implements its common logic once and is parameterized only by
//! the scalar function it applies.

pub mod binary_elementwise;
pub mod reduction;
pub mod unary_elementwise;

pub use binary_elementwise::BinaryElementwiseOp;
pub use reduction::ReductionOp;
pub use unary_elementwise::UnaryElementwiseOp;
