//! Core operator, schema, tensor and graph types for opcheck.
//!
//! This crate provides the foundational abstractions that all other opcheck crates depend on:
//! - Operator identity and schemas (`OpId`, `FunctionSchema`, `Tag`)
//! - The read-only registry interface (`SchemaRegistry`) and an in-memory `OperatorRegistry`
//! - Argument trees (`Value`) and tensors carrying real or abstract storage (`Tensor`)
//! - Tensor metadata snapshots and their comparison (`TensorMeta`, `compare_tensor_meta`)
//! - Execution seams (`Dispatcher`, `AbstractSubstrate`, `AbstractScope`)
//! - Graph IR and the `Pass` trait for graph rewrites

pub mod broadcast;
pub mod dispatch;
pub mod ir;
pub mod meta;
pub mod op;
pub mod pass;
pub mod registry;
pub mod schema;
pub mod tags;
pub mod tensor;
pub mod types;
pub mod value;

// Re-export commonly used types
pub use broadcast::{broadcast_shape, broadcast_strides};
pub use dispatch::{AbstractScope, AbstractSubstrate, Dispatcher};
pub use ir::{IrGraph, IrNode, IrNodeId, NodeArg, NodeMeta, NodeOp};
pub use meta::{MetaMismatch, TensorMeta, compare_tensor_meta, contiguous_strides};
pub use op::{OpFamily, OpId};
pub use pass::{Pass, Stage};
pub use registry::{OperatorRegistry, OverloadFamily, SchemaRegistry};
pub use schema::{AliasInfo, Argument, FunctionSchema};
pub use tags::{Tag, TagSet};
pub use tensor::{Storage, Tensor};
pub use types::{DataType, Device, TensorData};
pub use value::{Kwargs, Scalar, Value, call_tensors, map_call_tensors};

/// Result type using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for opcheck operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Invalid graph structure: {0}")]
    InvalidGraph(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// The abstract substrate cannot run this call. Callers that shadow a real
    /// execution treat this as "no shadow data", never as a failure.
    #[error("Unsupported in abstract mode: {0}")]
    UnsupportedAbstract(String),

    #[error("Kernel error: {0}")]
    Kernel(String),

    #[error("Shape error: {0}")]
    Shape(String),

    #[error("Mismatch on {op}: {source}")]
    CrossRefMismatch {
        op: OpId,
        #[source]
        source: MetaMismatch,
    },

    #[error("Result structure mismatch on {op}: {detail}")]
    ResultStructure { op: OpId, detail: String },

    #[error("Abstract tensor leaked into real execution of {op}: {detail}")]
    AbstractLeak { op: OpId, detail: String },
}
