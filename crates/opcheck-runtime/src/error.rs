//! Error types for the runtime crate.

use opcheck_core::OpId;
use thiserror::Error;

/// Graph execution errors.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// A graph input was not supplied, or an unknown one was.
    #[error("Invalid input or output: {0}")]
    InvalidInputOutput(String),

    /// The graph is malformed.
    #[error("Graph error: {0}")]
    GraphError(String),

    /// A node's operator failed.
    #[error("Node '{node}' ({op}) failed: {source}")]
    NodeFailed {
        node: String,
        op: OpId,
        #[source]
        source: opcheck_core::Error,
    },

    #[error(transparent)]
    Core(#[from] opcheck_core::Error),
}

/// Specialized Result type for runtime operations.
pub type Result<T> = std::result::Result<T, RuntimeError>;
