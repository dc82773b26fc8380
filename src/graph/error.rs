use thiserror::Error;

use super::NodeId;

/// Failures reported by [`GraphStore`](super::GraphStore) mutations.
///
/// Every variant is recoverable: the store is left exactly as it was before
/// the failed call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("node {0} does not exist")]
    NotFound(NodeId),

    #[error("no link from {from} to {to}")]
    LinkNotFound { from: NodeId, to: NodeId },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("node id {0} is used more than once")]
    DuplicateId(NodeId),
}
