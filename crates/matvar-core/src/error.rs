//! Allocator-level error types.

use thiserror::Error;

use crate::node::NodePtr;

/// Errors raised at the native allocator boundary.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum NodeError {
    /// The allocator returned no node when asked for a duplicate.
    #[error("allocator failed to duplicate node {node} (deep: {deep})")]
    DuplicationFailed {
        /// The node that was being duplicated.
        node: NodePtr,
        /// Whether a deep copy was requested.
        deep: bool,
    },
}
