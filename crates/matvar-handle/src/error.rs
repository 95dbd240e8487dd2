//! Ownership error types.
//!
//! Stale references are not errors: a handle whose node is gone reports
//! `None` from `get()`. The variants here cover rejected mutations and
//! registration contract violations.

use matvar_core::{DeletePolicy, NodeError, NodePtr};
use thiserror::Error;

/// Errors from ledger and handle operations.
///
/// A failed operation leaves the ledger exactly as it was.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum OwnershipError {
    /// A null node was passed where a node is required.
    #[error("input node is null")]
    NullInput,

    /// A weak handle was asked to replace the node it observes.
    #[error("a weak handle cannot replace the node it observes")]
    NotShared,

    /// The ledger behind a weak handle has already been torn down.
    #[error("the owning ledger has been released")]
    LedgerReleased,

    /// The claimed parent is neither the main node nor a tracked dependency.
    #[error("cannot register {node}: parent {parent:?} is not owned by this ledger")]
    UntrackedParent {
        /// The node being registered.
        node: NodePtr,
        /// The claimed parent, `None` for a null parent.
        parent: Option<NodePtr>,
    },

    /// The node is already tracked under a different parent.
    #[error("node {node} is already registered under a different parent")]
    ConflictingParent {
        /// The node being registered.
        node: NodePtr,
    },

    /// The node is already tracked under the same parent with another
    /// deletion policy.
    #[error("node {node} is already registered with policy {registered}, not {requested}")]
    ConflictingPolicy {
        /// The node being registered.
        node: NodePtr,
        /// The policy it is tracked with.
        registered: DeletePolicy,
        /// The policy asked for.
        requested: DeletePolicy,
    },

    /// The owning handle observes no node, so there is nothing to hang
    /// the dependency under.
    #[error("cannot register {node}: the owning handle observes no node")]
    InvalidOwner {
        /// The node being registered.
        node: NodePtr,
    },

    /// The main node cannot also be registered as a dependency.
    #[error("node {node} is the main node and cannot be registered as a dependency")]
    MainNodeRegistration {
        /// The main node.
        node: NodePtr,
    },

    /// The node to import is already tracked as a dependency of this ledger.
    #[error("node {node} is already owned by this ledger")]
    AlreadyOwned {
        /// The node being imported.
        node: NodePtr,
    },

    /// The native allocator failed.
    #[error(transparent)]
    Node(#[from] NodeError),
}
