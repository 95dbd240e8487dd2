//! Node duplication helpers.
//!
//! Views use these whenever a node must be handed to something that
//! takes ownership of it: a deep copy when the receiver may free or
//! mutate everything, a shallow copy when only a fresh wrapper is needed
//! and the payload must outlive the call.

use matvar_core::{AllocatorRef, NativeAllocator, NodeError, NodePtr};

use crate::error::OwnershipError;
use crate::shared::SharedMatvar;

/// Duplicate `node` through `allocator`, deep or shallow.
pub(crate) fn duplicate_node(
    allocator: &dyn NativeAllocator,
    node: Option<NodePtr>,
    deep: bool,
) -> Result<NodePtr, OwnershipError> {
    let Some(node) = node else {
        tracing::warn!(deep, "cannot duplicate a null node");
        return Err(OwnershipError::NullInput);
    };
    let copy = allocator
        .duplicate(node, deep)
        .ok_or(NodeError::DuplicationFailed { node, deep })?;
    Ok(copy)
}

/// A deep copy of `node`. The caller owns the result.
pub fn matvar_duplicate(
    allocator: &dyn NativeAllocator,
    node: Option<NodePtr>,
) -> Result<NodePtr, OwnershipError> {
    duplicate_node(allocator, node, true)
}

/// A shared handle around a shallow copy of `node`.
///
/// The copy shares `node`'s payload and is released with
/// [`DeletePolicy::Shallow`](matvar_core::DeletePolicy::Shallow), so
/// dropping the handle never frees the payload.
pub fn matvar_shallow_duplicate(
    allocator: AllocatorRef,
    node: Option<NodePtr>,
) -> Result<SharedMatvar, OwnershipError> {
    SharedMatvar::shallow_duplicate(allocator, node)
}
