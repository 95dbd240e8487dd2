//! The native allocator boundary.
//!
//! Every node the ledger tracks was produced by, and is returned to, a
//! [`NativeAllocator`]. The trait exposes the three primitives the
//! ownership layer needs plus a payload query used for identity checks.

use std::rc::Rc;

use crate::node::{NodePtr, PayloadPtr};
use crate::policy::DeletePolicy;

/// Primitive operations of the external, non-reference-counted allocator.
///
/// Implementations decide how much validation they perform on the node
/// addresses they receive. Callers must only pass nodes that the same
/// allocator produced and that have not been freed yet.
pub trait NativeAllocator {
    /// Clone `node`. A shallow clone shares the payload pointer with the
    /// original; a deep clone owns a copy of it.
    ///
    /// Returns `None` if the allocator cannot produce the clone.
    fn duplicate(&self, node: NodePtr, deep: bool) -> Option<NodePtr>;

    /// Release the node's allocation together with any payload it still
    /// references.
    fn free(&self, node: NodePtr);

    /// Null the node's payload reference without freeing the payload.
    fn detach_payload(&self, node: NodePtr);

    /// The node's current payload address, `None` if detached or empty.
    fn payload(&self, node: NodePtr) -> Option<PayloadPtr>;

    /// Release `node` according to `policy`.
    ///
    /// `Shallow` detaches the payload before freeing so that a payload
    /// shared with another node survives.
    fn release(&self, node: NodePtr, policy: DeletePolicy) {
        match policy {
            DeletePolicy::Never => {}
            DeletePolicy::Shallow => {
                self.detach_payload(node);
                self.free(node);
            }
            DeletePolicy::Full => self.free(node),
        }
    }
}

/// Shared reference to an allocator, held by every ledger.
pub type AllocatorRef = Rc<dyn NativeAllocator>;
