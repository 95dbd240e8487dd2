//! The handle contract shared by [`SharedMatvar`] and [`WeakMatvar`].
//!
//! Typed views hold a `Box<dyn MatvarHandler>` and never need to know
//! which kind of handle they got. A view whose handler returns `None`
//! from [`get`](MatvarHandler::get) is invalid, whatever the reason.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use matvar_core::{DeletePolicy, NodePtr};

use crate::error::OwnershipError;
use crate::ownership::{Generation, Ownership};
use crate::shared::SharedMatvar;
use crate::weak::WeakMatvar;

/// Common operations of shared and weak handles.
pub trait MatvarHandler {
    /// The node this handle gives access to, or `None` if there is none or
    /// it is no longer alive.
    fn get(&self) -> Option<NodePtr>;

    /// Whether this handle extends the lifetime of its ledger.
    fn is_shared(&self) -> bool;

    /// Deep-copy `source` and make the copy this handle's main node.
    ///
    /// Fails for a null source and for weak handles; the ledger is left
    /// untouched on failure.
    fn duplicate_matvar(&mut self, source: Option<NodePtr>) -> Result<(), OwnershipError>;

    /// Take ownership of `node` as this handle's main node, releasing the
    /// previous main node and every dependency.
    ///
    /// Fails for a null node and for weak handles.
    fn import_matvar(&mut self, node: Option<NodePtr>) -> Result<(), OwnershipError>;

    /// An independent copy of this handle, of the same kind.
    fn boxed_clone(&self) -> Box<dyn MatvarHandler>;

    /// A weak handle on the same ledger, observing the same node.
    fn weak_ownership(&self) -> WeakMatvar;

    /// Stop tracking `node`, releasing it and its registered descendants
    /// per their policies. Views on those nodes become invalid.
    fn drop_owned_pointer(&self, node: NodePtr);

    /// Non-owning reference to the ledger, anchored at the node this handle
    /// observes.
    fn ownership(&self) -> LedgerRef;

    /// Whether [`get`](MatvarHandler::get) returns a node.
    fn is_valid(&self) -> bool {
        self.get().is_some()
    }

    /// Register `node` as a dependency of the node this handle observes
    /// and return a weak view on it.
    fn own_dependency(
        &self,
        node: NodePtr,
        policy: DeletePolicy,
    ) -> Result<WeakMatvar, OwnershipError> {
        WeakMatvar::dependency_with_policy(node, self, policy)
    }
}

/// Non-owning reference to a ledger plus the node a handle is anchored at.
///
/// Used to register nested nodes under the right parent and to inspect
/// the ledger without keeping it alive.
#[derive(Clone, Default)]
pub struct LedgerRef {
    pub(crate) ledger: Weak<RefCell<Ownership>>,
    pub(crate) anchor: Option<NodePtr>,
    pub(crate) generation: Option<Generation>,
}

impl LedgerRef {
    pub(crate) fn new(
        ledger: Weak<RefCell<Ownership>>,
        anchor: Option<NodePtr>,
        generation: Generation,
    ) -> Self {
        Self {
            ledger,
            anchor,
            generation: Some(generation),
        }
    }

    /// Whether the ledger still exists.
    pub fn is_alive(&self) -> bool {
        self.ledger.strong_count() > 0
    }

    /// The node the originating handle observes.
    pub fn anchor(&self) -> Option<NodePtr> {
        self.anchor
    }

    /// Run `f` against the ledger if it still exists.
    pub fn inspect<R>(&self, f: impl FnOnce(&Ownership) -> R) -> Option<R> {
        let ledger = self.ledger.upgrade()?;
        let borrowed = ledger.borrow();
        Some(f(&*borrowed))
    }

    /// Whether both references point at the same ledger.
    pub fn same_ledger(&self, other: &LedgerRef) -> bool {
        Weak::ptr_eq(&self.ledger, &other.ledger) && self.is_alive()
    }

    pub(crate) fn upgrade(&self) -> Option<Rc<RefCell<Ownership>>> {
        self.ledger.upgrade()
    }
}

impl From<&SharedMatvar> for LedgerRef {
    fn from(shared: &SharedMatvar) -> Self {
        shared.ownership()
    }
}
