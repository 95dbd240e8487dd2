//! Non-owning handles.
//!
//! A [`WeakMatvar`] observes one node of a ledger without keeping the
//! ledger alive. It checks liveness on every access: once the ledger is
//! gone, or the observed registration has been dropped or replaced, the
//! handle stays dangling for good.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use matvar_core::{DeletePolicy, NodePtr};

use crate::error::OwnershipError;
use crate::handler::{LedgerRef, MatvarHandler};
use crate::ownership::{Generation, Ownership};
use crate::shared::SharedMatvar;

/// Lifecycle of a weak handle.
///
/// `Unbound → Bound → Dangling`. No transition leaves `Dangling`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WeakState {
    /// Default-constructed; never observed anything.
    Unbound,
    /// The ledger exists and the observed registration is current.
    Bound,
    /// The ledger is gone or the observed node was pruned or replaced.
    Dangling,
}

#[derive(Clone)]
struct Binding {
    ledger: Weak<RefCell<Ownership>>,
    node: Option<NodePtr>,
    generation: Generation,
}

/// Weak handle on a ledger, observing one node in it.
#[derive(Clone, Default)]
pub struct WeakMatvar {
    binding: Option<Binding>,
}

impl WeakMatvar {
    /// An unbound handle. [`get`](MatvarHandler::get) always returns `None`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `node` as a dependency of the node `owner` observes, with
    /// the ledger's default dependency policy, and observe it.
    pub fn dependency<H>(node: NodePtr, owner: &H) -> Result<Self, OwnershipError>
    where
        H: MatvarHandler + ?Sized,
    {
        let anchor = owner.ownership();
        let policy = anchor
            .inspect(|ownership| ownership.config().dependency_policy)
            .ok_or(OwnershipError::LedgerReleased)?;
        Self::register(node, &anchor, policy)
    }

    /// Register `node` as a dependency of the node `owner` observes, to be
    /// released under `policy`, and observe it.
    ///
    /// Fails with [`OwnershipError::LedgerReleased`] if the owner's ledger
    /// is gone, with [`OwnershipError::UntrackedParent`] if the owner is a
    /// dangling weak handle and with [`OwnershipError::InvalidOwner`] if
    /// the owner observes no node.
    pub fn dependency_with_policy<H>(
        node: NodePtr,
        owner: &H,
        policy: DeletePolicy,
    ) -> Result<Self, OwnershipError>
    where
        H: MatvarHandler + ?Sized,
    {
        Self::register(node, &owner.ownership(), policy)
    }

    fn register(
        node: NodePtr,
        anchor: &LedgerRef,
        policy: DeletePolicy,
    ) -> Result<Self, OwnershipError> {
        let ledger = anchor.upgrade().ok_or(OwnershipError::LedgerReleased)?;
        let Some(owner_generation) = anchor.generation else {
            return Err(OwnershipError::LedgerReleased);
        };

        let registered = {
            let mut ownership = ledger.borrow_mut();
            if !ownership.is_live(anchor.anchor, owner_generation) {
                tracing::warn!(
                    %node,
                    parent = ?anchor.anchor,
                    "owner no longer observes a live node"
                );
                return Err(OwnershipError::UntrackedParent {
                    node,
                    parent: anchor.anchor,
                });
            }
            let Some(parent) = anchor.anchor else {
                tracing::warn!(%node, "owner observes no node");
                return Err(OwnershipError::InvalidOwner { node });
            };
            ownership.own(Some(node), false, Some(parent), policy)?
        };
        let Some(generation) = registered else {
            return Err(OwnershipError::NullInput);
        };

        Ok(Self {
            binding: Some(Binding {
                ledger: Rc::downgrade(&ledger),
                node: Some(node),
                generation,
            }),
        })
    }

    /// Observe the current main node of `shared`.
    pub fn rebind(&mut self, shared: &SharedMatvar) {
        *self = Self::from(shared);
    }

    /// Where this handle is in its lifecycle.
    pub fn state(&self) -> WeakState {
        let Some(binding) = &self.binding else {
            return WeakState::Unbound;
        };
        let Some(ledger) = binding.ledger.upgrade() else {
            return WeakState::Dangling;
        };
        let live = ledger.borrow().is_live(binding.node, binding.generation);
        if live {
            WeakState::Bound
        } else {
            WeakState::Dangling
        }
    }

    fn ledger(&self) -> Option<Rc<RefCell<Ownership>>> {
        self.binding.as_ref()?.ledger.upgrade()
    }
}

impl From<&SharedMatvar> for WeakMatvar {
    fn from(shared: &SharedMatvar) -> Self {
        let ledger = shared.ledger();
        let ownership = ledger.borrow();
        Self {
            binding: Some(Binding {
                ledger: Rc::downgrade(ledger),
                node: ownership.main(),
                generation: ownership.main_generation(),
            }),
        }
    }
}

impl MatvarHandler for WeakMatvar {
    fn get(&self) -> Option<NodePtr> {
        let binding = self.binding.as_ref()?;
        let node = binding.node?;
        let ledger = binding.ledger.upgrade()?;
        let live = ledger.borrow().is_live(Some(node), binding.generation);
        live.then_some(node)
    }

    fn is_shared(&self) -> bool {
        false
    }

    fn duplicate_matvar(&mut self, _source: Option<NodePtr>) -> Result<(), OwnershipError> {
        tracing::warn!("a weak handle cannot duplicate into the node it observes");
        Err(OwnershipError::NotShared)
    }

    fn import_matvar(&mut self, _node: Option<NodePtr>) -> Result<(), OwnershipError> {
        tracing::warn!("a weak handle cannot import a node");
        Err(OwnershipError::NotShared)
    }

    fn boxed_clone(&self) -> Box<dyn MatvarHandler> {
        Box::new(self.clone())
    }

    fn weak_ownership(&self) -> WeakMatvar {
        self.clone()
    }

    fn drop_owned_pointer(&self, node: NodePtr) {
        if let Some(ledger) = self.ledger() {
            ledger.borrow_mut().drop_owned(node);
        }
    }

    fn ownership(&self) -> LedgerRef {
        match &self.binding {
            Some(binding) => {
                LedgerRef::new(binding.ledger.clone(), binding.node, binding.generation)
            }
            None => LedgerRef::default(),
        }
    }
}

impl fmt::Debug for WeakMatvar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakMatvar")
            .field("node", &self.binding.as_ref().and_then(|b| b.node))
            .field("state", &self.state())
            .finish()
    }
}
