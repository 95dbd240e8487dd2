//! The ownership ledger and its dependency tree.
//!
//! An [`Ownership`] is shared by every [`SharedMatvar`](crate::SharedMatvar)
//! aliasing the same value. It holds the main node, which is released
//! when the last shared handle goes away, and a dependency tree of nested
//! nodes that have been handed out as views:
//!
//! ```text
//! Ownership
//! ├── main: NodePtr (+ DeletePolicy, Generation)
//! └── dependencies: IndexMap<NodePtr, Dependency>
//!     └── Dependency { parent: Main | Node(NodePtr), policy, generation, children }
//! ```
//!
//! Every registration is stamped with a fresh [`Generation`]. A weak
//! handle remembers the stamp of the registration it observes, so a node
//! that was dropped and registered again, or an address recycled by the
//! native allocator, never revives an old view.

use indexmap::IndexMap;
use matvar_core::{AllocatorRef, DeletePolicy, NativeAllocator, NodePtr};
use smallvec::SmallVec;

use crate::config::OwnershipConfig;
use crate::error::OwnershipError;

/// Registration stamp of a node within a ledger.
///
/// Strictly increasing per ledger; never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Generation(u64);

impl Generation {
    /// The raw counter value.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Where a dependency hangs in the tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Parent {
    /// Directly under the main node.
    Main,
    /// Under another tracked dependency.
    Node(NodePtr),
}

#[derive(Clone, Debug)]
struct Dependency {
    parent: Parent,
    policy: DeletePolicy,
    generation: Generation,
    children: SmallVec<[NodePtr; 4]>,
}

/// Shared ownership record: main node plus dependency tree.
///
/// Not thread-safe. Handles keep it in an `Rc<RefCell<_>>`.
pub struct Ownership {
    allocator: AllocatorRef,
    config: OwnershipConfig,
    main: Option<NodePtr>,
    main_policy: DeletePolicy,
    main_generation: Generation,
    dependencies: IndexMap<NodePtr, Dependency>,
    next_generation: u64,
}

impl Ownership {
    /// Create a ledger claiming `main` (possibly none) under `main_policy`.
    pub(crate) fn new(
        allocator: AllocatorRef,
        config: OwnershipConfig,
        main: Option<NodePtr>,
        main_policy: DeletePolicy,
    ) -> Self {
        Self {
            allocator,
            config,
            main,
            main_policy,
            main_generation: Generation(0),
            dependencies: IndexMap::new(),
            next_generation: 1,
        }
    }

    /// The main node, `None` if empty or torn down.
    pub fn main(&self) -> Option<NodePtr> {
        self.main
    }

    /// Deletion policy of the main node.
    pub fn main_policy(&self) -> DeletePolicy {
        self.main_policy
    }

    /// Stamp of the current main node.
    pub fn main_generation(&self) -> Generation {
        self.main_generation
    }

    /// The ledger's configuration.
    pub fn config(&self) -> &OwnershipConfig {
        &self.config
    }

    /// The allocator that releases this ledger's nodes.
    pub fn allocator(&self) -> &AllocatorRef {
        &self.allocator
    }

    /// Whether `node` is the main node or a tracked dependency.
    pub fn is_owning(&self, node: NodePtr) -> bool {
        self.main == Some(node) || self.dependencies.contains_key(&node)
    }

    /// Whether the registration `(node, generation)` is still current.
    ///
    /// `None` stands for an empty main slot.
    pub fn is_live(&self, node: Option<NodePtr>, generation: Generation) -> bool {
        match node {
            None => self.main.is_none() && self.main_generation == generation,
            Some(n) if self.main == Some(n) => self.main_generation == generation,
            Some(n) => self
                .dependencies
                .get(&n)
                .is_some_and(|dep| dep.generation == generation),
        }
    }

    /// Number of tracked dependencies (the main node excluded).
    pub fn dependency_count(&self) -> usize {
        self.dependencies.len()
    }

    /// Parent of a tracked dependency.
    pub fn parent_of(&self, node: NodePtr) -> Option<Parent> {
        self.dependencies.get(&node).map(|dep| dep.parent)
    }

    /// Registered children of `node`. The main node's children are the
    /// dependencies whose parent is [`Parent::Main`].
    pub fn children_of(&self, node: NodePtr) -> Vec<NodePtr> {
        if self.main == Some(node) {
            return self
                .dependencies
                .iter()
                .filter(|(_, dep)| dep.parent == Parent::Main)
                .map(|(&child, _)| child)
                .collect();
        }
        self.dependencies
            .get(&node)
            .map(|dep| dep.children.to_vec())
            .unwrap_or_default()
    }

    /// Deletion policy of the main node or of a tracked dependency.
    pub fn policy_of(&self, node: NodePtr) -> Option<DeletePolicy> {
        if self.main == Some(node) {
            return Some(self.main_policy);
        }
        self.dependencies.get(&node).map(|dep| dep.policy)
    }

    /// Register `node` as a dependency of `parent`, or of the main node if
    /// `owner_is_main`.
    ///
    /// A parent equal to the main node (including two empty slots) hangs
    /// the node under [`Parent::Main`]. Registering a node again under the
    /// same parent and policy returns its existing stamp; a different
    /// parent or policy is rejected. A null node is a no-op.
    pub(crate) fn own(
        &mut self,
        node: Option<NodePtr>,
        owner_is_main: bool,
        parent: Option<NodePtr>,
        policy: DeletePolicy,
    ) -> Result<Option<Generation>, OwnershipError> {
        let Some(node) = node else {
            return Ok(None);
        };
        if self.main == Some(node) {
            return self.reject(OwnershipError::MainNodeRegistration { node });
        }

        let parent = if owner_is_main || parent == self.main {
            Parent::Main
        } else {
            match parent {
                Some(p) if self.dependencies.contains_key(&p) => Parent::Node(p),
                _ => return self.reject(OwnershipError::UntrackedParent { node, parent }),
            }
        };

        if let Some(existing) = self.dependencies.get(&node) {
            if existing.parent != parent {
                return self.reject(OwnershipError::ConflictingParent { node });
            }
            if existing.policy != policy {
                return self.reject(OwnershipError::ConflictingPolicy {
                    node,
                    registered: existing.policy,
                    requested: policy,
                });
            }
            return Ok(Some(existing.generation));
        }

        let generation = self.bump();
        self.dependencies.insert(
            node,
            Dependency {
                parent,
                policy,
                generation,
                children: SmallVec::new(),
            },
        );
        if let Parent::Node(p) = parent {
            if let Some(entry) = self.dependencies.get_mut(&p) {
                entry.children.push(node);
            }
        }
        tracing::debug!(
            %node,
            ?parent,
            %policy,
            generation = generation.0,
            "registered dependency"
        );
        Ok(Some(generation))
    }

    /// Remove `node` and its registered descendants, releasing each per
    /// its policy, descendants first.
    ///
    /// No-op for untracked nodes, including the main node.
    pub(crate) fn drop_owned(&mut self, node: NodePtr) {
        let Some(entry) = self.dependencies.swap_remove(&node) else {
            return;
        };
        if let Parent::Node(parent) = entry.parent {
            if let Some(parent_entry) = self.dependencies.get_mut(&parent) {
                parent_entry.children.retain(|child| *child != node);
            }
        }
        tracing::debug!(%node, descendants = entry.children.len(), "dropping owned node");
        release_subtree(&*self.allocator, &mut self.dependencies, node, entry);
    }

    /// Release the main node, then every dependency, and empty the ledger.
    pub(crate) fn drop_all(&mut self) {
        if let Some(main) = self.main.take() {
            release(&*self.allocator, main, self.main_policy);
        }

        let mut dependencies = std::mem::take(&mut self.dependencies);
        let roots: SmallVec<[NodePtr; 8]> = dependencies
            .iter()
            .filter(|(_, dep)| dep.parent == Parent::Main)
            .map(|(&node, _)| node)
            .collect();
        for root in roots {
            if let Some(entry) = dependencies.swap_remove(&root) {
                release_subtree(&*self.allocator, &mut dependencies, root, entry);
            }
        }
        // Anything left was not reachable from a root.
        for (node, entry) in dependencies.drain(..) {
            release(&*self.allocator, node, entry.policy);
        }

        self.main_generation = self.bump();
    }

    /// Tear the ledger down and install `node` as its new main node.
    ///
    /// Importing the current main node only updates its policy. A node
    /// that is tracked as a dependency is rejected: tearing the ledger
    /// down could free it.
    pub(crate) fn replace_main(
        &mut self,
        node: NodePtr,
        policy: DeletePolicy,
    ) -> Result<Generation, OwnershipError> {
        if self.main == Some(node) {
            self.main_policy = policy;
            return Ok(self.main_generation);
        }
        if self.dependencies.contains_key(&node) {
            tracing::warn!(%node, "refusing to import a node already owned as a dependency");
            return Err(OwnershipError::AlreadyOwned { node });
        }
        tracing::debug!(
            old = ?self.main,
            new = %node,
            dependencies = self.dependencies.len(),
            "replacing main node"
        );
        self.drop_all();
        self.main = Some(node);
        self.main_policy = policy;
        self.main_generation = self.bump();
        Ok(self.main_generation)
    }

    fn bump(&mut self) -> Generation {
        let generation = Generation(self.next_generation);
        self.next_generation += 1;
        generation
    }

    fn reject<T>(&self, err: OwnershipError) -> Result<T, OwnershipError> {
        tracing::warn!(%err, "rejected dependency registration");
        debug_assert!(!self.config.strict_registration, "{err}");
        Err(err)
    }
}

impl Drop for Ownership {
    fn drop(&mut self) {
        self.drop_all();
    }
}

fn release(allocator: &dyn NativeAllocator, node: NodePtr, policy: DeletePolicy) {
    if policy.frees_node() {
        tracing::debug!(%node, %policy, "releasing native node");
    }
    allocator.release(node, policy);
}

/// Release the descendants of `node` depth-first, then `node` itself.
///
/// Iterative: nesting depth is bounded by the heap, not the call stack.
fn release_subtree(
    allocator: &dyn NativeAllocator,
    dependencies: &mut IndexMap<NodePtr, Dependency>,
    node: NodePtr,
    entry: Dependency,
) {
    let mut pending = vec![(node, entry.policy, entry.children.into_iter())];
    while let Some((_, _, children)) = pending.last_mut() {
        match children.next() {
            Some(child) => {
                if let Some(child_entry) = dependencies.swap_remove(&child) {
                    pending.push((child, child_entry.policy, child_entry.children.into_iter()));
                }
            }
            None => {
                if let Some((done, policy, _)) = pending.pop() {
                    release(allocator, done, policy);
                }
            }
        }
    }
}
