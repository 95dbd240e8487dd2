//! Owning handles.
//!
//! A [`SharedMatvar`] keeps its ledger alive. Cloning one aliases the
//! same ledger; the last clone to go releases the main node and every
//! tracked dependency.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use matvar_core::{AllocatorRef, DeletePolicy, NativeAllocator, NodePtr, PayloadPtr};

use crate::config::OwnershipConfig;
use crate::duplicate::duplicate_node;
use crate::error::OwnershipError;
use crate::handler::{LedgerRef, MatvarHandler};
use crate::ownership::Ownership;
use crate::weak::WeakMatvar;

/// Strong, ownership-extending handle on a ledger.
#[derive(Clone)]
pub struct SharedMatvar {
    ownership: Rc<RefCell<Ownership>>,
}

impl SharedMatvar {
    /// An empty handle with a fresh ledger and no main node.
    pub fn new(allocator: AllocatorRef) -> Self {
        Self::with_config(allocator, OwnershipConfig::default())
    }

    /// An empty handle with a fresh ledger using `config`.
    pub fn with_config(allocator: AllocatorRef, config: OwnershipConfig) -> Self {
        Self::build(allocator, config, None, DeletePolicy::Full)
    }

    /// Take control of an already allocated node. It is released, in full,
    /// when the last clone of this handle goes away.
    pub fn from_node(allocator: AllocatorRef, node: NodePtr) -> Self {
        Self::from_node_with_config(allocator, node, OwnershipConfig::default())
    }

    /// Take control of `node` with the main policy from `config`.
    pub fn from_node_with_config(
        allocator: AllocatorRef,
        node: NodePtr,
        config: OwnershipConfig,
    ) -> Self {
        let policy = config.main_policy;
        Self::build(allocator, config, Some(node), policy)
    }

    /// Wrap a node owned outside this subsystem. The node is never freed,
    /// but dependencies registered under it are tracked as usual.
    pub fn borrowed(allocator: AllocatorRef, node: NodePtr) -> Self {
        Self::from_node_with_config(allocator, node, OwnershipConfig::borrowed())
    }

    /// A new handle around a shallow copy of `node`: a fresh wrapper
    /// sharing `node`'s payload, released with [`DeletePolicy::Shallow`].
    ///
    /// Used to pass a borrowed node to an API that takes ownership while
    /// the payload must stay with its original owner.
    pub fn shallow_duplicate(
        allocator: AllocatorRef,
        node: Option<NodePtr>,
    ) -> Result<Self, OwnershipError> {
        let copy = duplicate_node(&*allocator, node, false)?;
        Ok(Self::build(
            allocator,
            OwnershipConfig::default(),
            Some(copy),
            DeletePolicy::Shallow,
        ))
    }

    fn build(
        allocator: AllocatorRef,
        config: OwnershipConfig,
        main: Option<NodePtr>,
        policy: DeletePolicy,
    ) -> Self {
        Self {
            ownership: Rc::new(RefCell::new(Ownership::new(allocator, config, main, policy))),
        }
    }

    /// Import `node` as the main node, released under `policy`.
    ///
    /// Every view into the previous value becomes invalid.
    pub fn import_matvar_with_policy(
        &mut self,
        node: Option<NodePtr>,
        policy: DeletePolicy,
    ) -> Result<(), OwnershipError> {
        let Some(node) = node else {
            tracing::warn!("cannot import a null node");
            return Err(OwnershipError::NullInput);
        };
        self.ownership.borrow_mut().replace_main(node, policy)?;
        Ok(())
    }

    /// The allocator releasing this handle's nodes.
    pub fn allocator(&self) -> AllocatorRef {
        self.ownership.borrow().allocator().clone()
    }

    /// Payload address of the main node.
    pub fn payload(&self) -> Option<PayloadPtr> {
        let ownership = self.ownership.borrow();
        let main = ownership.main()?;
        ownership.allocator().payload(main)
    }

    /// Number of shared handles aliasing this ledger.
    pub fn strong_count(&self) -> usize {
        Rc::strong_count(&self.ownership)
    }

    /// Whether both handles alias the same ledger.
    pub fn ptr_eq(&self, other: &SharedMatvar) -> bool {
        Rc::ptr_eq(&self.ownership, &other.ownership)
    }

    /// Number of dependencies tracked by the ledger.
    pub fn dependency_count(&self) -> usize {
        self.ownership.borrow().dependency_count()
    }

    pub(crate) fn ledger(&self) -> &Rc<RefCell<Ownership>> {
        &self.ownership
    }
}

impl MatvarHandler for SharedMatvar {
    fn get(&self) -> Option<NodePtr> {
        self.ownership.borrow().main()
    }

    fn is_shared(&self) -> bool {
        true
    }

    fn duplicate_matvar(&mut self, source: Option<NodePtr>) -> Result<(), OwnershipError> {
        let allocator = self.allocator();
        let copy = duplicate_node(&*allocator, source, true)?;
        let replaced = self
            .ownership
            .borrow_mut()
            .replace_main(copy, DeletePolicy::Full);
        if let Err(err) = replaced {
            allocator.free(copy);
            return Err(err);
        }
        Ok(())
    }

    fn import_matvar(&mut self, node: Option<NodePtr>) -> Result<(), OwnershipError> {
        self.import_matvar_with_policy(node, DeletePolicy::Full)
    }

    fn boxed_clone(&self) -> Box<dyn MatvarHandler> {
        Box::new(self.clone())
    }

    fn weak_ownership(&self) -> WeakMatvar {
        WeakMatvar::from(self)
    }

    fn drop_owned_pointer(&self, node: NodePtr) {
        self.ownership.borrow_mut().drop_owned(node);
    }

    fn ownership(&self) -> LedgerRef {
        let ownership = self.ownership.borrow();
        LedgerRef::new(
            Rc::downgrade(&self.ownership),
            ownership.main(),
            ownership.main_generation(),
        )
    }
}

impl fmt::Debug for SharedMatvar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ownership = self.ownership.borrow();
        f.debug_struct("SharedMatvar")
            .field("main", &ownership.main())
            .field("policy", &ownership.main_policy())
            .field("dependencies", &ownership.dependency_count())
            .field("strong", &Rc::strong_count(&self.ownership))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matvar_test_utils::{record, vector, MockAllocator};

    fn setup() -> (Rc<MockAllocator>, AllocatorRef) {
        let mock = Rc::new(MockAllocator::new());
        let allocator: AllocatorRef = mock.clone();
        (mock, allocator)
    }

    #[test]
    fn default_is_empty() {
        let (_mock, allocator) = setup();
        let shared = SharedMatvar::new(allocator);
        assert_eq!(shared.get(), None);
        assert!(shared.is_shared());
        assert!(!shared.is_valid());
    }

    #[test]
    fn from_node_owns_it() {
        let (mock, allocator) = setup();
        let node = vector(&mock, 7);
        let shared = SharedMatvar::from_node(allocator, node);
        assert_eq!(shared.get(), Some(node));
        drop(shared);
        assert!(mock.stats().is_balanced());
    }

    #[test]
    fn clones_alias_one_ledger() {
        let (mock, allocator) = setup();
        let node = vector(&mock, 7);
        let shared = SharedMatvar::from_node(allocator, node);
        let other = shared.clone();
        assert!(shared.ptr_eq(&other));
        assert_eq!(shared.strong_count(), 2);

        drop(shared);
        assert_eq!(other.get(), Some(node));
        assert!(mock.is_live(node));
        drop(other);
        assert!(!mock.is_live(node));
        assert_eq!(mock.stats().double_frees, 0);
    }

    #[test]
    fn reassignment_switches_ledger() {
        let (mock, allocator) = setup();
        let a = vector(&mock, 1);
        let b = vector(&mock, 2);
        let mut first = SharedMatvar::from_node(allocator.clone(), a);
        let second = SharedMatvar::from_node(allocator, b);

        first = second.clone();
        assert!(!mock.is_live(a));
        assert_eq!(first.get(), Some(b));
        assert!(first.ptr_eq(&second));
    }

    #[test]
    fn import_replaces_main_and_frees_old() {
        let (mock, allocator) = setup();
        let old = vector(&mock, 3);
        let new = vector(&mock, 5);
        let mut shared = SharedMatvar::from_node(allocator, old);
        let alias = shared.clone();

        shared.import_matvar(Some(new)).unwrap();
        assert!(!mock.is_live(old));
        assert_eq!(shared.get(), Some(new));
        assert_eq!(alias.get(), Some(new));
    }

    #[test]
    fn import_null_leaves_handle_untouched() {
        let (mock, allocator) = setup();
        let node = vector(&mock, 3);
        let mut shared = SharedMatvar::from_node(allocator, node);
        assert_eq!(shared.import_matvar(None), Err(OwnershipError::NullInput));
        assert_eq!(shared.get(), Some(node));
        assert!(mock.is_live(node));
    }

    #[test]
    fn duplicate_is_deep_and_independent() {
        let (mock, allocator) = setup();
        let source = vector(&mock, 7);
        let mut shared = SharedMatvar::new(allocator);

        shared.duplicate_matvar(Some(source)).unwrap();
        let copy = shared.get().unwrap();
        assert_ne!(copy, source);

        assert!(mock.set_value(source, 0, 1.0));
        assert!(mock.set_value(copy, 0, 2.0));
        assert_eq!(mock.values(source).unwrap()[0], 1.0);
        assert_eq!(mock.values(copy).unwrap()[0], 2.0);

        mock.free(source);
        assert_eq!(mock.values(copy).unwrap().len(), 7);
        drop(shared);
        assert!(mock.stats().is_balanced());
    }

    #[test]
    fn duplicate_of_own_dependency_survives_teardown() {
        let (mock, allocator) = setup();
        let main = record(&mock, 2);
        let field = mock.element(main, 0).unwrap();
        let mut shared = SharedMatvar::from_node(allocator, main);
        let view = shared.own_dependency(field, DeletePolicy::Never).unwrap();

        shared.duplicate_matvar(view.get()).unwrap();
        assert!(!mock.is_live(main));
        assert!(!mock.is_live(field));
        assert_eq!(mock.values(shared.get().unwrap()), Some(vec![0.0, 1.0, 2.0]));
        assert_eq!(view.get(), None);
    }

    #[test]
    fn duplicate_null_fails() {
        let (_mock, allocator) = setup();
        let mut shared = SharedMatvar::new(allocator);
        assert_eq!(shared.duplicate_matvar(None), Err(OwnershipError::NullInput));
        assert_eq!(shared.get(), None);
    }

    #[test]
    fn borrowed_node_is_never_freed() {
        let (mock, allocator) = setup();
        let node = vector(&mock, 2);
        let shared = SharedMatvar::borrowed(allocator, node);
        assert_eq!(shared.get(), Some(node));
        drop(shared);
        assert!(mock.is_live(node));
        mock.free(node);
    }

    #[test]
    fn payload_reports_main_payload() {
        let (mock, allocator) = setup();
        let node = vector(&mock, 2);
        let shared = SharedMatvar::from_node(allocator.clone(), node);
        assert_eq!(shared.payload(), mock.payload(node));
        assert_eq!(SharedMatvar::new(allocator).payload(), None);
    }

    #[test]
    fn debug_lists_main_and_counts() {
        let (mock, allocator) = setup();
        let node = vector(&mock, 2);
        let shared = SharedMatvar::from_node(allocator, node);
        let text = format!("{shared:?}");
        assert!(text.contains("SharedMatvar"));
        assert!(text.contains("strong: 1"));
    }
}
