//! Opaque node and payload addresses.
//!
//! A native node has no identity beyond its address. [`NodePtr`] wraps
//! that address as a non-null pointer so that "no node" is spelled
//! `Option<NodePtr>` instead of a null check.

use std::ffi::c_void;
use std::fmt;
use std::ptr::NonNull;

/// Address of a natively allocated node.
///
/// `NodePtr` is `Copy`, hashable and ordered by address. It carries no
/// lifetime: whether the node behind it is still allocated is decided by
/// the ledger that owns it, never by the pointer itself.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NodePtr(NonNull<c_void>);

impl NodePtr {
    /// Wrap a raw node pointer. Returns `None` for null.
    pub fn from_raw<T>(ptr: *mut T) -> Option<Self> {
        NonNull::new(ptr.cast::<c_void>()).map(Self)
    }

    /// Wrap a non-null pointer.
    pub fn from_non_null<T>(ptr: NonNull<T>) -> Self {
        Self(ptr.cast())
    }

    /// The raw pointer, cast to the native node type.
    pub fn as_ptr<T>(self) -> *mut T {
        self.0.as_ptr().cast()
    }

    /// The numeric address.
    pub fn addr(self) -> usize {
        self.0.as_ptr() as usize
    }
}

impl fmt::Debug for NodePtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodePtr({:p})", self.0)
    }
}

impl fmt::Display for NodePtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:p}", self.0)
    }
}

/// Address of a node's payload buffer.
///
/// Only used for identity comparisons: a shallow duplicate shares its
/// payload with the original, a deep duplicate does not.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PayloadPtr(NonNull<c_void>);

impl PayloadPtr {
    /// Wrap a raw payload pointer. Returns `None` for null.
    pub fn from_raw<T>(ptr: *mut T) -> Option<Self> {
        NonNull::new(ptr.cast::<c_void>()).map(Self)
    }

    /// The numeric address.
    pub fn addr(self) -> usize {
        self.0.as_ptr() as usize
    }
}
