//! matio-backed [`NativeAllocator`] for matvar ownership handles.
//!
//! The ledger in `matvar-handle` is allocator-agnostic. This crate plugs
//! libmatio in: nodes are `matvar_t *`, payloads are `matvar_t::data`,
//! and duplication and release go through `Mat_VarDuplicate` and
//! `Mat_VarFree`.
//!
//! This crate contains the workspace's only `unsafe` FFI calls.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod sys;

use std::ffi::{c_int, CStr};
use std::ptr;
use std::rc::Rc;

use matvar_core::{AllocatorRef, NativeAllocator, NodePtr, PayloadPtr};

/// [`NativeAllocator`] over libmatio.
///
/// Constructed through [`MatioAllocator::new`], whose contract makes every
/// node handed to it a live `matvar_t` produced by matio.
#[derive(Debug)]
pub struct MatioAllocator {
    _private: (),
}

impl MatioAllocator {
    /// Create the allocator.
    ///
    /// # Safety
    ///
    /// Every [`NodePtr`] later passed to this allocator, directly or through
    /// a ledger, must point to a live `matvar_t` allocated by matio and not
    /// yet freed.
    #[allow(unsafe_code)]
    pub unsafe fn new() -> Self {
        Self { _private: () }
    }

    /// [`new`](Self::new) wrapped for use by a ledger.
    ///
    /// # Safety
    ///
    /// Same contract as [`new`](Self::new).
    #[allow(unsafe_code)]
    pub unsafe fn shared() -> AllocatorRef {
        // SAFETY: forwarded to the caller.
        Rc::new(unsafe { Self::new() })
    }
}

/// Allocate a row vector of doubles named `name`, copying `values`.
///
/// The caller owns the result: hand it to a ledger or release it through
/// a [`MatioAllocator`].
#[allow(unsafe_code)]
pub fn create_double_vector(name: &CStr, values: &[f64]) -> Option<NodePtr> {
    let dims = [1usize, values.len()];
    // SAFETY: `name` is NUL-terminated, `dims` holds `rank` entries and
    // `values` holds `dims[0] * dims[1]` doubles; with `opt = 0` matio
    // copies the data before returning.
    let raw = unsafe {
        sys::Mat_VarCreate(
            name.as_ptr(),
            sys::MAT_C_DOUBLE,
            sys::MAT_T_DOUBLE,
            2,
            dims.as_ptr(),
            values.as_ptr().cast(),
            0,
        )
    };
    NodePtr::from_raw(raw)
}

// Every method dereferences or frees a node under the contract of `new`.
#[allow(unsafe_code)]
impl NativeAllocator for MatioAllocator {
    fn duplicate(&self, node: NodePtr, deep: bool) -> Option<NodePtr> {
        // SAFETY: `node` is a live matvar per the contract of `new`.
        let copy =
            unsafe { sys::Mat_VarDuplicate(node.as_ptr::<sys::matvar_t>(), c_int::from(deep)) };
        if copy.is_null() {
            tracing::warn!(%node, deep, "Mat_VarDuplicate returned null");
        }
        NodePtr::from_raw(copy)
    }

    fn free(&self, node: NodePtr) {
        // SAFETY: `node` is a live matvar per the contract of `new`; the
        // ledger frees each node at most once.
        unsafe { sys::Mat_VarFree(node.as_ptr::<sys::matvar_t>()) };
    }

    fn detach_payload(&self, node: NodePtr) {
        // SAFETY: `node` is a live matvar per the contract of `new`.
        unsafe { (*node.as_ptr::<sys::matvar_t>()).data = ptr::null_mut() };
    }

    fn payload(&self, node: NodePtr) -> Option<PayloadPtr> {
        // SAFETY: `node` is a live matvar per the contract of `new`.
        let data = unsafe { (*node.as_ptr::<sys::matvar_t>()).data };
        PayloadPtr::from_raw(data)
    }
}
