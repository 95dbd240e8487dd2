//! Core types and traits for matvar ownership tracking.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by the rest of the workspace: the opaque
//! [`NodePtr`] address of a natively allocated node, the
//! [`DeletePolicy`] attached to every owned node, and the
//! [`NativeAllocator`] trait through which nodes are duplicated and
//! released.
//!
//! The native library that actually owns the node layout (matio, or
//! the mock in `matvar-test-utils`) is an external collaborator: this
//! crate never interprets a node's payload.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod alloc;
pub mod error;
pub mod node;
pub mod policy;

pub use alloc::{AllocatorRef, NativeAllocator};
pub use error::NodeError;
pub use node::{NodePtr, PayloadPtr};
pub use policy::DeletePolicy;
