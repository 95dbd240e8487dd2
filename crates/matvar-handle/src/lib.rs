//! Shared and weak ownership handles over natively allocated matvar trees.
//!
//! A matvar is a tree of nodes allocated by a native library. Typed views
//! (vectors, structs, cell arrays) each hold a handle that answers one
//! question: which node do I access, and is it still alive? Two kinds of
//! handle answer it:
//!
//! - [`SharedMatvar`] keeps the ledger alive. The last clone to go
//!   releases the main node and every tracked dependency.
//! - [`WeakMatvar`] observes one node without keeping anything alive. It
//!   reports `None` once that node has been released.
//!
//! Both implement [`MatvarHandler`], so a view can hold either behind a
//! `Box<dyn MatvarHandler>`.
//!
//! # Architecture
//!
//! ```text
//! SharedMatvar ──Rc──┐
//! SharedMatvar ──Rc──┤
//!                    ▼
//!           RefCell<Ownership>  ── AllocatorRef (duplicate / free)
//!           ├── main node + policy + generation
//!           └── dependency tree (parent, policy, generation, children)
//!                    ▲
//! WeakMatvar ──Weak──┘  (node, generation)
//! ```
//!
//! Handles are single-threaded (`Rc`, `RefCell`). Nothing here is `Send`.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod config;
pub mod duplicate;
pub mod error;
pub mod handler;
pub mod ownership;
pub mod shared;
pub mod weak;

// Public re-exports for the primary API surface.
pub use config::OwnershipConfig;
pub use duplicate::{matvar_duplicate, matvar_shallow_duplicate};
pub use error::OwnershipError;
pub use handler::{LedgerRef, MatvarHandler};
pub use ownership::{Generation, Ownership, Parent};
pub use shared::SharedMatvar;
pub use weak::{WeakMatvar, WeakState};
