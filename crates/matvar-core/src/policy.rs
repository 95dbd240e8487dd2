//! Deletion policies.

use std::fmt;

/// How much of a node is released when its owner lets go of it.
///
/// The policy is decided once, by the code path that registers the node,
/// and never re-derived at free time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DeletePolicy {
    /// Never free. The node is borrowed from outside the ledger, or lives
    /// inside a parent's payload and is released together with it.
    Never,
    /// Detach the payload pointer, then free only the node's own
    /// allocation. Used for wrappers whose payload is shared with another
    /// node.
    Shallow,
    /// Free the node and, recursively, any payload it owns.
    #[default]
    Full,
}

impl DeletePolicy {
    /// Whether releasing a node under this policy calls the allocator at all.
    pub fn frees_node(self) -> bool {
        !matches!(self, Self::Never)
    }

    /// Whether releasing a node under this policy also frees its payload.
    pub fn frees_payload(self) -> bool {
        matches!(self, Self::Full)
    }
}

impl fmt::Display for DeletePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Never => "never",
            Self::Shallow => "shallow",
            Self::Full => "full",
        };
        f.write_str(name)
    }
}
