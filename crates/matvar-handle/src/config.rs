//! Ownership configuration parameters.

use matvar_core::DeletePolicy;

/// Configuration for a ledger.
///
/// Fixed when the ledger is created and shared by every handle aliasing
/// it. `import_matvar` and `duplicate_matvar` replace the main node but
/// keep the configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnershipConfig {
    /// Policy for the main node of a ledger built around an existing node.
    ///
    /// Default: [`DeletePolicy::Full`]. Imported and duplicated nodes are
    /// always owned in full regardless of this value.
    pub main_policy: DeletePolicy,

    /// Policy for nested nodes registered without an explicit policy.
    ///
    /// Default: [`DeletePolicy::Never`]. A field or cell handed out as a
    /// view normally lives inside its parent's payload and is released
    /// together with it.
    pub dependency_policy: DeletePolicy,

    /// Whether registration precondition violations also trip a
    /// `debug_assert!`.
    ///
    /// Default: `true`. Violations are returned as errors either way; set
    /// this to `false` where the calling layer is untrusted and a debug
    /// build must not abort.
    pub strict_registration: bool,
}

impl OwnershipConfig {
    /// Default main-node policy.
    pub const DEFAULT_MAIN_POLICY: DeletePolicy = DeletePolicy::Full;

    /// Default dependency policy.
    pub const DEFAULT_DEPENDENCY_POLICY: DeletePolicy = DeletePolicy::Never;

    /// Create the default configuration.
    pub fn new() -> Self {
        Self {
            main_policy: Self::DEFAULT_MAIN_POLICY,
            dependency_policy: Self::DEFAULT_DEPENDENCY_POLICY,
            strict_registration: true,
        }
    }

    /// A configuration whose ledgers never free their main node.
    pub fn borrowed() -> Self {
        Self {
            main_policy: DeletePolicy::Never,
            ..Self::new()
        }
    }

    /// Same configuration with registration assertions disabled.
    pub fn lenient(mut self) -> Self {
        self.strict_registration = false;
        self
    }
}

impl Default for OwnershipConfig {
    fn default() -> Self {
        Self::new()
    }
}
