//! Preference schema — known keys and the individual-key resolver.
//!
//! Crash reports include a preference snapshot; keys marked `individual`
//! identify the installation or its owner and must never leave the machine.
//! The exclusion set is resolved from this table at query time rather than
//! hardcoded at the call sites that consume it.

use std::collections::HashSet;

/// Preference key: enable debug-level logging.
pub const DEBUG_LOGGING: &str = "debug_logging";
/// Preference key: start the monitor automatically at boot.
pub const AUTO_START_MONITOR: &str = "auto_start_monitor";
/// Preference key: stable per-installation identifier.
pub const DEVICE_ID: &str = "device_id";
/// Preference key: account name of the owning user.
pub const ACCOUNT_NAME: &str = "account_name";
/// Preference key: upload token for the owning account.
pub const ACCOUNT_TOKEN: &str = "account_token";

/// One known preference key and its reporting policy.
pub struct PrefDef {
    pub key: &'static str,
    /// Identifies the installation or user — excluded from crash reports.
    pub individual: bool,
}

/// All keys the host knows about. Unknown keys may still exist in the store
/// (written by the daemon); they are treated as non-individual.
pub const PREF_DEFS: &[PrefDef] = &[
    PrefDef {
        key: DEBUG_LOGGING,
        individual: false,
    },
    PrefDef {
        key: AUTO_START_MONITOR,
        individual: false,
    },
    PrefDef {
        key: DEVICE_ID,
        individual: true,
    },
    PrefDef {
        key: ACCOUNT_NAME,
        individual: true,
    },
    PrefDef {
        key: ACCOUNT_TOKEN,
        individual: true,
    },
];

/// Resolves the set of preference keys excluded from crash reports.
///
/// A trait seam so the crash reporter can take a test double.
pub trait KeyResolver: Send + Sync {
    fn resolve_individual_keys(&self) -> HashSet<String>;
}

/// Production resolver backed by [`PREF_DEFS`].
pub struct SchemaKeyResolver;

impl KeyResolver for SchemaKeyResolver {
    fn resolve_individual_keys(&self) -> HashSet<String> {
        PREF_DEFS
            .iter()
            .filter(|def| def.individual)
            .map(|def| def.key.to_string())
            .collect()
    }
}
