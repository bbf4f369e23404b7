//! Best-effort reclamation of superseded legacy artifacts.
//!
//! Everything here is try-each-and-continue: a locked file or a failing
//! preference write must never stop the remaining items from being
//! attempted. Failures are collected into one step-level error so the run
//! report can name them, but siblings always run.

use crate::migration::crypto_store::store_key;
use crate::migration::engine::MigrationEnvironment;
use crate::migration::error::{MigrationError, MigrationResult};
use crate::migration::legacy::LegacyCredentials;

/// Legacy directories superseded by the new storage layout, relative to the
/// root directory. Message drafts are deliberately dropped, not migrated.
const LEGACY_DIRECTORIES: &[&str] = &[
    "legacy_file_store",
    "legacy_crypto",
    "legacy_crypto_backup",
    "message_drafts",
    "media_cache",
    "media_cache_v2",
    "media_cache_v3",
    "share_extension_scratch",
];

/// Legacy preference namespaces to clear. The default/unnamed namespace is
/// deliberately absent: legacy code paths may still read from it.
const LEGACY_PREFERENCE_NAMESPACES: &[&str] =
    &["login_storage", "push_registration", "integration_manager"];

/// Deletes the fixed set of legacy directories plus the per-user crypto
/// folder. Each deletion is attempted independently.
pub(crate) fn reclaim_files(
    env: &MigrationEnvironment,
    credentials: &LegacyCredentials,
) -> MigrationResult<()> {
    let mut failed: Vec<String> = Vec::new();

    let targets = LEGACY_DIRECTORIES
        .iter()
        .map(ToString::to_string)
        .chain(std::iter::once(store_key(&credentials.user_id)));

    for name in targets {
        let path = env.path(&name);
        if env.filesystem.delete_recursively(path.clone()) {
            crate::debug!("reclaim.deleted path={path}");
        } else {
            crate::warn!("reclaim.delete_failed path={path}");
            failed.push(name);
        }
    }

    if failed.is_empty() {
        Ok(())
    } else {
        Err(MigrationError::Reclaim {
            items: failed.join(", "),
        })
    }
}

/// Clears the fixed set of legacy preference namespaces. Each namespace is
/// attempted independently.
pub(crate) fn reclaim_preferences(env: &MigrationEnvironment) -> MigrationResult<()> {
    let mut failed: Vec<String> = Vec::new();

    for namespace in LEGACY_PREFERENCE_NAMESPACES {
        if env.preferences.clear_namespace((*namespace).to_string()) {
            crate::debug!("reclaim.cleared namespace={namespace}");
        } else {
            crate::warn!("reclaim.clear_failed namespace={namespace}");
            failed.push((*namespace).to_string());
        }
    }

    if failed.is_empty() {
        Ok(())
    } else {
        Err(MigrationError::Reclaim {
            items: failed.join(", "),
        })
    }
}
