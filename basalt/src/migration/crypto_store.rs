//! Relocation and re-encryption of the legacy crypto store.
//!
//! Store directories are content-addressed: the directory name is a stable
//! hash of the account identity, so the same account always maps to the same
//! location. The hash is not security-critical, it only has to be stable and
//! collision-resistant enough to serve as a directory name.
//!
//! The legacy store lives at `<root>/<store_key(user_id)>`; the new store at
//! `<root>/sessions/<session_directory_name(user_id, device_id)>`. The two
//! parents are distinct so a session with a blank device id (whose directory
//! name equals the legacy one) can never collide with the store it is being
//! copied from.

use thiserror::Error;

use crate::migration::engine::MigrationEnvironment;
use crate::migration::error::{MigrationError, MigrationResult};
use crate::migration::legacy::LegacyCredentials;

/// Schema version of the legacy encrypted database. The database engine is
/// expected to upgrade older on-disk schemas in place when opening.
pub const LEGACY_CRYPTO_SCHEMA_VERSION: u64 = 7;

/// Parent directory of the new, per-session crypto stores.
pub(crate) const SESSION_STORE_PARENT: &str = "sessions";

/// Separator between user id and device id in the session directory key.
const DIRECTORY_KEY_SEPARATOR: char = '|';

/// Errors that can occur while obtaining a store encryption key
#[allow(clippy::module_name_repetitions)]
#[derive(Debug, Error, uniffi::Error)]
pub enum KeyManagerError {
    /// No key could be supplied for the requested alias
    #[error("no encryption key available for alias {alias}")]
    KeyUnavailable {
        /// The alias that was requested
        alias: String,
    },
    /// Unexpected error in foreign callback
    #[error("unexpected error in foreign callback: {0}")]
    UnexpectedUniFFICallbackError(String),
}

impl From<uniffi::UnexpectedUniFFICallbackError> for KeyManagerError {
    fn from(e: uniffi::UnexpectedUniFFICallbackError) -> Self {
        Self::UnexpectedUniFFICallbackError(e.reason)
    }
}

/// A trait implemented by the native app's key management layer.
///
/// Key material is owned by the platform keystore and addressed by alias; the
/// engine never persists or derives keys itself.
#[uniffi::export(with_foreign)]
pub trait KeyManager: Send + Sync {
    /// Returns (creating if necessary) the encryption key for the given alias.
    ///
    /// # Errors
    /// - `KeyManagerError::KeyUnavailable` if the keystore cannot supply one
    fn encryption_key(&self, alias: String) -> Result<Vec<u8>, KeyManagerError>;
}

/// Errors that can occur while operating on the encrypted crypto database
#[allow(clippy::module_name_repetitions)]
#[derive(Debug, Error, uniffi::Error)]
pub enum CryptoDatabaseError {
    /// The database could not be opened
    #[error("crypto database could not be opened: {message}")]
    OpenFailure {
        /// Detail reported by the database engine
        message: String,
    },
    /// The encrypted copy could not be written
    #[error("encrypted copy failed: {message}")]
    CopyFailure {
        /// Detail reported by the database engine
        message: String,
    },
    /// Unexpected error in foreign callback
    #[error("unexpected error in foreign callback: {0}")]
    UnexpectedUniFFICallbackError(String),
}

impl From<uniffi::UnexpectedUniFFICallbackError> for CryptoDatabaseError {
    fn from(e: uniffi::UnexpectedUniFFICallbackError) -> Self {
        Self::UnexpectedUniFFICallbackError(e.reason)
    }
}

/// A trait implemented by the native app to open legacy encrypted databases.
#[uniffi::export(with_foreign)]
pub trait CryptoDatabaseEngine: Send + Sync {
    /// Opens the database at `path`, upgrading its on-disk schema in place to
    /// `schema_version` if an older version is found. Read-only otherwise.
    ///
    /// # Errors
    /// - `CryptoDatabaseError::OpenFailure` on corruption, schema mismatch or I/O failure
    fn open(
        &self,
        path: String,
        schema_version: u64,
    ) -> Result<std::sync::Arc<dyn CryptoDatabaseHandle>, CryptoDatabaseError>;
}

/// An open handle onto a legacy encrypted database.
#[uniffi::export(with_foreign)]
pub trait CryptoDatabaseHandle: Send + Sync {
    /// Writes a copy of the open database into `destination`, encrypted under
    /// `key`.
    ///
    /// # Errors
    /// - `CryptoDatabaseError::CopyFailure` if the copy cannot be written
    fn write_encrypted_copy(
        &self,
        destination: String,
        key: Vec<u8>,
    ) -> Result<(), CryptoDatabaseError>;

    /// Releases the handle. Idempotent.
    fn close(&self);
}

/// Scoped ownership of an open [`CryptoDatabaseHandle`].
///
/// The handle is released on drop, so it cannot leak on any exit path of the
/// migration step.
struct OpenCryptoDatabase {
    handle: std::sync::Arc<dyn CryptoDatabaseHandle>,
}

impl OpenCryptoDatabase {
    fn open(
        engine: &dyn CryptoDatabaseEngine,
        path: &str,
        schema_version: u64,
    ) -> Result<Self, CryptoDatabaseError> {
        let handle = engine.open(path.to_string(), schema_version)?;
        Ok(Self { handle })
    }

    fn write_encrypted_copy(
        &self,
        destination: &str,
        key: Vec<u8>,
    ) -> Result<(), CryptoDatabaseError> {
        self.handle.write_encrypted_copy(destination.to_string(), key)
    }
}

impl Drop for OpenCryptoDatabase {
    fn drop(&mut self) {
        self.handle.close();
    }
}

/// Stable content-derived key for store directories and key aliases.
#[must_use]
pub fn store_key(input: &str) -> String {
    hex::encode(blake3::hash(input.as_bytes()).as_bytes())
}

/// Directory name of the new per-session crypto store.
///
/// Equals `store_key(user_id)` when the device id is blank or absent, else
/// `store_key(user_id + separator + device_id)`.
#[must_use]
pub fn session_directory_name(user_id: &str, device_id: Option<&str>) -> String {
    match device_id {
        Some(device) if !device.trim().is_empty() => {
            store_key(&format!("{user_id}{DIRECTORY_KEY_SEPARATOR}{device}"))
        }
        _ => store_key(user_id),
    }
}

/// Relocates the legacy crypto store into the new per-session location,
/// re-encrypted under a key from the key manager.
///
/// The destination is deleted and recreated empty first, so a partial copy
/// left by a previously interrupted run can never merge with this one.
pub(crate) fn migrate_crypto_store(
    env: &MigrationEnvironment,
    credentials: &LegacyCredentials,
) -> MigrationResult<()> {
    let user_key = store_key(&credentials.user_id);
    let legacy_dir = env.path(&user_key);
    let session_id =
        session_directory_name(&credentials.user_id, credentials.device_id.as_deref());
    let new_dir = env.path(&format!("{SESSION_STORE_PARENT}/{session_id}"));

    crate::info!("crypto_store.migrating from={legacy_dir} to={new_dir}");

    // Idempotency guard: discard whatever a previously interrupted run left.
    if !env.filesystem.delete_recursively(new_dir.clone()) {
        return Err(MigrationError::CryptoMigration {
            message: format!("could not clear session store directory {new_dir}"),
        });
    }
    if !env.filesystem.create_directory(new_dir.clone()) {
        return Err(MigrationError::CryptoMigration {
            message: format!("could not create session store directory {new_dir}"),
        });
    }

    let key = env.key_manager.encryption_key(user_key)?;

    let database = OpenCryptoDatabase::open(
        env.crypto_database.as_ref(),
        &legacy_dir,
        LEGACY_CRYPTO_SCHEMA_VERSION,
    )?;
    database.write_encrypted_copy(&new_dir, key)?;

    crate::info!("crypto_store.migrated to={new_dir}");
    Ok(())
    // `database` dropped here (or on any early return above once opened),
    // releasing the handle.
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::test_support::{
        sample_credentials, test_environment, MockCryptoEngine, TestCollaborators,
    };

    #[test]
    fn test_session_directory_name_blank_device_falls_back_to_user_key() {
        assert_eq!(session_directory_name("u1", None), store_key("u1"));
        assert_eq!(session_directory_name("u1", Some("")), store_key("u1"));
        assert_eq!(session_directory_name("u1", Some("   ")), store_key("u1"));
    }

    #[test]
    fn test_session_directory_name_includes_device() {
        let with_device = session_directory_name("u1", Some("d1"));
        assert_eq!(with_device, store_key("u1|d1"));
        assert_ne!(with_device, store_key("u1"));
    }

    #[test]
    fn test_store_key_is_stable_and_hex() {
        let key = store_key("@alice:strata.chat");
        assert_eq!(key, store_key("@alice:strata.chat"));
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_migrate_writes_into_fresh_directory() {
        let collaborators = TestCollaborators::new();
        let env = test_environment(&collaborators);
        let credentials = sample_credentials();

        migrate_crypto_store(&env, &credentials).expect("migration succeeds");

        let new_dir = format!(
            "files/sessions/{}",
            session_directory_name("@alice:strata.chat", Some("DEVICEID"))
        );
        assert_eq!(
            collaborators.filesystem.entries_under(&new_dir),
            vec![format!("{new_dir}/copy-1.db")]
        );
        assert_eq!(collaborators.crypto_engine.close_count(), 1);
    }

    #[test]
    fn test_second_run_replaces_partial_first_run() {
        let collaborators = TestCollaborators::new();
        let env = test_environment(&collaborators);
        let credentials = sample_credentials();
        let new_dir = format!(
            "files/sessions/{}",
            session_directory_name("@alice:strata.chat", Some("DEVICEID"))
        );

        // Simulate an interrupted prior run leaving a partial copy behind.
        collaborators
            .filesystem
            .seed(&format!("{new_dir}/partial.db"));

        migrate_crypto_store(&env, &credentials).expect("first run");
        migrate_crypto_store(&env, &credentials).expect("second run");

        // Only the second run's output survives, never a merge.
        assert_eq!(
            collaborators.filesystem.entries_under(&new_dir),
            vec![format!("{new_dir}/copy-2.db")]
        );
    }

    #[test]
    fn test_handle_released_when_copy_fails() {
        let collaborators =
            TestCollaborators::with_crypto_engine(MockCryptoEngine::failing_copy());
        let env = test_environment(&collaborators);

        let result = migrate_crypto_store(&env, &sample_credentials());

        assert!(matches!(result, Err(MigrationError::CryptoDatabase(_))));
        assert_eq!(collaborators.crypto_engine.close_count(), 1);
    }

    #[test]
    fn test_key_denied_surfaces_and_leaves_database_untouched() {
        let collaborators = TestCollaborators::new();
        collaborators.key_manager.deny();
        let env = test_environment(&collaborators);

        let result = migrate_crypto_store(&env, &sample_credentials());

        assert!(matches!(result, Err(MigrationError::KeyManager(_))));
        // The database was never opened, so there is nothing to close.
        assert_eq!(collaborators.crypto_engine.close_count(), 0);
    }
}
