//! Legacy session records and the store that holds them.
//!
//! The previous app generation persisted one record per logged-in account:
//! its credentials plus the connection config they were issued against. The
//! store is read-only from Rust; retiring the underlying files is the
//! reclaimer's job, not the store's.

use thiserror::Error;

/// Errors that can occur while reading the legacy credential store
#[allow(clippy::module_name_repetitions)]
#[derive(Debug, Error, uniffi::Error)]
pub enum LegacyStoreError {
    /// The legacy store exists but could not be read
    #[error("legacy store could not be read: {message}")]
    ReadFailure {
        /// Detail reported by the native store implementation
        message: String,
    },
    /// Unexpected error in foreign callback
    #[error("unexpected error in foreign callback: {0}")]
    UnexpectedUniFFICallbackError(String),
}

impl From<uniffi::UnexpectedUniFFICallbackError> for LegacyStoreError {
    fn from(e: uniffi::UnexpectedUniFFICallbackError) -> Self {
        Self::UnexpectedUniFFICallbackError(e.reason)
    }
}

/// A certificate pin as the legacy schema stored it.
///
/// The hash-type tag was added late in the legacy schema's life, so older
/// records carry no tag at all.
#[derive(Debug, Clone, uniffi::Record)]
pub struct LegacyFingerprint {
    /// Digest of the pinned server certificate
    pub bytes: Vec<u8>,
    /// Hash algorithm tag, e.g. `"SHA-256"`; absent on old records
    pub hash_type: Option<String>,
}

/// Server-advertised discovery (well-known) info as the legacy schema stored it.
///
/// Legacy serialization did not always retain this field; its absence is
/// normal, not an error.
#[derive(Debug, Clone, uniffi::Record)]
pub struct LegacyDiscoveryInfo {
    /// Advertised home-server base URL
    pub home_server_base_url: Option<String>,
    /// Advertised identity-server base URL
    pub identity_server_base_url: Option<String>,
}

/// Immutable snapshot of one legacy account's credentials.
#[derive(Debug, Clone, uniffi::Record)]
pub struct LegacyCredentials {
    /// Fully qualified user identifier
    pub user_id: String,
    /// Access token issued to the legacy session
    pub access_token: String,
    /// Refresh token, when the home server issued one
    pub refresh_token: Option<String>,
    /// Home-server URL the session was created against
    pub home_server_url: String,
    /// Device identifier; blank or absent on very old sessions
    pub device_id: Option<String>,
    /// Discovery info, when the legacy record retained it
    pub discovery: Option<LegacyDiscoveryInfo>,
}

/// Connection configuration associated with exactly one [`LegacyCredentials`].
#[derive(Debug, Clone, uniffi::Record)]
pub struct LegacyConnectionConfig {
    /// Home-server URI
    pub home_server_uri: String,
    /// Identity-server URI, if one was configured
    pub identity_server_uri: Option<String>,
    /// Antivirus-server URI, if one was configured
    pub antivirus_server_uri: Option<String>,
    /// Certificate pin fingerprints
    pub fingerprints: Vec<LegacyFingerprint>,
    /// Accepted TLS protocol versions
    pub tls_versions: Vec<String>,
    /// Accepted TLS cipher suites
    pub tls_cipher_suites: Vec<String>,
    /// Whether certificate pinning is enforced
    pub should_pin: bool,
    /// Whether the accepted TLS versions are enforced rather than advisory
    pub force_usage_tls_versions: bool,
}

/// One stored legacy session: credentials plus their connection config.
#[derive(Debug, Clone, uniffi::Record)]
pub struct LegacySessionRecord {
    /// The account's credential snapshot
    pub credentials: LegacyCredentials,
    /// The connection config the credentials were issued against
    pub connection: LegacyConnectionConfig,
}

/// A trait implemented by the native app to expose the legacy credential
/// store.
///
/// The store is never mutated through this trait. Only the first returned
/// session is migrated; any others are left exactly as they are.
#[uniffi::export(with_foreign)]
pub trait LegacySessionStore: Send + Sync {
    /// Returns every stored legacy session, in insertion order.
    ///
    /// # Errors
    /// - `LegacyStoreError::ReadFailure` if the store cannot be read. This is
    ///   fatal to the whole migration run: without it the engine cannot know
    ///   whether there is anything to migrate.
    fn list_sessions(&self) -> Result<Vec<LegacySessionRecord>, LegacyStoreError>;
}
