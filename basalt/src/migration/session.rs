//! Target session schema and the translation from the legacy schema.
//!
//! [`translate`] is a pure function; persisting the result goes through the
//! foreign [`SessionStore`]. The field-mapping rules are mostly declarative:
//! direct copies, two defaulting rules (fingerprint hash type, `allow_http`)
//! and one construct-only-if-present rule (discovery info).

use thiserror::Error;

use crate::migration::legacy::{LegacyConnectionConfig, LegacyCredentials};

/// Errors that can occur while persisting a translated session
#[allow(clippy::module_name_repetitions)]
#[derive(Debug, Error, uniffi::Error)]
pub enum SessionStoreError {
    /// The store already holds a conflicting session
    #[error("session store already holds a conflicting session")]
    Conflict,
    /// The store failed to persist the session
    #[error("session store failure: {message}")]
    Storage {
        /// Detail reported by the native store implementation
        message: String,
    },
    /// Unexpected error in foreign callback
    #[error("unexpected error in foreign callback: {0}")]
    UnexpectedUniFFICallbackError(String),
}

impl From<uniffi::UnexpectedUniFFICallbackError> for SessionStoreError {
    fn from(e: uniffi::UnexpectedUniFFICallbackError) -> Self {
        Self::UnexpectedUniFFICallbackError(e.reason)
    }
}

/// Hash algorithm of a certificate pin fingerprint.
///
/// Closed set: the new schema refuses to carry free-form algorithm strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FingerprintHashType {
    /// SHA-1, the legacy default
    Sha1,
    /// SHA-256
    Sha256,
}

impl FingerprintHashType {
    /// Maps a legacy hash-type tag into the closed set.
    ///
    /// Unset or unrecognized tags map to SHA-1: every record old enough to
    /// miss the tag predates the SHA-256 pins.
    #[must_use]
    pub fn from_legacy_tag(tag: Option<&str>) -> Self {
        match tag {
            Some(t) if t.eq_ignore_ascii_case("sha-256") => Self::Sha256,
            _ => Self::Sha1,
        }
    }
}

/// A certificate pin in the new schema.
#[derive(Debug, Clone, uniffi::Record)]
pub struct Fingerprint {
    /// Digest of the pinned server certificate
    pub bytes: Vec<u8>,
    /// Hash algorithm of the digest
    pub hash_type: FingerprintHashType,
}

/// Server-advertised discovery info in the new schema.
#[derive(Debug, Clone, uniffi::Record)]
pub struct DiscoveryInfo {
    /// Advertised home-server base URL
    pub home_server_base_url: Option<String>,
    /// Advertised identity-server base URL
    pub identity_server_base_url: Option<String>,
}

/// Credentials of a session in the new schema.
#[derive(Debug, Clone, uniffi::Record)]
pub struct SessionCredentials {
    /// Fully qualified user identifier
    pub user_id: String,
    /// Access token
    pub access_token: String,
    /// Refresh token, when available
    pub refresh_token: Option<String>,
    /// Home-server URL
    pub home_server_url: String,
    /// Device identifier
    pub device_id: Option<String>,
    /// Discovery info; omitted entirely when the legacy record had none
    pub discovery: Option<DiscoveryInfo>,
}

/// Connection configuration of a session in the new schema.
#[derive(Debug, Clone, uniffi::Record)]
pub struct ConnectionConfig {
    /// Home-server URI
    pub home_server_uri: String,
    /// Identity-server URI
    pub identity_server_uri: Option<String>,
    /// Antivirus-server URI
    pub antivirus_server_uri: Option<String>,
    /// Certificate pin fingerprints
    pub fingerprints: Vec<Fingerprint>,
    /// Accepted TLS protocol versions
    pub tls_versions: Vec<String>,
    /// Accepted TLS cipher suites
    pub tls_cipher_suites: Vec<String>,
    /// Whether certificate pinning is enforced
    pub should_pin: bool,
    /// Whether the accepted TLS versions are enforced rather than advisory
    pub force_usage_tls_versions: bool,
    /// Whether plain HTTP is allowed. Always `false` for migrated sessions:
    /// the legacy schema had no equivalent signal.
    pub allow_http: bool,
}

/// Everything the new session store needs to persist one migrated session.
#[derive(Debug, Clone, uniffi::Record)]
pub struct NewSessionParams {
    /// Translated credentials
    pub credentials: SessionCredentials,
    /// Translated connection configuration
    pub connection: ConnectionConfig,
    /// Token validity flag, initialized `true` and revalidated later by the
    /// session lifecycle, outside this engine
    pub is_token_valid: bool,
}

/// A trait implemented by the native app to persist migrated sessions into
/// the new session store.
#[uniffi::export(with_foreign)]
pub trait SessionStore: Send + Sync {
    /// Persists a translated session.
    ///
    /// # Errors
    /// - `SessionStoreError::Conflict` if the store already holds a session
    ///   for this account
    /// - `SessionStoreError::Storage` for any other persistence failure
    fn save(&self, params: NewSessionParams) -> Result<(), SessionStoreError>;
}

/// Maps one legacy session onto the new schema.
#[must_use]
pub fn translate(
    credentials: &LegacyCredentials,
    connection: &LegacyConnectionConfig,
) -> NewSessionParams {
    NewSessionParams {
        credentials: SessionCredentials {
            user_id: credentials.user_id.clone(),
            access_token: credentials.access_token.clone(),
            refresh_token: credentials.refresh_token.clone(),
            home_server_url: credentials.home_server_url.clone(),
            device_id: credentials.device_id.clone(),
            discovery: translate_discovery(credentials),
        },
        connection: ConnectionConfig {
            home_server_uri: connection.home_server_uri.clone(),
            identity_server_uri: connection.identity_server_uri.clone(),
            antivirus_server_uri: connection.antivirus_server_uri.clone(),
            fingerprints: connection
                .fingerprints
                .iter()
                .map(|fp| Fingerprint {
                    bytes: fp.bytes.clone(),
                    hash_type: FingerprintHashType::from_legacy_tag(
                        fp.hash_type.as_deref(),
                    ),
                })
                .collect(),
            tls_versions: connection.tls_versions.clone(),
            tls_cipher_suites: connection.tls_cipher_suites.clone(),
            should_pin: connection.should_pin,
            force_usage_tls_versions: connection.force_usage_tls_versions,
            allow_http: false,
        },
        is_token_valid: true,
    }
}

/// Builds discovery info only when the legacy record advertises at least one
/// non-empty base URL. A record without usable discovery gets none at all,
/// never an empty placeholder.
fn translate_discovery(credentials: &LegacyCredentials) -> Option<DiscoveryInfo> {
    let legacy = credentials.discovery.as_ref()?;
    let home = non_empty(legacy.home_server_base_url.as_deref());
    let identity = non_empty(legacy.identity_server_base_url.as_deref());
    if home.is_none() && identity.is_none() {
        return None;
    }
    Some(DiscoveryInfo {
        home_server_base_url: home,
        identity_server_base_url: identity,
    })
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}
