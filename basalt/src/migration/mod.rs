//! One-shot migration of a previous app generation's persisted session state.
//!
//! The engine reads the single legacy account, persists it into the new
//! session store, relocates its encrypted crypto database and then retires
//! the superseded files and preferences. It runs once at startup, before any
//! other component reads session state; see [`MigrationEngine`].

mod crypto_store;
mod engine;
mod error;
mod legacy;
mod reclaim;
mod session;

pub use crypto_store::{
    session_directory_name, store_key, CryptoDatabaseEngine, CryptoDatabaseError,
    CryptoDatabaseHandle, KeyManager, KeyManagerError, LEGACY_CRYPTO_SCHEMA_VERSION,
};
pub use engine::{MigrationEngine, MigrationEnvironment, MigrationRunReport};
pub use error::{MigrationError, MigrationResult};
pub use legacy::{
    LegacyConnectionConfig, LegacyCredentials, LegacyDiscoveryInfo, LegacyFingerprint,
    LegacySessionRecord, LegacySessionStore, LegacyStoreError,
};
pub use session::{
    translate, ConnectionConfig, DiscoveryInfo, Fingerprint, FingerprintHashType,
    NewSessionParams, SessionCredentials, SessionStore, SessionStoreError,
};
