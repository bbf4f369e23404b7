/// Errors that can occur during a migration run.
///
/// Only two of these ever reach the caller of
/// [`MigrationEngine::run`](crate::migration::MigrationEngine::run):
/// `InvalidOperation` (a second run started while one is in progress) and
/// `LegacyStore` (the reader failed, so nothing is known). Every other
/// variant is caught at its step boundary, recorded in the run report and
/// logged.
#[crate::basalt_error]
pub enum MigrationError {
    /// An invalid operation was attempted
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// The legacy credential store could not be read
    #[error(transparent)]
    LegacyStore(#[from] crate::migration::legacy::LegacyStoreError),

    /// The new session store rejected the translated session
    #[error(transparent)]
    SessionStore(#[from] crate::migration::session::SessionStoreError),

    /// The key manager could not supply the store encryption key
    #[error(transparent)]
    KeyManager(#[from] crate::migration::crypto_store::KeyManagerError),

    /// The encrypted crypto database could not be opened or copied
    #[error(transparent)]
    CryptoDatabase(#[from] crate::migration::crypto_store::CryptoDatabaseError),

    /// A filesystem-level failure while relocating the crypto store
    #[error("Crypto store migration failed: {message}")]
    CryptoMigration {
        /// What could not be done, and where
        message: String,
    },

    /// One or more legacy artifacts could not be reclaimed
    #[error("Reclaim failed for: {items}")]
    Reclaim {
        /// Comma-separated names of the items that failed
        items: String,
    },
}

/// Result type for migration operations
pub type MigrationResult<T> = std::result::Result<T, MigrationError>;
