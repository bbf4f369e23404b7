//! Filesystem abstraction backed by the native app.
//!
//! The migration engine only ever needs directory-level operations, and every
//! one of them is best-effort: implementations report success or failure and
//! never raise on a missing path. All paths are relative to the engine's root
//! directory.

/// Boolean success indicator for filesystem operations
pub type Success = bool;

/// Trait for device filesystem operations
///
/// This trait is implemented by native platform code (Swift/Kotlin) to provide
/// filesystem access. All paths are relative to the user data directory.
#[allow(clippy::module_name_repetitions)]
#[uniffi::export(with_foreign)]
pub trait DeviceFileSystem: Send + Sync {
    /// Checks whether a directory exists at the given path.
    fn directory_exists(&self, path: String) -> bool;

    /// Creates a directory at the given path, including missing parents.
    ///
    /// Returns `true` when the directory exists afterwards, whether or not it
    /// had to be created.
    fn create_directory(&self, path: String) -> Success;

    /// Recursively deletes the directory (or file) at the given path.
    ///
    /// A missing path counts as success. Returns `false` only when something
    /// that exists could not be removed, e.g. a locked file.
    fn delete_recursively(&self, path: String) -> Success;
}

// Re-export InMemoryFileSystem for tests
#[cfg(test)]
pub use tests::InMemoryFileSystem;
