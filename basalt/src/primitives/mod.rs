/// Filesystem access provided by the native app (Swift/Kotlin).
pub mod filesystem;

/// Logging bridge that forwards to a native `Logger` implementation.
pub mod logger;

/// Namespaced preference storage provided by the native app.
pub mod preferences;
