//! Namespaced preference storage backed by the native app.
//!
//! Android backs this with `SharedPreferences` files, iOS with `UserDefaults`
//! suites. A namespace groups related entries (e.g. login storage) and can be
//! wiped as a unit. This is explicitly **not a secure store** and carries no
//! integrity guarantees.

use super::filesystem::Success;

/// A trait implemented by the native app to expose namespaced preference
/// storage.
///
/// The migration engine only ever clears whole namespaces; it never reads or
/// writes individual entries. The default/unnamed namespace must never be
/// passed here — legacy code paths may still read from it.
#[uniffi::export(with_foreign)]
pub trait PreferenceStore: Send + Sync {
    /// Replaces the given namespace with an empty set of entries.
    ///
    /// Best-effort: a namespace that does not exist counts as success.
    fn clear_namespace(&self, namespace: String) -> Success;
}

// Re-export InMemoryPreferenceStore for tests
#[cfg(test)]
pub use tests::InMemoryPreferenceStore;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    /// **This is intended exclusively for testing.**
    #[derive(Debug, Default)]
    pub struct InMemoryPreferenceStore {
        namespaces: Mutex<HashMap<String, HashMap<String, String>>>,
        failing: Mutex<HashSet<String>>,
    }

    #[allow(clippy::missing_panics_doc)]
    impl InMemoryPreferenceStore {
        /// Creates a new empty in-memory preference store
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Seeds a namespace with a single entry.
        pub fn seed(&self, namespace: &str, key: &str, value: &str) {
            self.namespaces
                .lock()
                .unwrap()
                .entry(namespace.to_string())
                .or_default()
                .insert(key.to_string(), value.to_string());
        }

        /// Makes `clear_namespace` fail for the given namespace.
        pub fn fail_namespace(&self, namespace: &str) {
            self.failing.lock().unwrap().insert(namespace.to_string());
        }

        /// Number of entries currently stored in a namespace.
        #[must_use]
        pub fn entry_count(&self, namespace: &str) -> usize {
            self.namespaces
                .lock()
                .unwrap()
                .get(namespace)
                .map_or(0, HashMap::len)
        }
    }

    impl PreferenceStore for InMemoryPreferenceStore {
        fn clear_namespace(&self, namespace: String) -> Success {
            if self.failing.lock().unwrap().contains(&namespace) {
                return false;
            }
            self.namespaces
                .lock()
                .unwrap()
                .insert(namespace, HashMap::new());
            true
        }
    }

    #[test]
    fn test_clear_namespace_empties_entries() {
        let store = InMemoryPreferenceStore::new();
        store.seed("login_storage", "token", "abc");
        assert_eq!(store.entry_count("login_storage"), 1);

        assert!(store.clear_namespace("login_storage".to_string()));
        assert_eq!(store.entry_count("login_storage"), 0);
    }

    #[test]
    fn test_clearing_missing_namespace_is_success() {
        let store = InMemoryPreferenceStore::new();
        assert!(store.clear_namespace("never_written".to_string()));
    }

    #[test]
    fn test_failure_injection() {
        let store = InMemoryPreferenceStore::new();
        store.seed("push_registration", "endpoint", "https://push.example");
        store.fail_namespace("push_registration");

        assert!(!store.clear_namespace("push_registration".to_string()));
        assert_eq!(store.entry_count("push_registration"), 1);
    }
}
