//! Shared collaborator fakes for the integration tests.
//!
//! These implement the foreign traits exactly as a thin native layer would:
//! a flat path-set filesystem, namespaced preferences and a crypto database
//! engine whose encrypted copies appear as files in the fake filesystem.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use basalt::migration::{
    CryptoDatabaseEngine, CryptoDatabaseError, CryptoDatabaseHandle, KeyManager,
    KeyManagerError, LegacySessionRecord, LegacySessionStore, LegacyStoreError,
    NewSessionParams, SessionStore, SessionStoreError,
};
use basalt::primitives::filesystem::DeviceFileSystem;
use basalt::primitives::preferences::PreferenceStore;

/// Flat path-set filesystem; a directory implicitly contains every path it
/// prefixes. Individual paths can be locked to simulate undeletable files.
#[derive(Default)]
pub struct FakeFileSystem {
    paths: Mutex<HashSet<String>>,
    locked: Mutex<HashSet<String>>,
}

impl FakeFileSystem {
    pub fn seed(&self, path: &str) {
        self.paths.lock().unwrap().insert(path.to_string());
    }

    pub fn lock_path(&self, path: &str) {
        self.locked.lock().unwrap().insert(path.to_string());
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.lock().unwrap().contains(path)
    }

    pub fn entries_under(&self, dir: &str) -> Vec<String> {
        let prefix = format!("{dir}/");
        self.paths
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.starts_with(&prefix))
            .cloned()
            .collect()
    }
}

impl DeviceFileSystem for FakeFileSystem {
    fn directory_exists(&self, path: String) -> bool {
        let prefix = format!("{path}/");
        let paths = self.paths.lock().unwrap();
        paths.contains(&path) || paths.iter().any(|p| p.starts_with(&prefix))
    }

    fn create_directory(&self, path: String) -> bool {
        self.paths.lock().unwrap().insert(path);
        true
    }

    fn delete_recursively(&self, path: String) -> bool {
        let prefix = format!("{path}/");
        let locked = self.locked.lock().unwrap();
        let mut paths = self.paths.lock().unwrap();
        let targets: Vec<String> = paths
            .iter()
            .filter(|p| **p == path || p.starts_with(&prefix))
            .cloned()
            .collect();
        if targets.iter().any(|p| locked.contains(p)) {
            return false;
        }
        for target in targets {
            paths.remove(&target);
        }
        true
    }
}

#[derive(Default)]
pub struct FakePreferences {
    namespaces: Mutex<HashMap<String, HashMap<String, String>>>,
}

impl FakePreferences {
    pub fn seed(&self, namespace: &str, key: &str, value: &str) {
        self.namespaces
            .lock()
            .unwrap()
            .entry(namespace.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
    }

    pub fn entry_count(&self, namespace: &str) -> usize {
        self.namespaces
            .lock()
            .unwrap()
            .get(namespace)
            .map_or(0, HashMap::len)
    }
}

impl PreferenceStore for FakePreferences {
    fn clear_namespace(&self, namespace: String) -> bool {
        self.namespaces
            .lock()
            .unwrap()
            .insert(namespace, HashMap::new());
        true
    }
}

/// Legacy store serving a fixed list of records.
pub struct StaticLegacyStore {
    records: Vec<LegacySessionRecord>,
}

impl StaticLegacyStore {
    pub fn new(records: Vec<LegacySessionRecord>) -> Self {
        Self { records }
    }
}

impl LegacySessionStore for StaticLegacyStore {
    fn list_sessions(&self) -> Result<Vec<LegacySessionRecord>, LegacyStoreError> {
        Ok(self.records.clone())
    }
}

/// Session store capturing whatever the engine saves.
#[derive(Default)]
pub struct CapturingSessionStore {
    saved: Mutex<Vec<NewSessionParams>>,
}

impl CapturingSessionStore {
    pub fn saved(&self) -> Vec<NewSessionParams> {
        self.saved.lock().unwrap().clone()
    }
}

impl SessionStore for CapturingSessionStore {
    fn save(&self, params: NewSessionParams) -> Result<(), SessionStoreError> {
        self.saved.lock().unwrap().push(params);
        Ok(())
    }
}

/// Key manager handing out one fixed 32-byte key for every alias.
pub struct StaticKeyManager;

impl KeyManager for StaticKeyManager {
    fn encryption_key(&self, _alias: String) -> Result<Vec<u8>, KeyManagerError> {
        Ok(vec![0x42; 32])
    }
}

/// Crypto database engine whose copies show up as `migrated.db` files in the
/// fake filesystem.
pub struct FakeCryptoEngine {
    filesystem: Arc<FakeFileSystem>,
}

impl FakeCryptoEngine {
    pub fn new(filesystem: Arc<FakeFileSystem>) -> Self {
        Self { filesystem }
    }
}

struct FakeCryptoHandle {
    filesystem: Arc<FakeFileSystem>,
}

impl CryptoDatabaseEngine for FakeCryptoEngine {
    fn open(
        &self,
        path: String,
        _schema_version: u64,
    ) -> Result<Arc<dyn CryptoDatabaseHandle>, CryptoDatabaseError> {
        if !self.filesystem.directory_exists(path.clone()) {
            return Err(CryptoDatabaseError::OpenFailure {
                message: format!("no database at {path}"),
            });
        }
        Ok(Arc::new(FakeCryptoHandle {
            filesystem: self.filesystem.clone(),
        }))
    }
}

impl CryptoDatabaseHandle for FakeCryptoHandle {
    fn write_encrypted_copy(
        &self,
        destination: String,
        _key: Vec<u8>,
    ) -> Result<(), CryptoDatabaseError> {
        self.filesystem.seed(&format!("{destination}/migrated.db"));
        Ok(())
    }

    fn close(&self) {}
}
