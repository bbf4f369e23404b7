use std::sync::{Arc, Mutex};

use chrono::Utc;
use once_cell::sync::Lazy;
use serde::Serialize;

use crate::migration::crypto_store::{migrate_crypto_store, CryptoDatabaseEngine, KeyManager};
use crate::migration::error::{MigrationError, MigrationResult};
use crate::migration::legacy::{LegacySessionRecord, LegacySessionStore};
use crate::migration::reclaim::{reclaim_files, reclaim_preferences};
use crate::migration::session::{translate, SessionStore};
use crate::primitives::filesystem::DeviceFileSystem;
use crate::primitives::preferences::PreferenceStore;

/// Global lock preventing concurrent migration runs across all engine
/// instances in the process. The run executes exactly once at application
/// startup; a second caller fails fast instead of waiting.
static RUN_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

/// Everything the engine needs from its surroundings, made explicit instead
/// of reaching into ambient application state.
pub struct MigrationEnvironment {
    /// Root directory all store paths are resolved against
    pub root_directory: String,
    /// Read-only legacy credential store
    pub legacy_store: Arc<dyn LegacySessionStore>,
    /// New session store the translated session is persisted into
    pub session_store: Arc<dyn SessionStore>,
    /// Platform keystore supplying the new store's encryption key
    pub key_manager: Arc<dyn KeyManager>,
    /// Engine for opening and copying the legacy encrypted database
    pub crypto_database: Arc<dyn CryptoDatabaseEngine>,
    /// Device filesystem, for directory-level operations
    pub filesystem: Arc<dyn DeviceFileSystem>,
    /// Namespaced preference storage
    pub preferences: Arc<dyn PreferenceStore>,
}

impl MigrationEnvironment {
    /// Resolves a store-relative name against the root directory.
    pub(crate) fn path(&self, name: &str) -> String {
        format!("{}/{name}", self.root_directory.trim_end_matches('/'))
    }
}

/// Outcome of one migration run, aggregated across all steps.
///
/// Serialized to JSON and emitted as a single structured log record at the
/// end of the run; also returned to the caller, who typically only checks
/// that the run completed.
#[derive(Debug, Default, Clone, Serialize, uniffi::Record)]
pub struct MigrationRunReport {
    /// Whether a legacy session was found. `false` means the whole run was a
    /// no-op with zero side effects.
    pub legacy_session_found: bool,
    /// Number of steps attempted (always 4 when a session was found)
    pub steps_attempted: i32,
    /// Number of steps that succeeded
    pub steps_succeeded: i32,
    /// Number of steps that failed
    pub steps_failed: i32,
    /// One `"step: reason"` entry per failed step
    pub failures: Vec<String>,
}

/// One-shot engine migrating a single legacy session into the new storage
/// format and retiring the legacy artifacts.
///
/// The run is a strictly forward state machine over four steps — credential
/// translation, crypto store relocation, file reclamation, preference
/// reclamation — preceded by the legacy store read that decides whether there
/// is anything to do. Each step is attempted exactly once; a step's failure
/// is caught, recorded and never stops the steps after it. Only a legacy
/// store read failure aborts the run, because without the read nothing is
/// known.
///
/// ## Platform Usage (Swift/Kotlin)
///
/// ```swift
/// let engine = MigrationEngine(
///     rootDirectory: appFilesDirectory,
///     legacyStore: legacyStore,
///     sessionStore: sessionStore,
///     keyManager: keyManager,
///     cryptoDatabase: cryptoDatabase,
///     filesystem: filesystem,
///     preferences: preferences
/// )
/// let report = try engine.run()
/// ```
#[derive(uniffi::Object)]
pub struct MigrationEngine {
    env: MigrationEnvironment,
}

#[crate::basalt_export]
impl MigrationEngine {
    /// Creates an engine bound to its collaborators.
    #[uniffi::constructor]
    #[allow(clippy::too_many_arguments, clippy::needless_pass_by_value)]
    pub fn new(
        root_directory: String,
        legacy_store: Arc<dyn LegacySessionStore>,
        session_store: Arc<dyn SessionStore>,
        key_manager: Arc<dyn KeyManager>,
        crypto_database: Arc<dyn CryptoDatabaseEngine>,
        filesystem: Arc<dyn DeviceFileSystem>,
        preferences: Arc<dyn PreferenceStore>,
    ) -> Arc<Self> {
        Arc::new(Self {
            env: MigrationEnvironment {
                root_directory,
                legacy_store,
                session_store,
                key_manager,
                crypto_database,
                filesystem,
                preferences,
            },
        })
    }

    /// Runs the migration to completion.
    ///
    /// Expected to be invoked once, at application startup, before any other
    /// component reads session state. No cancellation once started.
    ///
    /// # Errors
    ///
    /// - `MigrationError::InvalidOperation` if another run is already in
    ///   progress
    /// - `MigrationError::LegacyStore` if the legacy store could not be read
    ///
    /// Step failures do **not** surface here; they are recorded in the
    /// returned [`MigrationRunReport`].
    pub fn run(&self) -> MigrationResult<MigrationRunReport> {
        let _guard = RUN_LOCK.try_lock().map_err(|_| {
            MigrationError::InvalidOperation(
                "Migration is already in progress.".to_string(),
            )
        })?;

        let run_start = Utc::now();
        crate::info!(
            "migration_run.started timestamp={}",
            run_start.to_rfc3339()
        );

        let Some(record) = self.first_legacy_session()? else {
            crate::info!(
                "migration_run.no_op reason=no_legacy_session timestamp={}",
                Utc::now().to_rfc3339()
            );
            return Ok(MigrationRunReport::default());
        };

        let mut report = MigrationRunReport {
            legacy_session_found: true,
            ..MigrationRunReport::default()
        };
        let LegacySessionRecord {
            credentials,
            connection,
        } = record;

        self.run_step("credentials", &mut report, || {
            let params = translate(&credentials, &connection);
            self.env.session_store.save(params)?;
            Ok(())
        });
        self.run_step("crypto_store", &mut report, || {
            migrate_crypto_store(&self.env, &credentials)
        });
        self.run_step("reclaim_files", &mut report, || {
            reclaim_files(&self.env, &credentials)
        });
        self.run_step("reclaim_preferences", &mut report, || {
            reclaim_preferences(&self.env)
        });

        let duration_ms = (Utc::now() - run_start).num_milliseconds();
        match serde_json::to_string(&report) {
            Ok(json) => crate::info!(
                "migration_run.completed duration_ms={duration_ms} report={json}"
            ),
            Err(e) => crate::warn!(
                "migration_run.completed duration_ms={duration_ms} report_unserializable error={e}"
            ),
        }

        Ok(report)
    }
}

impl MigrationEngine {
    /// Loads the first stored legacy session, if any.
    ///
    /// Sibling sessions beyond the first are neither migrated nor reclaimed;
    /// their artifacts stay on disk untouched. First-only selection is
    /// preserved from the legacy behavior (see the design review note).
    fn first_legacy_session(&self) -> MigrationResult<Option<LegacySessionRecord>> {
        let mut sessions = self.env.legacy_store.list_sessions()?;
        if sessions.len() > 1 {
            crate::warn!(
                "migration_run.sibling_sessions_ignored count={}",
                sessions.len() - 1
            );
        }
        if sessions.is_empty() {
            Ok(None)
        } else {
            Ok(Some(sessions.remove(0)))
        }
    }

    /// Runs one step through the catch-all barrier: the outcome is recorded
    /// and logged, never propagated.
    fn run_step<F>(&self, id: &str, report: &mut MigrationRunReport, step: F)
    where
        F: FnOnce() -> MigrationResult<()>,
    {
        report.steps_attempted += 1;
        let step_start = Utc::now();

        match step() {
            Ok(()) => {
                report.steps_succeeded += 1;
                crate::info!(
                    "migration_step.succeeded id={} duration_ms={} timestamp={}",
                    id,
                    (Utc::now() - step_start).num_milliseconds(),
                    Utc::now().to_rfc3339()
                );
            }
            Err(e) => {
                report.steps_failed += 1;
                crate::warn!(
                    "migration_step.failed id={} duration_ms={} error={} timestamp={}",
                    id,
                    (Utc::now() - step_start).num_milliseconds(),
                    e,
                    Utc::now().to_rfc3339()
                );
                report.failures.push(format!("{id}: {e}"));
            }
        }
    }
}
