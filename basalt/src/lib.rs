#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    dead_code
)]

//! `basalt` is the foundational library which powers the Strata messenger's
//! session storage. It transcribes a previous app generation's persisted
//! identity, crypto-store and preference state into the current storage
//! format, then retires the legacy artifacts.

pub use basalt_macros::{basalt_error, basalt_export};

/// Introduces the one-shot legacy session migration engine that runs at
/// application startup, before any other component reads session state.
pub mod migration;

/// Introduces low level primitives shared across the library: logging,
/// filesystem access and preference storage, all backed by the native app.
pub mod primitives;

uniffi::setup_scaffolding!("basalt");
