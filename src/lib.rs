//! VerseKeeper library
//!
//! Exposes the configuration layer and the runtime wiring for
//! integration testing.

pub mod config;
pub mod runtime;

pub use config::KeeperConfig;
pub use runtime::AutosaveRuntime;
