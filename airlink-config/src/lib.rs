//! Configuration loading for airlink.
//!
//! Resolves a [`BridgeConfig`](airlink_core::BridgeConfig) from files, inline
//! JSON and per-field environment overrides, then runs guard rails over the
//! result. The `airlinkctl` binary is built on top of this crate.

pub mod loader;
pub mod models;
pub mod util;
pub mod validation;

pub use loader::{ConfigLoad, ConfigLoader, ConfigLoaderOptions, error::ConfigLoadError};
pub use models::bridge::BridgeConfigSource;
pub use validation::{ConfigGuardRailError, ConfigWarning, ConfigWarnings};
