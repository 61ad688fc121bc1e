pub mod error;

use std::path::PathBuf;

use airlink_core::BridgeConfig;
use tracing::debug;

use crate::models::bridge::{self, BridgeConfigSource};
use crate::util;
use crate::validation::{self, ConfigWarnings};
use error::ConfigLoadError;

pub const EVENT_QUEUE_CAPACITY_VAR: &str = "AIRLINK_EVENT_QUEUE_CAPACITY";
pub const SCAN_FRAGMENT_CAP_VAR: &str = "AIRLINK_SCAN_FRAGMENT_CAP";
pub const HANDSHAKE_TIMEOUT_VAR: &str = "AIRLINK_HANDSHAKE_TIMEOUT";
pub const DISPATCH_TASK_NAME_VAR: &str = "AIRLINK_DISPATCH_TASK_NAME";

#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
}

#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

#[derive(Debug)]
pub struct ConfigLoad {
    pub config: BridgeConfig,
    pub source: BridgeConfigSource,
    pub env_file_loaded: bool,
    pub warnings: ConfigWarnings,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    /// Loads `.env` (a missing file is not an error), resolves the base
    /// configuration, applies per-field environment overrides and runs the
    /// guard rails.
    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = self.load_env_file()?;

        let (mut config, source) = match &self.options.config_path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigLoadError::MissingConfig { path: path.clone() });
                }
                let config = bridge::load_from_file(path).map_err(ConfigLoadError::Bridge)?;
                (config, BridgeConfigSource::Explicit(path.clone()))
            }
            None => bridge::load_from_env().map_err(ConfigLoadError::Bridge)?,
        };
        debug!(?source, "resolved bridge configuration source");

        apply_env_overrides(&mut config)?;
        let warnings = validation::apply_guard_rails(&config)?;

        Ok(ConfigLoad {
            config,
            source,
            env_file_loaded,
            warnings,
        })
    }

    fn load_env_file(&self) -> Result<bool, ConfigLoadError> {
        let loaded = match &self.options.env_file {
            Some(path) => dotenvy::from_path(path).map(|_| true),
            None => dotenvy::dotenv().map(|_| true),
        };
        loaded.or_else(|err| match err {
            dotenvy::Error::Io(_) => Ok(false),
            _ => Err(err.into()),
        })
    }
}

/// Individual `AIRLINK_*` variables win over whatever the file said.
pub fn apply_env_overrides(config: &mut BridgeConfig) -> Result<(), ConfigLoadError> {
    if let Some(capacity) = util::parse_var::<usize>(EVENT_QUEUE_CAPACITY_VAR)? {
        config.event_queue_capacity = capacity;
    }
    if let Some(cap) = util::parse_var::<usize>(SCAN_FRAGMENT_CAP_VAR)? {
        config.scan_fragment_cap = cap;
    }
    if let Some(timeout) = util::parse_duration_var(HANDSHAKE_TIMEOUT_VAR)? {
        config.handshake_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
    }
    if let Some(name) = util::env_value(DISPATCH_TASK_NAME_VAR) {
        config.dispatch_task_name = name;
    }
    Ok(())
}
