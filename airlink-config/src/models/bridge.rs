//! Reading [`BridgeConfig`] from its possible sources.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use airlink_core::BridgeConfig;
use anyhow::{Context, anyhow};

pub const CONFIG_PATH_VAR: &str = "AIRLINK_CONFIG_PATH";
pub const CONFIG_JSON_VAR: &str = "AIRLINK_CONFIG_JSON";

const DEFAULT_LOCATIONS: &[&str] = &[
    "airlink.toml",
    "airlink.json",
    "config/airlink.toml",
    "config/airlink.json",
];

/// Where the bridge configuration came from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BridgeConfigSource {
    #[default]
    Default,
    Explicit(PathBuf),
    EnvPath(PathBuf),
    EnvInline,
    File(PathBuf),
}

impl BridgeConfigSource {
    pub fn path(&self) -> Option<&Path> {
        match self {
            BridgeConfigSource::Explicit(path)
            | BridgeConfigSource::EnvPath(path)
            | BridgeConfigSource::File(path) => Some(path),
            BridgeConfigSource::Default | BridgeConfigSource::EnvInline => None,
        }
    }
}

/// Evaluation order:
/// 1) `$AIRLINK_CONFIG_PATH` (TOML or JSON file),
/// 2) `$AIRLINK_CONFIG_JSON` (inline JSON),
/// 3) the first of the default locations that exists,
/// 4) built-in defaults.
pub fn load_from_env() -> anyhow::Result<(BridgeConfig, BridgeConfigSource)> {
    if let Ok(path_str) = env::var(CONFIG_PATH_VAR)
        && !path_str.trim().is_empty()
    {
        let path = PathBuf::from(path_str);
        let config = load_from_file(&path)?;
        return Ok((config, BridgeConfigSource::EnvPath(path)));
    }

    if let Ok(raw) = env::var(CONFIG_JSON_VAR)
        && !raw.trim().is_empty()
    {
        let parsed = parse_json(&raw).context("failed to parse AIRLINK_CONFIG_JSON")?;
        return Ok((parsed, BridgeConfigSource::EnvInline));
    }

    if let Some(path) = find_default_file() {
        let config = load_from_file(&path)?;
        return Ok((config, BridgeConfigSource::File(path)));
    }

    Ok((BridgeConfig::default(), BridgeConfigSource::Default))
}

pub fn load_from_file(path: &Path) -> anyhow::Result<BridgeConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read bridge config from {}", path.display()))?;

    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => {
            parse_json(&contents).with_context(|| format!("invalid bridge config {}", path.display()))
        }
        Some("toml") => toml::from_str(&contents)
            .map_err(|err| anyhow!("invalid bridge config {}: {}", path.display(), err)),
        _ => parse_from_str(&contents, &path.display().to_string()),
    }
}

/// Tries TOML first, then JSON.
pub fn parse_from_str(contents: &str, origin: &str) -> anyhow::Result<BridgeConfig> {
    toml::from_str(contents).or_else(|toml_err| {
        serde_json::from_str(contents).map_err(|json_err| {
            anyhow!(
                "failed to parse bridge config {}: toml error: {}; json error: {}",
                origin,
                toml_err,
                json_err
            )
        })
    })
}

pub fn parse_json(raw: &str) -> anyhow::Result<BridgeConfig> {
    serde_json::from_str(raw).map_err(|err| anyhow!("invalid bridge config json: {err}"))
}

pub fn find_default_file() -> Option<PathBuf> {
    DEFAULT_LOCATIONS
        .iter()
        .map(Path::new)
        .find(|path| path.exists())
        .map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_without_extension_is_detected() {
        let config = parse_from_str("scan_fragment_cap = 8\n", "inline").expect("toml");
        assert_eq!(config.scan_fragment_cap, 8);
        assert_eq!(
            config.event_queue_capacity,
            BridgeConfig::DEFAULT_QUEUE_CAPACITY
        );
    }

    #[test]
    fn json_is_accepted_as_fallback() {
        let config =
            parse_from_str(r#"{"dispatch_task_name":"radio0"}"#, "inline").expect("json");
        assert_eq!(config.dispatch_task_name, "radio0");
    }

    #[test]
    fn garbage_reports_both_parsers() {
        let err = parse_from_str("{{ nope", "inline").unwrap_err().to_string();
        assert!(err.contains("toml error"));
        assert!(err.contains("json error"));
    }
}
