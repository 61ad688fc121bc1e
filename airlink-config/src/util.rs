use std::str::FromStr;
use std::time::Duration;

use crate::loader::error::ConfigLoadError;

/// Reads an environment variable, treating blank values as unset.
pub fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
}

/// Parses an environment variable with `FromStr`, reporting the key on
/// failure.
pub fn parse_var<T>(name: &'static str) -> Result<Option<T>, ConfigLoadError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_value(name)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|err| ConfigLoadError::InvalidOverride {
                    key: name,
                    value: raw.clone(),
                    reason: err.to_string(),
                })
        })
        .transpose()
}

/// Parses a humantime duration (`250ms`, `5s`). A bare integer is taken as
/// milliseconds.
pub fn parse_duration(raw: &str) -> Result<Duration, humantime::DurationError> {
    match raw.parse::<u64>() {
        Ok(millis) => Ok(Duration::from_millis(millis)),
        Err(_) => humantime::parse_duration(raw),
    }
}

pub fn parse_duration_var(name: &'static str) -> Result<Option<Duration>, ConfigLoadError> {
    env_value(name)
        .map(|raw| {
            parse_duration(&raw).map_err(|err| ConfigLoadError::InvalidOverride {
                key: name,
                value: raw.clone(),
                reason: err.to_string(),
            })
        })
        .transpose()
}
