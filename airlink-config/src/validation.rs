use airlink_core::BridgeConfig;
use thiserror::Error;

/// Handshake timeouts below this tend to fail on loaded hosts.
const MIN_COMFORTABLE_TIMEOUT_MS: u64 = 100;
const LARGE_SCAN_CAP: usize = 256;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigGuardRailError {
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
    #[error("dispatch task name must not be blank")]
    BlankTaskName,
}

#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push<S: Into<String>>(&mut self, message: S) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    pub fn push_with_hint<S: Into<String>, H: Into<String>>(&mut self, message: S, hint: H) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

pub fn apply_guard_rails(config: &BridgeConfig) -> Result<ConfigWarnings, ConfigGuardRailError> {
    let mut warnings = ConfigWarnings::default();

    for (field, value) in [
        ("event_queue_capacity", config.event_queue_capacity as u64),
        ("scan_fragment_cap", config.scan_fragment_cap as u64),
        ("handshake_timeout_ms", config.handshake_timeout_ms),
    ] {
        if value == 0 {
            return Err(ConfigGuardRailError::Zero { field });
        }
    }
    if config.dispatch_task_name.trim().is_empty() {
        return Err(ConfigGuardRailError::BlankTaskName);
    }

    if config.handshake_timeout_ms < MIN_COMFORTABLE_TIMEOUT_MS {
        warnings.push_with_hint(
            format!(
                "handshake timeout of {}ms is very short",
                config.handshake_timeout_ms
            ),
            "Startup and shutdown will report HandshakeTimeout if the dispatch task is slow to schedule",
        );
    }
    if config.scan_fragment_cap > LARGE_SCAN_CAP {
        warnings.push(format!(
            "scan fragment cap {} is unusually large; each scan buffers up to that many entries",
            config.scan_fragment_cap
        ));
    }

    Ok(warnings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pass_without_warnings() {
        let warnings = apply_guard_rails(&BridgeConfig::default()).expect("defaults are valid");
        assert!(warnings.is_empty());
    }

    #[test]
    fn zero_cap_is_rejected() {
        let config = BridgeConfig::default().with_scan_fragment_cap(0);
        assert_eq!(
            apply_guard_rails(&config).unwrap_err(),
            ConfigGuardRailError::Zero {
                field: "scan_fragment_cap"
            }
        );
    }

    #[test]
    fn short_timeout_only_warns() {
        let config = BridgeConfig {
            handshake_timeout_ms: 20,
            ..BridgeConfig::default()
        };
        let warnings = apply_guard_rails(&config).expect("still valid");
        assert_eq!(warnings.items.len(), 1);
        assert!(warnings.items[0].hint.is_some());
    }
}
