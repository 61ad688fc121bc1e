use std::fmt::{self, Display};

/// Errors produced by model constructors and validation routines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    SsidLength(usize),
    PassphraseLength(usize),
    MissingPassphrase,
    InvalidChannel(u8),
    InvalidMacAddress(String),
}

impl Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::SsidLength(len) => {
                write!(f, "ssid must be 1..=32 bytes, got {len}")
            }
            ModelError::PassphraseLength(len) => {
                write!(f, "passphrase must be at most 64 bytes, got {len}")
            }
            ModelError::MissingPassphrase => {
                write!(f, "secured networks require a passphrase")
            }
            ModelError::InvalidChannel(channel) => {
                write!(f, "channel {channel} is outside 1..=14")
            }
            ModelError::InvalidMacAddress(raw) => {
                write!(f, "invalid mac address: {raw}")
            }
        }
    }
}

impl std::error::Error for ModelError {}

pub type Result<T> = std::result::Result<T, ModelError>;
