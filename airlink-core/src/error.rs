use std::time::Duration;

use airlink_model::ModelError;
use thiserror::Error;

use crate::driver::CommandCode;
use crate::ipc::{ChannelName, HandshakePhase};

/// Invalid arguments handed to the public API.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArgError {
    #[error("no callback table supplied")]
    MissingCallbacks,

    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ModelError),
}

/// A control command was rejected or could not reach the driver.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DriverError {
    #[error("driver unavailable: {0}")]
    Unavailable(String),

    #[error("driver rejected {code}: {reason}")]
    Rejected { code: CommandCode, reason: String },

    #[error("driver answered {code} with an unexpected reply")]
    UnexpectedReply { code: CommandCode },
}

impl DriverError {
    pub fn rejected(code: CommandCode, reason: impl Into<String>) -> Self {
        DriverError::Rejected {
            code,
            reason: reason.into(),
        }
    }
}

/// Failures creating, opening, or using an inbound event channel.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IpcError {
    #[error("event channel {0} already exists")]
    ChannelExists(ChannelName),

    #[error("event channel {0} not found")]
    ChannelNotFound(ChannelName),

    #[error("event channel {0} is closed")]
    Closed(ChannelName),

    #[error("timed out after {waited:?} sending to event channel {channel}")]
    SendTimeout {
        channel: ChannelName,
        waited: Duration,
    },
}

/// A record on the inbound channel could not be decoded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("unknown event tag {0}")]
    UnknownTag(u32),

    #[error("event record length {actual} does not match expected {expected}")]
    BadLength { expected: usize, actual: usize },

    #[error("event tag {0} requires an access point payload")]
    MissingPayload(u32),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    #[error(transparent)]
    Arg(#[from] ArgError),

    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error(transparent)]
    Ipc(#[from] IpcError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("{phase} handshake timed out after {waited:?}")]
    HandshakeTimeout {
        phase: HandshakePhase,
        waited: Duration,
    },

    #[error("bridge already initialized")]
    AlreadyInitialized,

    #[error("bridge not initialized")]
    NotInitialized,

    #[error("a scan is already being reassembled")]
    ScanInProgress,
}

impl From<ModelError> for BridgeError {
    fn from(err: ModelError) -> Self {
        BridgeError::Arg(ArgError::InvalidConfig(err))
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
