//! Port to the link-layer driver's control interface.
//!
//! The driver exposes a synchronous request/response primitive: open a
//! connection, submit one command, observe success or failure as the return
//! value, close. Asynchronous outcomes (scan results, association changes)
//! arrive separately on the inbound event channel registered with
//! [`ControlCommand::RegisterChannel`].

use std::fmt;

use airlink_model::{ApConfig, SoftApConfig, WifiInfo};
use async_trait::async_trait;

use crate::error::DriverError;
use crate::ipc::ChannelName;

#[cfg(feature = "loopback")]
pub mod loopback;

/// Payload-free discriminant of a [`ControlCommand`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CommandCode {
    RegisterChannel,
    UnregisterChannel,
    Init,
    Deinit,
    Scan,
    Connect,
    Disconnect,
    StartSoftAp,
    StopSoftAp,
    StartStation,
    SetAutoconnect,
    GetInfo,
}

impl fmt::Display for CommandCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CommandCode::RegisterChannel => "register-channel",
            CommandCode::UnregisterChannel => "unregister-channel",
            CommandCode::Init => "init",
            CommandCode::Deinit => "deinit",
            CommandCode::Scan => "scan",
            CommandCode::Connect => "connect",
            CommandCode::Disconnect => "disconnect",
            CommandCode::StartSoftAp => "start-soft-ap",
            CommandCode::StopSoftAp => "stop-soft-ap",
            CommandCode::StartStation => "start-station",
            CommandCode::SetAutoconnect => "set-autoconnect",
            CommandCode::GetInfo => "get-info",
        };
        f.write_str(label)
    }
}

/// A control request with its strongly typed payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlCommand {
    RegisterChannel(ChannelName),
    UnregisterChannel,
    Init,
    Deinit,
    Scan,
    Connect(ApConfig),
    Disconnect,
    StartSoftAp(SoftApConfig),
    StopSoftAp,
    StartStation,
    SetAutoconnect(bool),
    GetInfo,
}

impl ControlCommand {
    pub fn code(&self) -> CommandCode {
        match self {
            ControlCommand::RegisterChannel(_) => CommandCode::RegisterChannel,
            ControlCommand::UnregisterChannel => CommandCode::UnregisterChannel,
            ControlCommand::Init => CommandCode::Init,
            ControlCommand::Deinit => CommandCode::Deinit,
            ControlCommand::Scan => CommandCode::Scan,
            ControlCommand::Connect(_) => CommandCode::Connect,
            ControlCommand::Disconnect => CommandCode::Disconnect,
            ControlCommand::StartSoftAp(_) => CommandCode::StartSoftAp,
            ControlCommand::StopSoftAp => CommandCode::StopSoftAp,
            ControlCommand::StartStation => CommandCode::StartStation,
            ControlCommand::SetAutoconnect(_) => CommandCode::SetAutoconnect,
            ControlCommand::GetInfo => CommandCode::GetInfo,
        }
    }
}

/// Synchronous result of a control command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandReply {
    Done,
    Info(WifiInfo),
}

/// Entry point to the driver device. Each call to [`LinkDriver::open`] yields
/// an independent connection; concurrent callers never share one.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkDriver: Send + Sync {
    async fn open(&self) -> Result<Box<dyn DriverConnection>, DriverError>;
}

/// One open driver connection. Dropping it closes the connection.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DriverConnection: Send {
    async fn submit(
        &mut self,
        command: &ControlCommand,
    ) -> Result<CommandReply, DriverError>;
}
