//! One-shot control commands against the driver.

use std::fmt;
use std::sync::Arc;

use airlink_model::WifiInfo;
use tracing::{debug, warn};

use crate::driver::{CommandReply, ControlCommand, LinkDriver};
use crate::error::DriverError;

/// Stateless client: every call opens its own connection, submits exactly
/// once, and closes the connection before returning, whatever the outcome.
#[derive(Clone)]
pub struct ControlClient {
    driver: Arc<dyn LinkDriver>,
}

impl fmt::Debug for ControlClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlClient").finish_non_exhaustive()
    }
}

impl ControlClient {
    pub fn new(driver: Arc<dyn LinkDriver>) -> Self {
        Self { driver }
    }

    pub async fn send(
        &self,
        command: ControlCommand,
    ) -> Result<CommandReply, DriverError> {
        let code = command.code();
        debug!(target: "airlink::control", %code, "submitting control command");

        let mut connection = self.driver.open().await.inspect_err(|err| {
            warn!(target: "airlink::control", %code, error = %err, "driver connection failed");
        })?;
        let result = connection.submit(&command).await;
        drop(connection);

        if let Err(err) = &result {
            warn!(target: "airlink::control", %code, error = %err, "control command failed");
        }
        result
    }

    /// Sends a command whose only valid reply is [`CommandReply::Done`].
    pub async fn send_expecting_done(
        &self,
        command: ControlCommand,
    ) -> Result<(), DriverError> {
        let code = command.code();
        match self.send(command).await? {
            CommandReply::Done => Ok(()),
            CommandReply::Info(_) => Err(DriverError::UnexpectedReply { code }),
        }
    }

    pub async fn get_info(&self) -> Result<WifiInfo, DriverError> {
        match self.send(ControlCommand::GetInfo).await? {
            CommandReply::Info(info) => Ok(info),
            CommandReply::Done => Err(DriverError::UnexpectedReply {
                code: ControlCommand::GetInfo.code(),
            }),
        }
    }
}
