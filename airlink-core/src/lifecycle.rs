//! Session startup and teardown.
//!
//! Startup brings the dispatch task up before the driver learns the channel
//! name, so no event can be produced before someone is listening. Teardown
//! runs in the reverse order and always releases the channel, even when the
//! task does not answer in time.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::callbacks::CallbackRegistry;
use crate::config::BridgeConfig;
use crate::control::ControlClient;
use crate::dispatch::{DispatchContext, DispatchState, DispatchTask};
use crate::driver::{ControlCommand, DriverConnection, LinkDriver};
use crate::error::{IpcError, Result};
use crate::ipc::{ChannelName, EventHub, EventRecord, Handshake, HandshakePhase};
use crate::scan::ScanStatus;

/// A live session: the inbound channel and the task that drains it.
///
/// Dropping the handle without [`Lifecycle::shutdown`] aborts the task and
/// unlinks the channel, but sends nothing to the driver.
pub struct DriverHandle {
    channel: ChannelName,
    task: DispatchTask,
    hub: EventHub,
}

impl fmt::Debug for DriverHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverHandle")
            .field("channel", &self.channel)
            .field("state", &self.task.state())
            .finish()
    }
}

impl DriverHandle {
    pub fn channel(&self) -> &ChannelName {
        &self.channel
    }

    pub fn dispatch_state(&self) -> DispatchState {
        self.task.state()
    }
}

impl Drop for DriverHandle {
    fn drop(&mut self) {
        self.task.abort();
        self.hub.unlink(&self.channel);
    }
}

/// Everything needed to bring a session up or down.
#[derive(Clone)]
pub struct Lifecycle {
    driver: Arc<dyn LinkDriver>,
    control: ControlClient,
    hub: EventHub,
    callbacks: CallbackRegistry,
    scan_status: ScanStatus,
    config: BridgeConfig,
}

impl fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lifecycle")
            .field("hub", &self.hub)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Lifecycle {
    pub fn new(
        driver: Arc<dyn LinkDriver>,
        hub: EventHub,
        callbacks: CallbackRegistry,
        scan_status: ScanStatus,
        config: BridgeConfig,
    ) -> Self {
        Self {
            control: ControlClient::new(driver.clone()),
            driver,
            hub,
            callbacks,
            scan_status,
            config,
        }
    }

    pub fn control(&self) -> &ControlClient {
        &self.control
    }

    pub async fn start(&self) -> Result<DriverHandle> {
        let mut connection = self.driver.open().await.inspect_err(|err| {
            warn!(target: "airlink::lifecycle", error = %err, "driver unavailable, nothing started");
        })?;

        let channel = ChannelName::generate();
        let handshake = Handshake::new();
        let task = DispatchTask::spawn(DispatchContext {
            channel: channel.clone(),
            hub: self.hub.clone(),
            capacity: self.config.event_queue_capacity,
            callbacks: self.callbacks.clone(),
            scan_cap: self.config.scan_fragment_cap,
            scan_status: self.scan_status.clone(),
            handshake: handshake.clone(),
            task_name: self.config.dispatch_task_name.clone(),
        });
        let mut handle = DriverHandle {
            channel: channel.clone(),
            task,
            hub: self.hub.clone(),
        };

        let timeout = self.config.handshake_timeout();
        if let Err(err) = handshake.wait(timeout, HandshakePhase::Startup).await {
            warn!(target: "airlink::lifecycle", %channel, error = %err, "dispatch task never became ready");
            return Err(err);
        }
        if handle.task.state() == DispatchState::Stopped {
            let err = match handle.task.join().await {
                Err(err) => err,
                Ok(()) => IpcError::Closed(channel.clone()).into(),
            };
            warn!(target: "airlink::lifecycle", %channel, error = %err, "dispatch task stopped during startup");
            return Err(err);
        }

        if let Err(err) = self.announce(connection.as_mut(), &channel).await {
            drop(connection);
            if let Err(teardown) = self.stop_dispatch(handle).await {
                debug!(target: "airlink::lifecycle", error = %teardown, "unwind after failed startup was incomplete");
            }
            return Err(err);
        }
        drop(connection);

        info!(target: "airlink::lifecycle", %channel, "bridge initialized");
        Ok(handle)
    }

    /// Registers the channel with the driver and initializes the radio over
    /// the startup connection. A failed `Init` unregisters again.
    async fn announce(
        &self,
        connection: &mut dyn DriverConnection,
        channel: &ChannelName,
    ) -> Result<()> {
        connection
            .submit(&ControlCommand::RegisterChannel(channel.clone()))
            .await
            .inspect_err(|err| {
                warn!(target: "airlink::lifecycle", %channel, error = %err, "driver refused channel registration");
            })?;

        if let Err(err) = connection.submit(&ControlCommand::Init).await {
            warn!(target: "airlink::lifecycle", %channel, error = %err, "driver init failed");
            if let Err(unregister) = connection.submit(&ControlCommand::UnregisterChannel).await {
                debug!(target: "airlink::lifecycle", error = %unregister, "unregister after failed init also failed");
            }
            return Err(err.into());
        }
        Ok(())
    }

    /// Full teardown of a live session. Driver-side failures are logged and
    /// do not stop the local teardown. The registry is cleared before the
    /// first await, so a table registered while teardown runs is kept.
    pub async fn shutdown(&self, handle: DriverHandle) -> Result<()> {
        self.callbacks.clear();
        for command in [ControlCommand::Deinit, ControlCommand::UnregisterChannel] {
            let code = command.code();
            if let Err(err) = self.control.send(command).await {
                warn!(target: "airlink::lifecycle", %code, error = %err, "best-effort shutdown step failed, continuing");
            }
        }

        let result = self.stop_dispatch(handle).await;
        info!(target: "airlink::lifecycle", "bridge deinitialized");
        result
    }

    /// Terminates the dispatch task and releases the channel.
    async fn stop_dispatch(&self, mut handle: DriverHandle) -> Result<()> {
        let timeout = self.config.handshake_timeout();
        let channel = handle.channel.clone();

        let sender = match self.hub.open(&channel) {
            Ok(sender) => sender,
            Err(err) => {
                debug!(target: "airlink::lifecycle", %channel, error = %err, "channel never opened, skipping terminate");
                handle.task.abort();
                return Ok(());
            }
        };
        if let Err(err) = sender.send_timeout(EventRecord::terminate(), timeout).await {
            // A task that already stopped has posted its exit signal.
            debug!(target: "airlink::lifecycle", %channel, error = %err, "terminate not delivered");
        }
        drop(sender);

        let waited = handle
            .task
            .handshake()
            .wait(timeout, HandshakePhase::Shutdown)
            .await;
        match &waited {
            Ok(()) => {
                if let Err(err) = handle.task.join().await {
                    debug!(target: "airlink::lifecycle", %channel, error = %err, "dispatch task had already stopped on an error");
                }
            }
            Err(err) => {
                warn!(target: "airlink::lifecycle", %channel, error = %err, "dispatch task did not stop in time, aborting");
                handle.task.abort();
            }
        }

        self.hub.unlink(&channel);
        waited
    }
}
