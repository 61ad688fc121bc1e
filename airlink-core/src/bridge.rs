use std::fmt;
use std::sync::Arc;

use airlink_model::{ApConfig, SoftApConfig, WifiInfo};
use tokio::sync::Mutex;
use tracing::debug;

use crate::callbacks::{CallbackRegistry, CallbackTable};
use crate::config::BridgeConfig;
use crate::dispatch::DispatchState;
use crate::driver::{ControlCommand, LinkDriver};
use crate::error::{BridgeError, Result};
use crate::ipc::{ChannelName, EventHub};
use crate::lifecycle::{DriverHandle, Lifecycle};
use crate::scan::ScanStatus;

/// Async, callback-driven front end to a link-layer driver.
///
/// One bridge owns at most one live session at a time. Control methods
/// return once the driver has accepted the command; their asynchronous
/// outcome arrives through the registered [`CallbackTable`].
pub struct WifiBridge {
    lifecycle: Lifecycle,
    callbacks: CallbackRegistry,
    scan_status: ScanStatus,
    hub: EventHub,
    config: BridgeConfig,
    session: Mutex<Option<DriverHandle>>,
}

impl fmt::Debug for WifiBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WifiBridge")
            .field("config", &self.config)
            .field("callbacks", &self.callbacks)
            .field("scan_in_progress", &self.scan_status.in_progress())
            .finish_non_exhaustive()
    }
}

impl WifiBridge {
    pub fn new(driver: Arc<dyn LinkDriver>, hub: EventHub, config: BridgeConfig) -> Self {
        let callbacks = CallbackRegistry::new();
        let scan_status = ScanStatus::default();
        let lifecycle = Lifecycle::new(
            driver,
            hub.clone(),
            callbacks.clone(),
            scan_status.clone(),
            config.clone(),
        );
        Self {
            lifecycle,
            callbacks,
            scan_status,
            hub,
            config,
            session: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn hub(&self) -> &EventHub {
        &self.hub
    }

    pub fn callbacks(&self) -> &CallbackRegistry {
        &self.callbacks
    }

    /// Starts the dispatch task and initializes the driver.
    pub async fn init(&self) -> Result<()> {
        let mut session = self.session.lock().await;
        if session.is_some() {
            return Err(BridgeError::AlreadyInitialized);
        }
        *session = Some(self.lifecycle.start().await?);
        Ok(())
    }

    /// Tears the session down and forgets every registered handler. The
    /// session is released even when part of the teardown fails.
    ///
    /// The session lock is held until teardown completes, so a concurrent
    /// `init` starts only after the old session is fully gone.
    pub async fn deinit(&self) -> Result<()> {
        let mut session = self.session.lock().await;
        let handle = session.take().ok_or(BridgeError::NotInitialized)?;
        self.lifecycle.shutdown(handle).await
    }

    pub async fn is_initialized(&self) -> bool {
        self.session.lock().await.is_some()
    }

    pub async fn channel_name(&self) -> Option<ChannelName> {
        self.session
            .lock()
            .await
            .as_ref()
            .map(|handle| handle.channel().clone())
    }

    pub async fn dispatch_state(&self) -> Option<DispatchState> {
        self.session
            .lock()
            .await
            .as_ref()
            .map(DriverHandle::dispatch_state)
    }

    /// Replaces the handler table. Takes effect for the next event.
    pub fn register_callbacks(&self, table: impl Into<Option<CallbackTable>>) -> Result<()> {
        self.callbacks.register(table)?;
        debug!(target: "airlink::callbacks", "callback table replaced");
        Ok(())
    }

    /// Requests a scan; results arrive through `scan_done`. Only one scan
    /// may be outstanding from acceptance until its `scan_done`.
    pub async fn scan(&self) -> Result<()> {
        if !self.scan_status.try_claim() {
            return Err(BridgeError::ScanInProgress);
        }
        let result = self.submit(ControlCommand::Scan).await;
        if result.is_err() {
            self.scan_status.release();
        }
        result
    }

    pub async fn connect(&self, ap: &ApConfig) -> Result<()> {
        self.submit(ControlCommand::Connect(ap.clone())).await
    }

    pub async fn disconnect(&self) -> Result<()> {
        self.submit(ControlCommand::Disconnect).await
    }

    pub async fn start_soft_ap(&self, config: &SoftApConfig) -> Result<()> {
        self.submit(ControlCommand::StartSoftAp(config.clone())).await
    }

    pub async fn stop_soft_ap(&self) -> Result<()> {
        self.submit(ControlCommand::StopSoftAp).await
    }

    pub async fn start_station(&self) -> Result<()> {
        self.submit(ControlCommand::StartStation).await
    }

    pub async fn set_autoconnect(&self, enabled: bool) -> Result<()> {
        self.submit(ControlCommand::SetAutoconnect(enabled)).await
    }

    pub async fn get_info(&self) -> Result<WifiInfo> {
        Ok(self.lifecycle.control().get_info().await?)
    }

    async fn submit(&self, command: ControlCommand) -> Result<()> {
        Ok(self.lifecycle.control().send_expecting_done(command).await?)
    }
}
