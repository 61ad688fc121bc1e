//! In-process reference driver.
//!
//! Behaves like a small radio: it binds to the event channel named by
//! `RegisterChannel`, answers control commands synchronously, and pushes
//! asynchronous outcomes (scan fragments, association changes) onto that
//! channel. Tests and `airlinkctl` drive the bridge against it.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use airlink_model::{ApScanInfo, LinkStatus, WifiInfo};
use async_trait::async_trait;
use tracing::{debug, warn};

use super::{CommandCode, CommandReply, ControlCommand, DriverConnection, LinkDriver};
use crate::error::DriverError;
use crate::ipc::{ChannelName, EventHub, EventRecord, EventSender, EventTag};

#[derive(Debug, Default)]
struct RadioState {
    events: Option<EventSender>,
    initialized: bool,
    station_mode: bool,
    associated: Option<String>,
    soft_ap: Option<String>,
    autoconnect: bool,
    scan_script: Vec<ApScanInfo>,
    info: WifiInfo,
    journal: Vec<CommandCode>,
    failing: BTreeSet<CommandCode>,
    unavailable: bool,
}

struct Shared {
    hub: EventHub,
    radio: Mutex<RadioState>,
    open: AtomicUsize,
    opened_total: AtomicUsize,
}

impl Shared {
    fn radio(&self) -> MutexGuard<'_, RadioState> {
        self.radio
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Cloneable handle; clones observe and control the same radio.
#[derive(Clone)]
pub struct LoopbackDriver {
    shared: Arc<Shared>,
}

impl fmt::Debug for LoopbackDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoopbackDriver")
            .field("open_connections", &self.open_connections())
            .field("initialized", &self.is_initialized())
            .finish_non_exhaustive()
    }
}

impl LoopbackDriver {
    pub fn new(hub: EventHub) -> Self {
        Self {
            shared: Arc::new(Shared {
                hub,
                radio: Mutex::new(RadioState::default()),
                open: AtomicUsize::new(0),
                opened_total: AtomicUsize::new(0),
            }),
        }
    }

    /// Connections currently open.
    pub fn open_connections(&self) -> usize {
        self.shared.open.load(Ordering::Acquire)
    }

    /// Connections ever opened.
    pub fn connections_opened(&self) -> usize {
        self.shared.opened_total.load(Ordering::Acquire)
    }

    /// Every command code submitted so far, in order.
    pub fn commands(&self) -> Vec<CommandCode> {
        self.shared.radio().journal.clone()
    }

    /// Rejects every subsequent submission of `code`.
    pub fn fail_on(&self, code: CommandCode) {
        self.shared.radio().failing.insert(code);
    }

    pub fn clear_failures(&self) {
        self.shared.radio().failing.clear();
    }

    /// When set, `open` fails as if the device node were missing.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.shared.radio().unavailable = unavailable;
    }

    /// Access points the next scans will report. Their SSIDs also become
    /// the networks a connect request can join.
    pub fn script_scan(&self, access_points: Vec<ApScanInfo>) {
        self.shared.radio().scan_script = access_points;
    }

    pub fn set_info(&self, info: WifiInfo) {
        self.shared.radio().info = info;
    }

    pub fn is_initialized(&self) -> bool {
        self.shared.radio().initialized
    }

    pub fn autoconnect(&self) -> bool {
        self.shared.radio().autoconnect
    }

    pub fn associated_ssid(&self) -> Option<String> {
        self.shared.radio().associated.clone()
    }

    pub fn bound_channel(&self) -> Option<ChannelName> {
        self.shared
            .radio()
            .events
            .as_ref()
            .map(|events| events.name().clone())
    }

    /// Pushes a payload-free event onto the registered channel.
    pub async fn emit(&self, tag: EventTag) -> Result<(), DriverError> {
        self.emit_raw(EventRecord::new(tag)).await
    }

    /// Pushes an arbitrary record, well-formed or not.
    pub async fn emit_raw(&self, record: EventRecord) -> Result<(), DriverError> {
        let events = self
            .shared
            .radio()
            .events
            .clone()
            .ok_or_else(|| DriverError::Unavailable("no event channel registered".into()))?;
        events
            .send(record)
            .await
            .map_err(|err| DriverError::Unavailable(err.to_string()))
    }
}

#[async_trait]
impl LinkDriver for LoopbackDriver {
    async fn open(&self) -> Result<Box<dyn DriverConnection>, DriverError> {
        if self.shared.radio().unavailable {
            return Err(DriverError::Unavailable("loopback device offline".into()));
        }
        self.shared.open.fetch_add(1, Ordering::AcqRel);
        self.shared.opened_total.fetch_add(1, Ordering::AcqRel);
        Ok(Box::new(LoopbackConnection {
            shared: self.shared.clone(),
        }))
    }
}

struct LoopbackConnection {
    shared: Arc<Shared>,
}

impl Drop for LoopbackConnection {
    fn drop(&mut self) {
        self.shared.open.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Records produced by a command, to be sent once the radio lock is released.
type Outbound = Option<(EventSender, Vec<EventRecord>)>;

impl LoopbackConnection {
    fn apply(&self, command: &ControlCommand) -> Result<(CommandReply, Outbound), DriverError> {
        let code = command.code();
        let mut radio = self.shared.radio();
        radio.journal.push(code);

        if radio.failing.contains(&code) {
            return Err(DriverError::rejected(code, "injected failure"));
        }

        let requires_init = !matches!(
            command,
            ControlCommand::RegisterChannel(_)
                | ControlCommand::UnregisterChannel
                | ControlCommand::Init
                | ControlCommand::Deinit
        );
        if requires_init && !radio.initialized {
            return Err(DriverError::rejected(code, "radio not initialized"));
        }

        let mut events = Vec::new();
        let mut reply = CommandReply::Done;
        match command {
            ControlCommand::RegisterChannel(name) => {
                let sender = self
                    .shared
                    .hub
                    .open(name)
                    .map_err(|err| DriverError::rejected(code, err.to_string()))?;
                radio.events = Some(sender);
            }
            ControlCommand::UnregisterChannel => radio.events = None,
            ControlCommand::Init => radio.initialized = true,
            ControlCommand::Deinit => {
                radio.initialized = false;
                radio.station_mode = false;
                radio.associated = None;
                radio.soft_ap = None;
                radio.info.status = LinkStatus::Disconnected;
            }
            ControlCommand::Scan => {
                if radio.scan_script.is_empty() {
                    events.push(EventRecord::new(EventTag::ScanFailed));
                } else {
                    let total = radio.scan_script.len();
                    events.extend(
                        radio
                            .scan_script
                            .iter()
                            .enumerate()
                            .map(|(i, ap)| EventRecord::scan_fragment(ap.clone(), i + 1 < total)),
                    );
                }
            }
            ControlCommand::Connect(ap) => {
                let known = radio.scan_script.iter().any(|seen| seen.ssid == ap.ssid());
                if known {
                    radio.associated = Some(ap.ssid().to_string());
                    radio.info.status = LinkStatus::Connected;
                    events.push(EventRecord::new(EventTag::StationConnected));
                } else {
                    events.push(EventRecord::new(EventTag::StationConnectFailed));
                }
            }
            ControlCommand::Disconnect => {
                if radio.associated.take().is_some() {
                    radio.info.status = LinkStatus::Disconnected;
                    events.push(EventRecord::new(EventTag::StationDisconnected));
                }
            }
            ControlCommand::StartSoftAp(config) => {
                radio.soft_ap = Some(config.ssid().to_string());
                radio.station_mode = false;
                radio.info.status = LinkStatus::SoftAp;
            }
            ControlCommand::StopSoftAp => {
                if radio.soft_ap.take().is_some() {
                    radio.info.status = LinkStatus::Disconnected;
                }
            }
            ControlCommand::StartStation => {
                radio.station_mode = true;
                radio.soft_ap = None;
            }
            ControlCommand::SetAutoconnect(enabled) => radio.autoconnect = *enabled,
            ControlCommand::GetInfo => reply = CommandReply::Info(radio.info.clone()),
        }

        let outbound = match (&radio.events, events.is_empty()) {
            (_, true) => None,
            (Some(sender), false) => Some((sender.clone(), events)),
            (None, false) => {
                warn!(target: "airlink::loopback", %code, dropped = events.len(), "no event channel registered, dropping events");
                None
            }
        };
        Ok((reply, outbound))
    }
}

#[async_trait]
impl DriverConnection for LoopbackConnection {
    async fn submit(&mut self, command: &ControlCommand) -> Result<CommandReply, DriverError> {
        let (reply, outbound) = self.apply(command)?;
        if let Some((sender, records)) = outbound {
            debug!(target: "airlink::loopback", code = %command.code(), records = records.len(), "emitting events");
            for record in records {
                if let Err(err) = sender.send(record).await {
                    warn!(target: "airlink::loopback", error = %err, "event channel went away mid-emit");
                    break;
                }
            }
        }
        Ok(reply)
    }
}
