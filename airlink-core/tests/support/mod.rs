#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use airlink_core::driver::loopback::LoopbackDriver;
use airlink_core::{BridgeConfig, CallbackTable, EventHub, Outcome, WifiBridge};
use airlink_model::{ApScanInfo, MacAddress};
use anyhow::{Context, Result};
use tokio::sync::mpsc;

/// What a handler saw, flattened so tests can compare it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observed {
    StationConnected(Outcome),
    StationDisconnected,
    SoftApStationJoined,
    SoftApStationLeft,
    ScanDone(Outcome, Option<Vec<String>>),
}

#[derive(Debug)]
pub struct Harness {
    pub bridge: WifiBridge,
    pub driver: LoopbackDriver,
    pub hub: EventHub,
    events: mpsc::UnboundedReceiver<Observed>,
}

pub const WAIT: Duration = Duration::from_secs(2);

impl Harness {
    pub fn new() -> Self {
        Self::with_config(BridgeConfig::default().with_handshake_timeout(WAIT))
    }

    pub fn with_config(config: BridgeConfig) -> Self {
        let hub = EventHub::new();
        let driver = LoopbackDriver::new(hub.clone());
        let bridge = WifiBridge::new(Arc::new(driver.clone()), hub.clone(), config);
        let (tx, events) = mpsc::unbounded_channel();
        bridge
            .register_callbacks(recording_table(tx))
            .expect("table is present");
        Self {
            bridge,
            driver,
            hub,
            events,
        }
    }

    /// Next observed notification, failing the test after [`WAIT`].
    pub async fn next(&mut self) -> Result<Observed> {
        tokio::time::timeout(WAIT, self.events.recv())
            .await
            .context("timed out waiting for a notification")?
            .context("handlers dropped")
    }

    /// Registers a new recording table after `deinit` dropped the old one.
    pub fn reregister(&mut self) {
        let (tx, events) = mpsc::unbounded_channel();
        self.bridge
            .register_callbacks(recording_table(tx))
            .expect("table is present");
        self.events = events;
    }

    /// True when nothing is delivered within a short grace period. A closed
    /// stream counts as quiet.
    pub async fn quiet(&mut self) -> bool {
        !matches!(
            tokio::time::timeout(Duration::from_millis(100), self.events.recv()).await,
            Ok(Some(_))
        )
    }
}

pub fn recording_table(tx: mpsc::UnboundedSender<Observed>) -> CallbackTable {
    let connected = tx.clone();
    let disconnected = tx.clone();
    let joined = tx.clone();
    let left = tx.clone();
    CallbackTable::new()
        .on_station_connected(move |outcome| {
            let _ = connected.send(Observed::StationConnected(outcome));
        })
        .on_station_disconnected(move || {
            let _ = disconnected.send(Observed::StationDisconnected);
        })
        .on_soft_ap_station_joined(move || {
            let _ = joined.send(Observed::SoftApStationJoined);
        })
        .on_soft_ap_station_left(move || {
            let _ = left.send(Observed::SoftApStationLeft);
        })
        .on_scan_done(move |outcome, results| {
            let ssids = results.map(|list| list.ssids().into_iter().map(String::from).collect::<Vec<_>>());
            let _ = tx.send(Observed::ScanDone(outcome, ssids));
        })
}

pub fn access_points(ssids: &[&str]) -> Vec<ApScanInfo> {
    ssids
        .iter()
        .enumerate()
        .map(|(i, ssid)| ApScanInfo::new(*ssid, MacAddress::new([i as u8 + 1; 6]), 6))
        .collect()
}

pub fn owned(ssids: &[&str]) -> Vec<String> {
    ssids.iter().map(|ssid| ssid.to_string()).collect()
}
