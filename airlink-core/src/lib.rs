//! # Airlink Core
//!
//! Bridges a synchronous link-layer driver control interface to an async,
//! callback-driven API.
//!
//! ## Overview
//!
//! - **Control**: every command opens its own driver connection, submits once
//!   and closes it ([`control`])
//! - **Events**: a dispatch task drains a named inbound channel and routes
//!   decoded events to user handlers ([`dispatch`], [`callbacks`])
//! - **Scans**: fragmented scan reports are reassembled into one ordered list
//!   before delivery ([`scan`])
//! - **Lifecycle**: startup and teardown are coordinated through a bounded
//!   handshake with the dispatch task ([`lifecycle`])
//!
//! ## Feature Flags
//!
//! - `loopback` (default): in-process reference driver, see
//!   [`driver::loopback`]
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use airlink_core::driver::loopback::LoopbackDriver;
//! use airlink_core::{BridgeConfig, CallbackTable, EventHub, WifiBridge};
//!
//! # async fn run() -> airlink_core::Result<()> {
//! let hub = EventHub::new();
//! let driver = Arc::new(LoopbackDriver::new(hub.clone()));
//! let bridge = WifiBridge::new(driver, hub, BridgeConfig::default());
//!
//! bridge.register_callbacks(CallbackTable::new().on_scan_done(|outcome, results| {
//!     if let Some(list) = results {
//!         println!("{outcome:?}: {:?}", list.ssids());
//!     }
//! }))?;
//! bridge.init().await?;
//! bridge.scan().await?;
//! bridge.deinit().await?;
//! # Ok(())
//! # }
//! ```
#![allow(missing_docs)]

pub mod bridge;
pub mod callbacks;
pub mod config;
pub mod control;
pub mod dispatch;
pub mod driver;
pub mod error;
pub mod ipc;
pub mod lifecycle;
pub mod scan;

pub use bridge::WifiBridge;
pub use callbacks::{CallbackRegistry, CallbackTable, Notification, Outcome};
pub use config::BridgeConfig;
pub use control::ControlClient;
pub use dispatch::DispatchState;
pub use driver::{CommandCode, CommandReply, ControlCommand, DriverConnection, LinkDriver};
pub use error::{ArgError, BridgeError, DriverError, IpcError, ProtocolError, Result};
pub use ipc::{ChannelName, EventHub, EventRecord, EventTag};
pub use lifecycle::DriverHandle;
pub use scan::{ScanResultList, ScanStatus};
