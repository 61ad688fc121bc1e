//! Core data model definitions shared across airlink crates.
#![allow(missing_docs)]

pub mod access_point;
pub mod config;
pub mod error;
pub mod info;
pub mod mac;

pub use access_point::{ApScanInfo, AuthType, CryptoType, MAX_SSID_LEN};
pub use config::{ApConfig, MAX_PASSPHRASE_LEN, SoftApConfig};
pub use error::{ModelError, Result as ModelResult};
pub use info::{LinkStatus, WifiInfo};
pub use mac::MacAddress;
