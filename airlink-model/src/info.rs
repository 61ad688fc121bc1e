use std::fmt::{self, Display, Formatter};
use std::net::Ipv4Addr;

use crate::mac::MacAddress;

/// Current role/state of the radio link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum LinkStatus {
    #[default]
    Disconnected,
    Connected,
    SoftAp,
}

impl Display for LinkStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            LinkStatus::Disconnected => write!(f, "disconnected"),
            LinkStatus::Connected => write!(f, "connected"),
            LinkStatus::SoftAp => write!(f, "soft-ap"),
        }
    }
}

/// Snapshot returned by a get-info control command.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WifiInfo {
    pub ip4_address: Ipv4Addr,
    pub mac_address: MacAddress,
    pub rssi: i16,
    pub status: LinkStatus,
}

impl Default for WifiInfo {
    fn default() -> Self {
        Self {
            ip4_address: Ipv4Addr::UNSPECIFIED,
            mac_address: MacAddress::default(),
            rssi: 0,
            status: LinkStatus::Disconnected,
        }
    }
}
