use std::fmt::{self, Display, Formatter};

use crate::mac::MacAddress;

/// Longest SSID the link layer accepts, in bytes.
pub const MAX_SSID_LEN: usize = 32;

/// Authentication scheme advertised by (or required of) an access point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AuthType {
    Open,
    WepShared,
    WpaPsk,
    Wpa2Psk,
    WpaAndWpa2Psk,
    WpaPskEnterprise,
    Wpa2PskEnterprise,
    Wpa3Psk,
    #[default]
    Unknown,
}

impl AuthType {
    /// Whether joining a network with this scheme needs a passphrase.
    pub fn requires_passphrase(&self) -> bool {
        !matches!(self, AuthType::Open | AuthType::Unknown)
    }
}

impl Display for AuthType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let label = match self {
            AuthType::Open => "open",
            AuthType::WepShared => "wep-shared",
            AuthType::WpaPsk => "wpa-psk",
            AuthType::Wpa2Psk => "wpa2-psk",
            AuthType::WpaAndWpa2Psk => "wpa/wpa2-psk",
            AuthType::WpaPskEnterprise => "wpa-enterprise",
            AuthType::Wpa2PskEnterprise => "wpa2-enterprise",
            AuthType::Wpa3Psk => "wpa3-psk",
            AuthType::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// Pairwise cipher used on the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CryptoType {
    None,
    Wep64,
    Wep128,
    Aes,
    Tkip,
    TkipAndAes,
    #[default]
    Unknown,
}

impl Display for CryptoType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let label = match self {
            CryptoType::None => "none",
            CryptoType::Wep64 => "wep-64",
            CryptoType::Wep128 => "wep-128",
            CryptoType::Aes => "aes",
            CryptoType::Tkip => "tkip",
            CryptoType::TkipAndAes => "tkip+aes",
            CryptoType::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// One access point as reported by a scan fragment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ApScanInfo {
    pub channel: u8,
    pub ssid: String,
    pub bssid: MacAddress,
    /// Received signal strength in dBm.
    pub rssi: i16,
    pub phy_mode: u32,
    pub auth: AuthType,
    pub crypto: CryptoType,
}

impl ApScanInfo {
    pub fn new(ssid: impl Into<String>, bssid: MacAddress, channel: u8) -> Self {
        Self {
            channel,
            ssid: ssid.into(),
            bssid,
            ..Self::default()
        }
    }

    pub fn with_rssi(mut self, rssi: i16) -> Self {
        self.rssi = rssi;
        self
    }

    pub fn with_security(mut self, auth: AuthType, crypto: CryptoType) -> Self {
        self.auth = auth;
        self.crypto = crypto;
        self
    }

    /// Hidden networks advertise an empty SSID.
    pub fn is_hidden(&self) -> bool {
        self.ssid.is_empty()
    }
}

impl Display for ApScanInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] ch{} {}dBm {}/{}",
            if self.is_hidden() { "<hidden>" } else { self.ssid.as_str() },
            self.bssid,
            self.channel,
            self.rssi,
            self.auth,
            self.crypto
        )
    }
}
