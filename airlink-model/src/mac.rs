use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// IEEE 802 hardware address (BSSID or station MAC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MacAddress(pub [u8; 6]);

impl MacAddress {
    pub const fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    pub fn octets(&self) -> [u8; 6] {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0; 6]
    }
}

impl From<[u8; 6]> for MacAddress {
    fn from(octets: [u8; 6]) -> Self {
        Self(octets)
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl FromStr for MacAddress {
    type Err = ModelError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let mut octets = [0u8; 6];
        let mut parts = raw.split([':', '-']);
        for slot in octets.iter_mut() {
            let part = parts
                .next()
                .ok_or_else(|| ModelError::InvalidMacAddress(raw.to_string()))?;
            if part.len() != 2 || !part.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(ModelError::InvalidMacAddress(raw.to_string()));
            }
            *slot = u8::from_str_radix(part, 16)
                .map_err(|_| ModelError::InvalidMacAddress(raw.to_string()))?;
        }
        if parts.next().is_some() {
            return Err(ModelError::InvalidMacAddress(raw.to_string()));
        }
        Ok(Self(octets))
    }
}
