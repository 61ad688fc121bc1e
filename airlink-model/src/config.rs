use crate::access_point::{AuthType, CryptoType, MAX_SSID_LEN};
use crate::error::{ModelError, Result};

/// Longest passphrase (or raw PSK hex string) the link layer accepts, in bytes.
pub const MAX_PASSPHRASE_LEN: usize = 64;

/// Station-mode join request.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ApConfig {
    ssid: String,
    passphrase: String,
    auth: AuthType,
    crypto: CryptoType,
}

impl ApConfig {
    pub fn new(
        ssid: impl Into<String>,
        passphrase: impl Into<String>,
        auth: AuthType,
        crypto: CryptoType,
    ) -> Result<Self> {
        let ssid = ssid.into();
        let passphrase = passphrase.into();
        validate_credentials(&ssid, &passphrase, auth)?;
        Ok(Self {
            ssid,
            passphrase,
            auth,
            crypto,
        })
    }

    /// Convenience constructor for networks without security.
    pub fn open(ssid: impl Into<String>) -> Result<Self> {
        Self::new(ssid, "", AuthType::Open, CryptoType::None)
    }

    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    pub fn passphrase(&self) -> &str {
        &self.passphrase
    }

    pub fn auth(&self) -> AuthType {
        self.auth
    }

    pub fn crypto(&self) -> CryptoType {
        self.crypto
    }
}

/// Soft access point (hotspot) parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SoftApConfig {
    ap: ApConfig,
    channel: u8,
}

impl SoftApConfig {
    pub fn new(ap: ApConfig, channel: u8) -> Result<Self> {
        if !(1..=14).contains(&channel) {
            return Err(ModelError::InvalidChannel(channel));
        }
        Ok(Self { ap, channel })
    }

    pub fn ap(&self) -> &ApConfig {
        &self.ap
    }

    pub fn ssid(&self) -> &str {
        self.ap.ssid()
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }
}

fn validate_credentials(ssid: &str, passphrase: &str, auth: AuthType) -> Result<()> {
    if ssid.is_empty() || ssid.len() > MAX_SSID_LEN {
        return Err(ModelError::SsidLength(ssid.len()));
    }
    if passphrase.len() > MAX_PASSPHRASE_LEN {
        return Err(ModelError::PassphraseLength(passphrase.len()));
    }
    if auth.requires_passphrase() && passphrase.is_empty() {
        return Err(ModelError::MissingPassphrase);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ssid_bounds_are_enforced() {
        assert_eq!(ApConfig::open("").unwrap_err(), ModelError::SsidLength(0));
        let long = "x".repeat(MAX_SSID_LEN + 1);
        assert_eq!(
            ApConfig::open(long).unwrap_err(),
            ModelError::SsidLength(MAX_SSID_LEN + 1)
        );
        assert!(ApConfig::open("x".repeat(MAX_SSID_LEN)).is_ok());
    }

    #[test]
    fn secured_network_needs_passphrase() {
        let err = ApConfig::new("home", "", AuthType::Wpa2Psk, CryptoType::Aes)
            .unwrap_err();
        assert_eq!(err, ModelError::MissingPassphrase);

        let too_long = "p".repeat(MAX_PASSPHRASE_LEN + 1);
        let err = ApConfig::new("home", too_long, AuthType::Wpa2Psk, CryptoType::Aes)
            .unwrap_err();
        assert_eq!(err, ModelError::PassphraseLength(MAX_PASSPHRASE_LEN + 1));
    }

    #[test]
    fn soft_ap_channel_must_be_in_band() {
        let ap = ApConfig::open("hotspot").unwrap();
        assert_eq!(
            SoftApConfig::new(ap.clone(), 0).unwrap_err(),
            ModelError::InvalidChannel(0)
        );
        assert_eq!(
            SoftApConfig::new(ap.clone(), 15).unwrap_err(),
            ModelError::InvalidChannel(15)
        );
        let soft_ap = SoftApConfig::new(ap, 11).unwrap();
        assert_eq!(soft_ap.ssid(), "hotspot");
        assert_eq!(soft_ap.channel(), 11);
    }
}
