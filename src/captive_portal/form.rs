//! Server-side re-validation of the configuration form.
//!
//! The browser checks the same rules through `required` and `pattern`
//! attributes, but a POST can come from anywhere.

use thiserror::Error;

use crate::setting::Setting;

/// Longest SSID allowed by 802.11.
pub const MAX_SSID_BYTES: usize = 32;

/// Longest WPA2 passphrase; also what the driver configuration can hold.
pub const MAX_PSK_BYTES: usize = 63;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("Select the Wi-Fi network to repeat")]
    MissingStaSsid,

    #[error("The Wi-Fi network name is longer than 32 bytes")]
    StaSsidTooLong,

    #[error("The Wi-Fi network PSK must be 5 to 30 characters long")]
    InvalidStaPsk,

    #[error("The repeater network name must be 8 to 32 letters or digits")]
    InvalidApSsid,

    #[error("The repeater network PSK must be 8 to 30 characters long")]
    InvalidApPsk,

    #[error("PSKs are limited to 63 bytes, use fewer non-ASCII characters")]
    PskTooLong,
}

/// Raw fields of a submitted configuration form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigForm {
    pub sta_ssid: String,
    pub sta_psk: String,
    pub ap_ssid: String,
    pub ap_psk: String,
}

impl ConfigForm {
    /// Parses an `application/x-www-form-urlencoded` body. Unknown keys are ignored.
    pub fn parse(body: &str) -> Self {
        let mut form = Self::default();

        for pair in body.split('&').filter(|p| !p.is_empty()) {
            let mut parts = pair.splitn(2, '=');
            let key = parts.next().unwrap_or("");
            let value = decode_component(parts.next().unwrap_or(""));

            match key {
                "staSSID" => form.sta_ssid = value,
                "staPSK" => form.sta_psk = value,
                "apSSID" => form.ap_ssid = value,
                "apPSK" => form.ap_psk = value,
                _ => log::debug!("Ignoring form field {}", key),
            }
        }

        form
    }

    /// Checks the fields in form order and returns the settings to persist.
    pub fn validate(&self) -> Result<Setting, FormError> {
        if self.sta_ssid.is_empty() {
            return Err(FormError::MissingStaSsid);
        }
        if self.sta_ssid.len() > MAX_SSID_BYTES {
            return Err(FormError::StaSsidTooLong);
        }
        if !(5..=30).contains(&self.sta_psk.chars().count()) {
            return Err(FormError::InvalidStaPsk);
        }
        if self.sta_psk.len() > MAX_PSK_BYTES {
            return Err(FormError::PskTooLong);
        }

        if !self.ap_ssid.is_empty()
            && !((8..=MAX_SSID_BYTES).contains(&self.ap_ssid.len())
                && self.ap_ssid.chars().all(|c| c.is_ascii_alphanumeric()))
        {
            return Err(FormError::InvalidApSsid);
        }
        if !self.ap_psk.is_empty() && !(8..=30).contains(&self.ap_psk.chars().count()) {
            return Err(FormError::InvalidApPsk);
        }
        if self.ap_psk.len() > MAX_PSK_BYTES {
            return Err(FormError::PskTooLong);
        }

        Ok(Setting {
            sta_ssid: self.sta_ssid.clone(),
            sta_psk: self.sta_psk.clone(),
            ap_ssid: self.ap_ssid.clone(),
            ap_psk: self.ap_psk.clone(),
        })
    }
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    String::from_utf8_lossy(&urlencoding::decode_binary(spaced.as_bytes())).into_owned()
}
