//! Persisted repeater settings.

/// SSID prefix of the repeater network when none was configured; the MAC
/// suffix is appended.
pub const DEFAULT_AP_SSID_PREFIX: &str = match option_env!("REPEATER_AP_SSID") {
    Some(prefix) => prefix,
    None => "Repeater",
};

/// PSK of the repeater network when none was configured.
pub const DEFAULT_AP_PSK: &str = match option_env!("REPEATER_AP_PSK") {
    Some(psk) => psk,
    None => "repeater",
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Setting {
    /// Upstream network the station joins.
    pub sta_ssid: String,
    pub sta_psk: String,
    /// Repeater network; empty means the defaults above.
    pub ap_ssid: String,
    pub ap_psk: String,
}

impl Setting {
    pub fn is_configured(&self) -> bool {
        !self.sta_ssid.is_empty()
    }

    pub fn effective_ap_ssid(&self, mac_suffix: &str) -> String {
        if self.ap_ssid.is_empty() {
            format!("{}-{}", DEFAULT_AP_SSID_PREFIX, mac_suffix)
        } else {
            self.ap_ssid.clone()
        }
    }

    pub fn effective_ap_psk(&self) -> &str {
        if self.ap_psk.is_empty() {
            DEFAULT_AP_PSK
        } else {
            &self.ap_psk
        }
    }
}

/// Persistent storage for [`Setting`]. The firmware keeps it in NVS.
pub trait SettingsStore {
    fn load(&self) -> anyhow::Result<Setting>;
    fn save(&mut self, setting: &Setting) -> anyhow::Result<()>;
}

#[test]
fn test_effective_ap_defaults() {
    let setting = Setting {
        sta_ssid: "Home".to_string(),
        sta_psk: "secret".to_string(),
        ..Default::default()
    };
    assert!(setting.is_configured());
    assert_eq!(
        setting.effective_ap_ssid("A1B2C3"),
        format!("{}-A1B2C3", DEFAULT_AP_SSID_PREFIX)
    );
    assert_eq!(setting.effective_ap_psk(), DEFAULT_AP_PSK);
    assert!(DEFAULT_AP_PSK.len() >= 8);

    let custom = Setting {
        ap_ssid: "MyRepeater".to_string(),
        ap_psk: "longenough".to_string(),
        ..setting
    };
    assert_eq!(custom.effective_ap_ssid("A1B2C3"), "MyRepeater");
    assert_eq!(custom.effective_ap_psk(), "longenough");
    assert!(!Setting::default().is_configured());
}
