//! NVS backed settings store.

use esp_idf_svc::nvs::{EspDefaultNvs, EspDefaultNvsPartition};

use repeater::captive_portal::form::MAX_PSK_BYTES;
use repeater::setting::{Setting, SettingsStore};

const NVS_NAMESPACE: &str = "repeater";

mod nvs_keys {
    pub const STA_SSID: &str = "sta_ssid";
    pub const STA_PSK: &str = "sta_psk";
    pub const AP_SSID: &str = "ap_ssid";
    pub const AP_PSK: &str = "ap_psk";
}

pub struct NvsStore {
    nvs: EspDefaultNvs,
}

impl NvsStore {
    pub fn new(partition: EspDefaultNvsPartition) -> anyhow::Result<Self> {
        let nvs = EspDefaultNvs::new(partition, NVS_NAMESPACE, true)?;
        Ok(Self { nvs })
    }

    /// A key that was never written reads as empty; any other failure is an error.
    fn get_string(&self, key: &str) -> anyhow::Result<String> {
        // longest stored value plus the NUL terminator
        let mut buf = [0u8; MAX_PSK_BYTES + 1];
        let value = self
            .nvs
            .get_str(key, &mut buf)
            .inspect_err(|e| log::error!("Failed to get {}: {:?}", key, e))?;
        if value.is_none() {
            log::info!("{} not set", key);
        }
        Ok(value.unwrap_or_default().to_string())
    }
}

impl SettingsStore for NvsStore {
    fn load(&self) -> anyhow::Result<Setting> {
        Ok(Setting {
            sta_ssid: self.get_string(nvs_keys::STA_SSID)?,
            sta_psk: self.get_string(nvs_keys::STA_PSK)?,
            ap_ssid: self.get_string(nvs_keys::AP_SSID)?,
            ap_psk: self.get_string(nvs_keys::AP_PSK)?,
        })
    }

    fn save(&mut self, setting: &Setting) -> anyhow::Result<()> {
        self.nvs.set_str(nvs_keys::STA_SSID, &setting.sta_ssid)?;
        self.nvs.set_str(nvs_keys::STA_PSK, &setting.sta_psk)?;
        self.nvs.set_str(nvs_keys::AP_SSID, &setting.ap_ssid)?;
        self.nvs.set_str(nvs_keys::AP_PSK, &setting.ap_psk)?;
        log::info!("Settings written to NVS namespace {}", NVS_NAMESPACE);
        Ok(())
    }
}
