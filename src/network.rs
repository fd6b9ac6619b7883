//! SoftAP + station bring-up
//!
//! The access point always runs at 192.168.4.1 so the portal stays reachable.
//! When an upstream network is configured the station joins it and NAPT
//! forwards AP clients through it.

use std::sync::{Arc, Mutex};

use esp_idf_svc::{
    eventloop::EspSystemEventLoop,
    hal::modem::Modem,
    ipv4::{self, Mask, Subnet},
    netif::{EspNetif, NetifConfiguration, NetifStack},
    wifi::{
        AccessPointConfiguration, AuthMethod, BlockingWifi, ClientConfiguration,
        Configuration as WifiConfig, EspWifi, WifiDriver,
    },
};

use repeater::captive_portal::{NetworkScanner, ScannedNetwork, Security};
use repeater::link::Uplink;
use repeater::setting::Setting;

/// Portal address, also the DHCP gateway handed to AP clients.
const AP_IP: ipv4::Ipv4Addr = ipv4::Ipv4Addr::new(192, 168, 4, 1);
const AP_NETMASK: Mask = Mask(24);
const AP_DNS: ipv4::Ipv4Addr = ipv4::Ipv4Addr::new(1, 1, 1, 1);
const AP_SECONDARY_DNS: ipv4::Ipv4Addr = ipv4::Ipv4Addr::new(8, 8, 8, 8);

pub type Wifi = BlockingWifi<EspWifi<'static>>;

/// The shared radio: station uplink and scanner.
pub struct Radio(pub Wifi);

/// Last three bytes of the station MAC, e.g. `A1B2C3`.
pub fn mac_suffix() -> String {
    let mut mac = [0u8; 6];
    unsafe {
        esp_idf_svc::sys::esp_read_mac(
            mac.as_mut_ptr(),
            esp_idf_svc::sys::esp_mac_type_t_ESP_MAC_WIFI_STA,
        );
    }
    format!("{:02X}{:02X}{:02X}", mac[3], mac[4], mac[5])
}

pub fn start(
    modem: Modem,
    sysloop: EspSystemEventLoop,
    setting: &Setting,
    mac_suffix: &str,
) -> anyhow::Result<Radio> {
    let ap_netif_config = NetifConfiguration {
        ip_configuration: Some(ipv4::Configuration::Router(ipv4::RouterConfiguration {
            subnet: Subnet {
                gateway: AP_IP,
                mask: AP_NETMASK,
            },
            dhcp_enabled: true,
            dns: Some(AP_DNS),
            secondary_dns: Some(AP_SECONDARY_DNS),
        })),
        ..NetifConfiguration::wifi_default_router()
    };
    let ap_netif = EspNetif::new_with_conf(&ap_netif_config)?;
    let sta_netif = EspNetif::new(NetifStack::Sta)?;
    let driver = WifiDriver::new(modem, sysloop.clone(), None)?;

    let mut wifi = BlockingWifi::wrap(EspWifi::wrap_all(driver, sta_netif, ap_netif)?, sysloop)?;

    let ap_ssid = setting.effective_ap_ssid(mac_suffix);
    let ap_config = AccessPointConfiguration {
        ssid: ap_ssid
            .as_str()
            .try_into()
            .map_err(|_| anyhow::anyhow!("AP SSID too long: {}", ap_ssid))?,
        password: setting
            .effective_ap_psk()
            .try_into()
            .map_err(|_| anyhow::anyhow!("AP PSK too long"))?,
        ssid_hidden: false,
        channel: 1,
        auth_method: AuthMethod::WPA2Personal,
        max_connections: 4,
        ..Default::default()
    };

    // The station interface is needed for scanning even before anything is configured.
    let client_config = ClientConfiguration {
        ssid: setting
            .sta_ssid
            .as_str()
            .try_into()
            .map_err(|_| anyhow::anyhow!("STA SSID too long: {}", setting.sta_ssid))?,
        password: setting
            .sta_psk
            .as_str()
            .try_into()
            .map_err(|_| anyhow::anyhow!("STA PSK too long"))?,
        auth_method: if setting.sta_psk.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        },
        ..Default::default()
    };

    wifi.set_configuration(&WifiConfig::Mixed(client_config, ap_config))?;
    wifi.start()?;
    log::info!("SoftAP started: {}", ap_ssid);

    Ok(Radio(wifi))
}

impl Uplink for Radio {
    fn is_connected(&mut self) -> anyhow::Result<bool> {
        Ok(self.0.is_connected()?)
    }

    /// Joins the configured upstream network and turns on forwarding.
    fn connect(&mut self) -> anyhow::Result<()> {
        let wifi = &mut self.0;
        if let Err(e) = wifi.connect().and_then(|_| wifi.wait_netif_up()) {
            if let Err(reset) = wifi.disconnect() {
                log::warn!("Failed to reset station after failed attempt: {:?}", reset);
            }
            return Err(e.into());
        }

        let ip = wifi.wifi().sta_netif().get_ip_info()?;
        log::info!("Station up: {:?}", ip);
        wifi.wifi_mut().ap_netif_mut().enable_napt(true);
        log::info!("NAPT enabled on {}", AP_IP);
        Ok(())
    }
}

/// Scans from the station interface of the shared driver.
#[derive(Clone)]
pub struct WifiScanner(pub Arc<Mutex<Radio>>);

impl NetworkScanner for WifiScanner {
    fn scan(&self) -> anyhow::Result<Vec<ScannedNetwork>> {
        let mut wifi = self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let found = wifi.0.scan()?;
        Ok(found
            .into_iter()
            .map(|ap| {
                let security = match ap.auth_method {
                    None | Some(AuthMethod::None) => Security::Open,
                    Some(_) => Security::Protected,
                };
                ScannedNetwork::new(ap.ssid.as_str(), ap.signal_strength, security)
            })
            .collect())
    }
}
