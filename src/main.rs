use std::sync::{Arc, Mutex};
use std::time::Duration;

use esp_idf_svc::eventloop::EspSystemEventLoop;

use repeater::captive_portal::{Portal, PortalEvent};
use repeater::identify::{BlinkPattern, Identifier};
use repeater::link::{self, Retry};
use repeater::setting::{Setting, SettingsStore};

mod led;
mod network;
mod server;
mod storage;

/// Lets the HTTP response reach the browser before the restart.
const REBOOT_DELAY: Duration = Duration::from_secs(2);
const LINK_CHECK_INTERVAL: Duration = Duration::from_secs(30);

fn main() -> anyhow::Result<()> {
    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();
    let peripherals = esp_idf_svc::hal::prelude::Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let partition = esp_idf_svc::nvs::EspDefaultNvsPartition::take()?;

    let store = storage::NvsStore::new(partition)?;
    let setting = store.load().unwrap_or_else(|e| {
        log::error!("Failed to load settings, starting unconfigured: {:?}", e);
        Setting::default()
    });
    log::info!("STA SSID: {:?}", setting.sta_ssid);
    log::info!("AP SSID: {:?}", setting.ap_ssid);

    let mac_suffix = network::mac_suffix();
    let radio = network::start(peripherals.modem, sysloop, &setting, &mac_suffix)?;
    let radio = Arc::new(Mutex::new(radio));

    if setting.is_configured() {
        log::info!("Joining upstream network {:?}", setting.sta_ssid);
        match link::connect_with_retry(&radio, Retry::DEFAULT) {
            Ok(()) => log::info!("Repeating {:?}", setting.sta_ssid),
            Err(e) => log::warn!("Upstream network unavailable, portal only: {:?}", e),
        }
        let _monitor = link::spawn_monitor(radio.clone(), LINK_CHECK_INTERVAL, Retry::DEFAULT)?;
    } else {
        log::info!("No upstream network configured, portal only");
    }

    let (evt_tx, mut evt_rx) = tokio::sync::mpsc::unbounded_channel();
    let portal = Arc::new(Portal::new(store, network::WifiScanner(radio.clone())));
    let _server = server::start(portal, evt_tx)?;

    let status_led = led::Led::new(peripherals.pins.gpio2)?;
    let identifier = Identifier::new(status_led);

    log_heap();

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    rt.block_on(async {
        while let Some(event) = evt_rx.recv().await {
            match event {
                PortalEvent::Identify => {
                    let _ = identifier.trigger(BlinkPattern::IDENTIFY);
                }
                PortalEvent::Saved(saved) => {
                    log::info!(
                        "New settings stored (STA {:?}, AP {:?}), applied after reboot",
                        saved.sta_ssid,
                        saved.ap_ssid
                    );
                }
                PortalEvent::Reboot => {
                    log::info!("Reboot requested from portal");
                    tokio::time::sleep(REBOOT_DELAY).await;
                    return;
                }
            }
        }
        log::error!("Portal event channel closed");
    });

    unsafe { esp_idf_svc::sys::esp_restart() }
}

pub fn log_heap() {
    unsafe {
        use esp_idf_svc::sys::{heap_caps_get_free_size, MALLOC_CAP_INTERNAL};

        log::info!(
            "Free INTERNAL heap size: {}KB",
            heap_caps_get_free_size(MALLOC_CAP_INTERNAL) / 1024
        );
    }
}
