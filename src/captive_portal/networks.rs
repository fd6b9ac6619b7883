//! Scan results rendered into the `staSSID` selector.

use super::html::escape;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Security {
    Open,
    Protected,
}

/// A single access point seen by a Wi-Fi scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedNetwork {
    pub ssid: String,
    /// Signal strength in dBm.
    pub rssi: i8,
    pub security: Security,
}

impl ScannedNetwork {
    pub fn new(ssid: impl Into<String>, rssi: i8, security: Security) -> Self {
        Self {
            ssid: ssid.into(),
            rssi,
            security,
        }
    }
}

/// Something able to list nearby networks, e.g. the station interface.
pub trait NetworkScanner {
    fn scan(&self) -> anyhow::Result<Vec<ScannedNetwork>>;
}

impl<F> NetworkScanner for F
where
    F: Fn() -> anyhow::Result<Vec<ScannedNetwork>>,
{
    fn scan(&self) -> anyhow::Result<Vec<ScannedNetwork>> {
        self()
    }
}

/// Builds the `<option>` list for the network selector.
///
/// Hidden networks are dropped, an SSID seen on several channels or BSSIDs is
/// listed once with its strongest signal, and the strongest networks come first.
pub fn render_network_options(networks: &[ScannedNetwork]) -> String {
    let mut best: Vec<&ScannedNetwork> = Vec::with_capacity(networks.len());

    for network in networks.iter().filter(|n| !n.ssid.is_empty()) {
        let seen = best.iter().position(|b| b.ssid == network.ssid);
        match seen {
            Some(i) if network.rssi > best[i].rssi => best[i] = network,
            Some(_) => {}
            None => best.push(network),
        }
    }

    best.sort_by(|a, b| b.rssi.cmp(&a.rssi).then_with(|| a.ssid.cmp(&b.ssid)));

    best.into_iter().map(render_option).collect()
}

fn render_option(network: &ScannedNetwork) -> String {
    let ssid = escape(&network.ssid);
    let open = match network.security {
        Security::Open => ", open",
        Security::Protected => "",
    };
    format!(
        r#"<option value="{}">{} ({} dBm{})</option>"#,
        ssid, ssid, network.rssi, open
    )
}
