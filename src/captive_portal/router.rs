//! Transport independent request routing for the configuration portal.
//!
//! The firmware's HTTP server hands every request to [`Portal::handle`] and
//! writes back the returned [`PortalResponse`]. Side effects on the device
//! (blinking, rebooting) are reported as a [`PortalEvent`] instead of being
//! performed here.

use std::sync::Mutex;

use http::{Method, StatusCode};
use serde::Serialize;

use super::form::ConfigForm;
use super::html::{self, AVAILABLE_NETWORKS, BODY_CONTENT, ERROR_MESSAGE};
use super::networks::{render_network_options, NetworkScanner};
use super::template::TemplateError;
use crate::setting::{Setting, SettingsStore};

pub const CONTENT_TYPE_HTML: &str = "text/html; charset=UTF-8";
pub const CONTENT_TYPE_TEXT: &str = "text/plain; charset=UTF-8";
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Form posts are a few hundred bytes; larger bodies are refused with 413.
pub const MAX_BODY_LEN: usize = 2048;

/// Where captive portal probes are sent.
pub const PORTAL_LOCATION: &str = "http://192.168.4.1/";

/// Connectivity checks issued by Android, Apple and Windows clients.
pub const CAPTIVE_PROBES: [&str; 5] = [
    "/generate_204",
    "/gen_204",
    "/hotspot-detect.html",
    "/connecttest.txt",
    "/ncsi.txt",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortalEvent {
    /// Blink the status LED so the user can find the device.
    Identify,
    /// New settings were persisted; they apply after the next reboot.
    Saved(Setting),
    Reboot,
}

#[derive(Debug, Clone)]
pub struct PortalRequest<'a> {
    pub method: Method,
    /// Request target; a query string is ignored.
    pub uri: &'a str,
    pub body: &'a [u8],
}

impl<'a> PortalRequest<'a> {
    pub fn get(uri: &'a str) -> Self {
        Self {
            method: Method::GET,
            uri,
            body: &[],
        }
    }

    pub fn post(uri: &'a str, body: &'a [u8]) -> Self {
        Self {
            method: Method::POST,
            uri,
            body,
        }
    }

    pub fn path(&self) -> &'a str {
        self.uri.split(|c: char| c == '?' || c == '#').next().unwrap_or("/")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalResponse {
    pub status: StatusCode,
    pub content_type: &'static str,
    pub location: Option<&'static str>,
    pub body: String,
    pub event: Option<PortalEvent>,
}

impl PortalResponse {
    fn html(status: StatusCode, body: String) -> Self {
        Self {
            status,
            content_type: CONTENT_TYPE_HTML,
            location: None,
            body,
            event: None,
        }
    }

    fn text(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: CONTENT_TYPE_TEXT,
            location: None,
            body: body.into(),
            event: None,
        }
    }

    fn redirect(location: &'static str) -> Self {
        Self {
            status: StatusCode::FOUND,
            content_type: CONTENT_TYPE_TEXT,
            location: Some(location),
            body: format!("Redirecting to {}\r\n", location),
            event: None,
        }
    }

    fn with_event(mut self, event: PortalEvent) -> Self {
        self.event = Some(event);
        self
    }
}

#[derive(Debug, Serialize)]
struct Status<'a> {
    version: &'static str,
    configured: bool,
    sta_ssid: &'a str,
    ap_ssid: Option<&'a str>,
}

/// Wraps a rendered fragment into the page layout.
pub fn page(body: &str) -> Result<String, TemplateError> {
    html::LAYOUT.render(&[(BODY_CONTENT, body)])
}

pub struct Portal<S, N> {
    store: Mutex<S>,
    scanner: N,
}

impl<S: SettingsStore, N: NetworkScanner> Portal<S, N> {
    pub fn new(store: S, scanner: N) -> Self {
        Self {
            store: Mutex::new(store),
            scanner,
        }
    }

    pub fn handle(&self, request: &PortalRequest<'_>) -> PortalResponse {
        let path = request.path();
        log::info!("{} {}", request.method, path);

        let result = match path {
            "/" if request.method == Method::GET => self.config_form(),
            "/" if request.method == Method::POST => self.save(request.body),
            "/identify" if request.method == Method::GET => {
                Ok(PortalResponse::text(StatusCode::OK, "").with_event(PortalEvent::Identify))
            }
            "/reboot" if request.method == Method::GET => self.reboot(),
            "/api/status" if request.method == Method::GET => self.status(),
            "/" | "/identify" | "/reboot" | "/api/status" => Ok(PortalResponse::text(
                StatusCode::METHOD_NOT_ALLOWED,
                "Method Not Allowed",
            )),
            p if CAPTIVE_PROBES.contains(&p) => Ok(PortalResponse::redirect(PORTAL_LOCATION)),
            _ => Ok(PortalResponse::text(StatusCode::NOT_FOUND, "Not Found")),
        };

        result.unwrap_or_else(|e| {
            log::error!("Failed to handle {} {}: {:?}", request.method, path, e);
            PortalResponse::text(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
        })
    }

    fn config_form(&self) -> anyhow::Result<PortalResponse> {
        let options = match self.scanner.scan() {
            Ok(networks) => {
                log::info!("Found {} networks", networks.len());
                render_network_options(&networks)
            }
            Err(e) => {
                log::warn!("Wi-Fi scan failed: {:?}", e);
                String::new()
            }
        };

        let form = html::CONFIG_FORM.render(&[(AVAILABLE_NETWORKS, options)])?;
        Ok(PortalResponse::html(StatusCode::OK, page(&form)?))
    }

    fn save(&self, body: &[u8]) -> anyhow::Result<PortalResponse> {
        if body.len() > MAX_BODY_LEN {
            log::warn!("Rejected {} byte form body", body.len());
            return Ok(PortalResponse::text(
                StatusCode::PAYLOAD_TOO_LARGE,
                "Payload Too Large",
            ));
        }

        let body = String::from_utf8_lossy(body);
        let setting = match ConfigForm::parse(&body).validate() {
            Ok(setting) => setting,
            Err(e) => {
                log::warn!("Rejected configuration: {}", e);
                return Self::error_page(StatusCode::BAD_REQUEST, &e.to_string());
            }
        };

        let saved = self
            .store
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .save(&setting);
        if let Err(e) = saved {
            log::error!("Failed to save configuration: {:?}", e);
            return Self::error_page(
                StatusCode::INTERNAL_SERVER_ERROR,
                "The configuration could not be stored, please try again",
            );
        }

        log::info!("Configuration saved, repeating {:?}", setting.sta_ssid);
        let body = page(html::CONFIG_SAVED.text)?;
        Ok(PortalResponse::html(StatusCode::OK, body).with_event(PortalEvent::Saved(setting)))
    }

    fn reboot(&self) -> anyhow::Result<PortalResponse> {
        let body = page(html::REBOOTING.text)?;
        Ok(PortalResponse::html(StatusCode::OK, body).with_event(PortalEvent::Reboot))
    }

    fn status(&self) -> anyhow::Result<PortalResponse> {
        let setting = self
            .store
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .load()?;

        let json = serde_json::to_string(&Status {
            version: env!("CARGO_PKG_VERSION"),
            configured: setting.is_configured(),
            sta_ssid: &setting.sta_ssid,
            ap_ssid: Some(setting.ap_ssid.as_str()).filter(|s| !s.is_empty()),
        })?;

        Ok(PortalResponse {
            content_type: CONTENT_TYPE_JSON,
            ..PortalResponse::text(StatusCode::OK, json)
        })
    }

    fn error_page(status: StatusCode, message: &str) -> anyhow::Result<PortalResponse> {
        let fragment = html::CONFIG_ERROR.render(&[(ERROR_MESSAGE, html::escape(message))])?;
        Ok(PortalResponse::html(status, page(&fragment)?))
    }
}
