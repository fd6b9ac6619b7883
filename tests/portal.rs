use std::collections::HashMap;

use http::StatusCode;
use repeater::captive_portal::html::{
    self, AVAILABLE_NETWORKS, BODY_CONTENT, CONFIG_FORM, CONFIG_SAVED, LAYOUT,
};
use repeater::captive_portal::router::MAX_BODY_LEN;
use repeater::captive_portal::{
    get_template, render, Portal, PortalEvent, PortalRequest, ScannedNetwork, Security,
    TemplateError,
};
use repeater::setting::{Setting, SettingsStore};

#[derive(Default)]
struct MemoryStore {
    setting: Setting,
    fail_saves: bool,
    fail_loads: bool,
}

impl SettingsStore for MemoryStore {
    fn load(&self) -> anyhow::Result<Setting> {
        if self.fail_loads {
            anyhow::bail!("nvs read failed");
        }
        Ok(self.setting.clone())
    }

    fn save(&mut self, setting: &Setting) -> anyhow::Result<()> {
        if self.fail_saves {
            anyhow::bail!("nvs full");
        }
        self.setting = setting.clone();
        Ok(())
    }
}

type Scanner = fn() -> anyhow::Result<Vec<ScannedNetwork>>;

fn two_networks() -> anyhow::Result<Vec<ScannedNetwork>> {
    Ok(vec![
        ScannedNetwork::new("Office", -71, Security::Protected),
        ScannedNetwork::new("Home & Garden", -48, Security::Protected),
    ])
}

fn broken_radio() -> anyhow::Result<Vec<ScannedNetwork>> {
    anyhow::bail!("radio off")
}

fn portal(store: MemoryStore, scanner: Scanner) -> Portal<MemoryStore, Scanner> {
    Portal::new(store, scanner)
}

fn assert_no_tokens(document: &str) {
    for t in html::TEMPLATES {
        for name in t.placeholders() {
            assert!(
                !document.contains(&format!("%{}%", name)),
                "unsubstituted %{}% in output",
                name
            );
        }
    }
}

#[test]
fn every_template_is_non_empty_with_well_formed_tokens() {
    for name in ["layout", "config_form", "config_saved", "config_error", "rebooting"] {
        let template = get_template(name).unwrap();
        assert!(!template.text.is_empty());
        for placeholder in template.placeholders() {
            assert!(placeholder
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_'));
        }
    }
    assert_eq!(
        get_template("index"),
        Err(TemplateError::NotFound("index".to_string()))
    );
}

#[test]
fn layout_receives_body_content_verbatim() {
    let body = "<p>hello</p>";
    let document = render(LAYOUT.text, &[(BODY_CONTENT, body)]).unwrap();
    assert!(document.contains(body));
    assert!(!document.contains("%BODY_CONTENT%"));
    // CSS percentages are not tokens
    assert!(document.contains("width:100%;"));
}

#[test]
fn saved_fragment_renders_unchanged() {
    let empty: HashMap<&str, &str> = HashMap::new();
    assert_eq!(render(CONFIG_SAVED.text, &empty).unwrap(), CONFIG_SAVED.text);
    assert_eq!(
        CONFIG_SAVED
            .render(&[(BODY_CONTENT, "x"), (AVAILABLE_NETWORKS, "y")])
            .unwrap(),
        CONFIG_SAVED.text
    );
}

#[test]
fn missing_substitution_is_an_error() {
    let empty: [(&str, &str); 0] = [];
    for _ in 0..2 {
        assert_eq!(
            LAYOUT.render(&empty),
            Err(TemplateError::MissingSubstitution {
                placeholder: BODY_CONTENT.to_string()
            })
        );
    }
}

#[test]
fn config_form_gets_exactly_the_given_options() {
    let form = CONFIG_FORM
        .render(&[(AVAILABLE_NETWORKS, "<option>Net1</option>")])
        .unwrap();
    assert_eq!(form.matches("<option>Net1</option>").count(), 1);
    assert!(form.contains(r#"<select name="staSSID" required><option></option><option>Net1</option></select>"#));
    assert!(!form.contains("%AVAILABLE_NETWORKS%"));
}

#[test]
fn percent_in_body_content_is_not_resubstituted() {
    let body = "100% done %BODY_CONTENT% %AVAILABLE_NETWORKS%";
    let document = LAYOUT.render(&[(BODY_CONTENT, body)]).unwrap();
    assert!(document.contains(body));
    assert_eq!(document.matches("%BODY_CONTENT%").count(), 1);
}

#[test]
fn index_lists_scanned_networks() {
    let portal = portal(MemoryStore::default(), two_networks);
    let response = portal.handle(&PortalRequest::get("/?refresh=1"));

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.event, None);
    assert!(response.body.starts_with("<!DOCTYPE html>"));
    let home = response
        .body
        .find(r#"<option value="Home &amp; Garden">Home &amp; Garden (-48 dBm)</option>"#)
        .unwrap();
    let office = response.body.find(r#"<option value="Office">"#).unwrap();
    assert!(home < office);
    assert_no_tokens(&response.body);
}

#[test]
fn index_survives_scan_failure() {
    let portal = portal(MemoryStore::default(), broken_radio);
    let response = portal.handle(&PortalRequest::get("/"));

    assert_eq!(response.status, StatusCode::OK);
    assert!(response
        .body
        .contains(r#"<select name="staSSID" required><option></option></select>"#));
}

#[test]
fn valid_post_saves_and_confirms() {
    let portal = portal(MemoryStore::default(), two_networks);
    let response = portal.handle(&PortalRequest::post(
        "/",
        b"staSSID=Office&staPSK=secret1&apSSID=MyRepeater1&apPSK=12345678",
    ));

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Configuration saved!"));
    assert_no_tokens(&response.body);

    let expected = Setting {
        sta_ssid: "Office".to_string(),
        sta_psk: "secret1".to_string(),
        ap_ssid: "MyRepeater1".to_string(),
        ap_psk: "12345678".to_string(),
    };
    assert_eq!(response.event, Some(PortalEvent::Saved(expected.clone())));

    let status = portal.handle(&PortalRequest::get("/api/status"));
    assert_eq!(status.content_type, "application/json");
    let json: serde_json::Value = serde_json::from_str(&status.body).unwrap();
    assert_eq!(json["configured"], true);
    assert_eq!(json["sta_ssid"], "Office");
    assert_eq!(json["ap_ssid"], "MyRepeater1");
    assert!(!status.body.contains("secret1"));
}

#[test]
fn invalid_post_is_rejected_with_escaped_message() {
    let portal = portal(MemoryStore::default(), two_networks);
    let response = portal.handle(&PortalRequest::post("/", b"staSSID=Office&staPSK=123"));

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.event, None);
    assert!(response.body.contains("PSK must be 5 to 30 characters"));
    assert_no_tokens(&response.body);

    let status = portal.handle(&PortalRequest::get("/api/status"));
    let json: serde_json::Value = serde_json::from_str(&status.body).unwrap();
    assert_eq!(json["configured"], false);
    assert_eq!(json["ap_ssid"], serde_json::Value::Null);
}

#[test]
fn store_failure_is_reported() {
    let store = MemoryStore {
        fail_saves: true,
        ..Default::default()
    };
    let portal = portal(store, two_networks);
    let response = portal.handle(&PortalRequest::post("/", b"staSSID=Office&staPSK=secret1"));

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.event, None);
    assert!(response.body.contains("could not be stored"));
}

#[test]
fn status_reports_load_failure() {
    let store = MemoryStore {
        setting: Setting {
            sta_ssid: "Office".to_string(),
            sta_psk: "secret1".to_string(),
            ..Default::default()
        },
        fail_loads: true,
        ..Default::default()
    };
    let portal = portal(store, two_networks);
    let response = portal.handle(&PortalRequest::get("/api/status"));

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!response.body.contains("configured"));
}

#[test]
fn oversized_post_is_refused() {
    let portal = portal(MemoryStore::default(), two_networks);
    let mut body = b"staSSID=Office&staPSK=secret1&pad=".to_vec();
    body.resize(MAX_BODY_LEN + 1, b'x');

    let response = portal.handle(&PortalRequest::post("/", &body));
    assert_eq!(response.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(response.event, None);

    body.truncate(MAX_BODY_LEN);
    let response = portal.handle(&PortalRequest::post("/", &body));
    assert_eq!(response.status, StatusCode::OK);
    assert!(matches!(response.event, Some(PortalEvent::Saved(_))));
}

#[test]
fn identify_and_reboot_emit_events() {
    let portal = portal(MemoryStore::default(), two_networks);

    let identify = portal.handle(&PortalRequest::get("/identify"));
    assert_eq!(identify.status, StatusCode::OK);
    assert!(identify.body.is_empty());
    assert_eq!(identify.event, Some(PortalEvent::Identify));

    let reboot = portal.handle(&PortalRequest::get("/reboot"));
    assert_eq!(reboot.status, StatusCode::OK);
    assert!(reboot.body.contains("Rebooting..."));
    assert_eq!(reboot.event, Some(PortalEvent::Reboot));
}

#[test]
fn probes_redirect_and_unknown_paths_404() {
    let portal = portal(MemoryStore::default(), two_networks);

    let probe = portal.handle(&PortalRequest::get("/generate_204"));
    assert_eq!(probe.status, StatusCode::FOUND);
    assert_eq!(probe.location, Some("http://192.168.4.1/"));

    let missing = portal.handle(&PortalRequest::get("/favicon.ico"));
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    let wrong_method = portal.handle(&PortalRequest::post("/reboot", b""));
    assert_eq!(wrong_method.status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(wrong_method.event, None);
}
