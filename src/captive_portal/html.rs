//! Embedded HTML templates for the configuration portal.
//!
//! Every template is a `&'static str` compiled into flash. Placeholders use the
//! `%NAME%` syntax and are filled in by [`super::template::render`].

use super::template::{self, Substitutions, TemplateError};

/// Placeholder in [`LAYOUT`] receiving the page body.
pub const BODY_CONTENT: &str = "BODY_CONTENT";
/// Placeholder in [`CONFIG_FORM`] receiving the `<option>` list of scanned networks.
pub const AVAILABLE_NETWORKS: &str = "AVAILABLE_NETWORKS";
/// Placeholder in [`CONFIG_ERROR`] receiving the escaped validation message.
pub const ERROR_MESSAGE: &str = "ERROR_MESSAGE";

pub const LAYOUT_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
<title>Portable Wi-Fi Repeater</title>
<meta http-equiv="Content-Type" content="text/html; charset=UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<style>
* { font-family:sans-serif; font-size:14px; }
body { background-color:#328f8a; }
h1 { font-size:22px; color:#FFF; text-align:center; }
h3 { font-size:18px; text-align:center; }
input, select { outline:0; background:#f2f2f2; width:100%; border:1px solid #30ee30; margin:0 0 0px; padding:15px; box-sizing:border-box; font-size:14px; }
  input:invalid, select:invalid { border:1px solid #ee3030; }
  input[type=checkbox] { width:auto; margin-right:6px; vertical-align:middle; }
#customRepeaterWifiNetwork:not(:checked) ~ #customRepeaterWifiNetworkBox { display:none; }
#customRepeaterWifiNetwork:checked ~ #customRepeaterWifiNetworkBox { display:block; }
button { outline:0; background-color:#328f8a; width:100%; border:0; padding:15px; color:#FFF; font-size:14px; cursor:pointer; }
  button.small { width:auto; padding:3px 6px; font-size:12px; }
.tip { text-align:left; color:#666; font-size:12px; }
.error { color:#ee3030; }
.box { background:#FFF; max-width:360px; margin:30px auto; padding:15px 45px; text-align:center; box-shadow:0 0 20px 0 rgba(0, 0, 0, 0.2), 0 5px 5px 0 rgba(0, 0, 0, 0.24); }
  .box .item { margin-bottom:15px; }
</style>
<script>
function openAsync(url) {
  const xhttp = new XMLHttpRequest();
  xhttp.open("GET", url, true);
  xhttp.send();
}
</script>
</head>

<body>
<h1>Portable Wi-Fi Repeater Configuration</h1>
%BODY_CONTENT%
</body>
</html>
"#;

pub const CONFIG_FORM_HTML: &str = r#"<form action="/" method="POST" onsubmit="return confirm('Save configuration?');">
  <div class="box">
    <h3>Select the Wi-Fi Network to repeat</h3>
    <p><button type="button" class="small" onclick="openAsync('/identify');">Identify device (20 fast blinks)</button></p>
    <div class="item">
      <select name="staSSID" required><option></option>%AVAILABLE_NETWORKS%</select>
      <div class="tip">Select the Wi-Fi Network to be repeated <button type="button" class="small" onclick="location.reload(true);">Refresh</button></div>
    </div>
    <div class="item">
      <input name="staPSK" type="password" placeholder="PSK" pattern=".{5,30}" required>
      <div class="tip">Enter the PSK</div>
    </div>
  </div>
  <div class="box">
    <input type="checkbox" id="customRepeaterWifiNetwork"><label for="customRepeaterWifiNetwork">Customize Repeater Wi-Fi Network</label>
    <div id="customRepeaterWifiNetworkBox">
      <h3>Repeater Wi-Fi Network</h3>
      <div class="item">
        <input name="apSSID" type="text" placeholder="Repeater Wi-Fi Network" pattern="[A-Za-z0-9]{8,}">
        <div class="tip">Enter the Wi-Fi Network name to be created</div>
      </div>
      <div class="item">
        <input name="apPSK" type="password" placeholder="PSK" pattern=".{8,30}">
        <div class="tip">Enter the PSK</div>
      </div>
    </div>
  </div>
  <div class="box">
    <button type="submit">Save</button>
  </div>
</form>
"#;

pub const CONFIG_SAVED_HTML: &str = r#"<div class="box">
  <h3>Configuration saved!</h3>
  <p><button type="button" onclick="location.href='/reboot';">Reboot</button></p>
</div>
"#;

pub const CONFIG_ERROR_HTML: &str = r#"<div class="box">
  <h3>Configuration not saved</h3>
  <p class="error">%ERROR_MESSAGE%</p>
  <p><button type="button" onclick="location.href='/';">Back</button></p>
</div>
"#;

pub const REBOOTING_HTML: &str = r#"<div class="box">
  <h3>Rebooting...</h3>
  <p>Reconnect to the repeater Wi-Fi network once the device is back online.</p>
</div>
"#;

/// A named, immutable page template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Template {
    pub name: &'static str,
    pub text: &'static str,
}

pub static LAYOUT: Template = Template {
    name: "layout",
    text: LAYOUT_HTML,
};

pub static CONFIG_FORM: Template = Template {
    name: "config_form",
    text: CONFIG_FORM_HTML,
};

pub static CONFIG_SAVED: Template = Template {
    name: "config_saved",
    text: CONFIG_SAVED_HTML,
};

pub static CONFIG_ERROR: Template = Template {
    name: "config_error",
    text: CONFIG_ERROR_HTML,
};

pub static REBOOTING: Template = Template {
    name: "rebooting",
    text: REBOOTING_HTML,
};

pub static TEMPLATES: [&Template; 5] = [
    &LAYOUT,
    &CONFIG_FORM,
    &CONFIG_SAVED,
    &CONFIG_ERROR,
    &REBOOTING,
];

/// Looks up a template by name.
pub fn get_template(name: &str) -> Result<&'static Template, TemplateError> {
    TEMPLATES
        .iter()
        .copied()
        .find(|t| t.name == name)
        .ok_or_else(|| TemplateError::NotFound(name.to_string()))
}

impl Template {
    /// Placeholder names declared by this template, in order of first appearance.
    pub fn placeholders(&self) -> Vec<&'static str> {
        template::placeholders(self.text)
    }

    pub fn render<S: Substitutions + ?Sized>(
        &self,
        substitutions: &S,
    ) -> Result<String, TemplateError> {
        template::render(self.text, substitutions).inspect_err(|e| {
            log::error!("Failed to render template {}: {}", self.name, e);
        })
    }
}

/// Escapes text for use inside HTML element content or a quoted attribute.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[test]
fn test_templates_declare_expected_placeholders() {
    assert_eq!(LAYOUT.placeholders(), vec![BODY_CONTENT]);
    assert_eq!(CONFIG_FORM.placeholders(), vec![AVAILABLE_NETWORKS]);
    assert_eq!(CONFIG_ERROR.placeholders(), vec![ERROR_MESSAGE]);
    assert!(CONFIG_SAVED.placeholders().is_empty());
    assert!(REBOOTING.placeholders().is_empty());
}

#[test]
fn test_get_template() {
    for t in TEMPLATES {
        let found = get_template(t.name).unwrap();
        assert_eq!(found, t);
        assert!(!found.text.trim().is_empty());
    }

    match get_template("missing") {
        Err(TemplateError::NotFound(name)) => assert_eq!(name, "missing"),
        other => panic!("Unexpected lookup result: {:?}", other),
    }
}

#[test]
fn test_escape() {
    assert_eq!(
        escape(r#"<b>"Tom" & 'Jerry'</b>"#),
        "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
    );
    assert_eq!(escape("plain"), "plain");
}
