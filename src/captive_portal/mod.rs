//! Web configuration portal served on the repeater's access point.
//!
//! Templates, form handling and routing live here and stay independent of the
//! HTTP server that carries them.

pub mod form;
pub mod html;
pub mod networks;
pub mod router;
pub mod template;

pub use form::{ConfigForm, FormError};
pub use html::{get_template, Template};
pub use networks::{render_network_options, NetworkScanner, ScannedNetwork, Security};
pub use router::{Portal, PortalEvent, PortalRequest, PortalResponse};
pub use template::{render, Substitutions, TemplateError};
