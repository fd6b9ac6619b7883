//! ESP HTTP server glue: every route is answered by [`Portal`].

use std::sync::Arc;

use esp_idf_svc::{
    http::{
        server::{Configuration, EspHttpConnection, EspHttpServer, Request},
        Method,
    },
    io::{Read, Write},
};
use tokio::sync::mpsc::UnboundedSender;

use repeater::captive_portal::router::{CAPTIVE_PROBES, MAX_BODY_LEN};
use repeater::captive_portal::{NetworkScanner, Portal, PortalEvent, PortalRequest};
use repeater::setting::SettingsStore;

pub type EventTx = UnboundedSender<PortalEvent>;

pub fn start<S, N>(
    portal: Arc<Portal<S, N>>,
    evt_tx: EventTx,
) -> anyhow::Result<EspHttpServer<'static>>
where
    S: SettingsStore + Send + 'static,
    N: NetworkScanner + Send + Sync + 'static,
{
    let config = Configuration {
        stack_size: 10240,
        max_uri_handlers: 16,
        uri_match_wildcard: true,
        ..Default::default()
    };

    let mut server = EspHttpServer::new(&config)?;

    let routes: Vec<(&str, Method)> = [
        ("/", Method::Get),
        ("/", Method::Post),
        ("/identify", Method::Get),
        ("/reboot", Method::Get),
        ("/api/status", Method::Get),
    ]
    .into_iter()
    .chain(CAPTIVE_PROBES.iter().map(|probe| (*probe, Method::Get)))
    // wildcard must come last, handlers match in registration order
    .chain([("/*", Method::Get)])
    .collect();

    for (uri, method) in routes {
        let portal = portal.clone();
        let evt_tx = evt_tx.clone();
        server.fn_handler::<anyhow::Error, _>(uri, method, move |req| {
            serve(req, method, &portal, &evt_tx)
        })?;
    }

    log::info!("HTTP server started on 192.168.4.1:80");
    Ok(server)
}

fn serve<S, N>(
    mut req: Request<&mut EspHttpConnection<'_>>,
    method: Method,
    portal: &Portal<S, N>,
    evt_tx: &EventTx,
) -> anyhow::Result<()>
where
    S: SettingsStore,
    N: NetworkScanner,
{
    let uri = req.uri().to_string();
    let (method, body) = match method {
        Method::Post => (http::Method::POST, read_body(&mut req)?),
        _ => (http::Method::GET, Vec::new()),
    };

    let response = portal.handle(&PortalRequest {
        method,
        uri: &uri,
        body: &body,
    });

    let mut headers = vec![("Content-Type", response.content_type)];
    if let Some(location) = response.location {
        headers.push(("Location", location));
    }

    let mut resp = req.into_response(
        response.status.as_u16(),
        response.status.canonical_reason(),
        &headers,
    )?;
    resp.write_all(response.body.as_bytes())?;

    if let Some(event) = response.event {
        if evt_tx.send(event).is_err() {
            log::error!("Failed to send portal event, main loop gone");
        }
    }

    Ok(())
}

/// Reads at most one byte past the limit, enough for the router to refuse an
/// oversized body without buffering it.
fn read_body(req: &mut Request<&mut EspHttpConnection<'_>>) -> anyhow::Result<Vec<u8>> {
    let len = req.content_len().unwrap_or(0) as usize;
    let mut body = vec![0u8; len.min(MAX_BODY_LEN + 1)];
    let mut filled = 0;
    while filled < body.len() {
        let n = req.read(&mut body[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    body.truncate(filled);
    Ok(body)
}
