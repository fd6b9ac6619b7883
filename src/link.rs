//! Upstream link supervision.
//!
//! The radio is shared with the portal's scanner, so the lock is only held for
//! a single connection attempt and never while waiting between attempts.

use std::sync::{Arc, Mutex};
use std::time::Duration;

/// The station side of the radio.
pub trait Uplink {
    fn is_connected(&mut self) -> anyhow::Result<bool>;
    /// One connection attempt, including waiting for an address.
    fn connect(&mut self) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retry {
    pub attempts: u32,
    pub interval: Duration,
}

impl Retry {
    pub const DEFAULT: Self = Self {
        attempts: 3,
        interval: Duration::from_secs(5),
    };
}

/// Runs up to `retry.attempts` connection attempts, locking `link` for each
/// one separately. Returns the error of the last attempt.
pub fn connect_with_retry<L: Uplink>(link: &Mutex<L>, retry: Retry) -> anyhow::Result<()> {
    let mut last_error = None;
    for attempt in 1..=retry.attempts {
        log::info!("Connecting upstream ({}/{})", attempt, retry.attempts);
        let result = link
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .connect();
        match result {
            Ok(()) => return Ok(()),
            Err(e) => {
                log::warn!("Connection attempt failed: {:?}", e);
                last_error = Some(e);
            }
        }
        if attempt < retry.attempts {
            std::thread::sleep(retry.interval);
        }
    }
    Err(last_error.unwrap_or_else(|| anyhow::anyhow!("no connection attempts configured")))
}

/// Reconnects if the link dropped. Returns whether it is up afterwards.
pub fn ensure_connected<L: Uplink>(link: &Mutex<L>, retry: Retry) -> bool {
    let connected = link
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .is_connected();
    match connected {
        Ok(true) => return true,
        Ok(false) => log::warn!("Upstream link lost, reconnecting"),
        Err(e) => log::warn!("Failed to query upstream link, reconnecting: {:?}", e),
    }
    connect_with_retry(link, retry)
        .inspect_err(|e| log::error!("Upstream still down: {:?}", e))
        .is_ok()
}

/// Checks the link every `period` on its own thread, away from the event loop.
pub fn spawn_monitor<L: Uplink + Send + 'static>(
    link: Arc<Mutex<L>>,
    period: Duration,
    retry: Retry,
) -> std::io::Result<std::thread::JoinHandle<()>> {
    std::thread::Builder::new()
        .name("link-monitor".to_string())
        .stack_size(6 * 1024)
        .spawn(move || loop {
            std::thread::sleep(period);
            ensure_connected(&link, retry);
        })
}
