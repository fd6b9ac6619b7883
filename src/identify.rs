//! "Identify device" blinking of the status LED.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlinkPattern {
    pub count: u32,
    pub on: Duration,
    pub off: Duration,
}

impl BlinkPattern {
    /// 20 fast blinks, as advertised by the portal button.
    pub const IDENTIFY: Self = Self {
        count: 20,
        on: Duration::from_millis(50),
        off: Duration::from_millis(50),
    };

    pub fn total_duration(&self) -> Duration {
        (self.on + self.off) * self.count
    }
}

pub trait StatusLed {
    fn set(&mut self, on: bool) -> anyhow::Result<()>;
}

/// Plays `pattern` on `led`, blocking the calling thread. The LED is left off.
pub fn blink<L: StatusLed + ?Sized>(led: &mut L, pattern: BlinkPattern) -> anyhow::Result<()> {
    for _ in 0..pattern.count {
        led.set(true)?;
        std::thread::sleep(pattern.on);
        led.set(false)?;
        std::thread::sleep(pattern.off);
    }
    Ok(())
}

/// Runs blink patterns on a background thread, one at a time.
pub struct Identifier<L> {
    led: Arc<Mutex<L>>,
    busy: Arc<AtomicBool>,
}

impl<L> Clone for Identifier<L> {
    fn clone(&self) -> Self {
        Self {
            led: self.led.clone(),
            busy: self.busy.clone(),
        }
    }
}

impl<L: StatusLed + Send + 'static> Identifier<L> {
    pub fn new(led: L) -> Self {
        Self {
            led: Arc::new(Mutex::new(led)),
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Starts `pattern` unless one is already running, in which case the
    /// request is dropped and `None` is returned.
    pub fn trigger(&self, pattern: BlinkPattern) -> Option<std::thread::JoinHandle<()>> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            log::info!("Identify already in progress");
            return None;
        }

        let led = self.led.clone();
        let busy = self.busy.clone();
        let spawned = std::thread::Builder::new()
            .name("identify".to_string())
            .stack_size(4 * 1024)
            .spawn(move || {
                let mut led = led.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                if let Err(e) = blink(&mut *led, pattern) {
                    log::error!("Failed to blink status LED: {:?}", e);
                }
                busy.store(false, Ordering::Release);
            });

        match spawned {
            Ok(handle) => Some(handle),
            Err(e) => {
                log::error!("Failed to spawn identify thread: {:?}", e);
                self.busy.store(false, Ordering::Release);
                None
            }
        }
    }
}
