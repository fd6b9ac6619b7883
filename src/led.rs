//! Status LED used by the identify blink.

use esp_idf_svc::hal::gpio::{Output, OutputPin, PinDriver};
use esp_idf_svc::hal::peripheral::Peripheral;

use repeater::identify::StatusLed;

pub struct Led<'d, T: OutputPin>(PinDriver<'d, T, Output>);

impl<'d, T: OutputPin> Led<'d, T> {
    pub fn new(pin: impl Peripheral<P = T> + 'd) -> anyhow::Result<Self> {
        let mut driver = PinDriver::output(pin)?;
        driver.set_low()?;
        Ok(Self(driver))
    }
}

impl<T: OutputPin> StatusLed for Led<'_, T> {
    fn set(&mut self, on: bool) -> anyhow::Result<()> {
        if on {
            self.0.set_high()?;
        } else {
            self.0.set_low()?;
        }
        Ok(())
    }
}
