//! GPIO-backed output line.

use super::{OutputError, OutputLine};
use esp_idf_hal::gpio::{AnyOutputPin, Output, PinDriver};
use esp_idf_hal::peripheral::Peripheral;

/// Push-pull GPIO output.
pub struct GpioOutput {
    pin: PinDriver<'static, AnyOutputPin, Output>,
    level: bool,
}

impl GpioOutput {
    /// Configure `pin` as an output, driven low.
    pub fn new(pin: impl Peripheral<P = AnyOutputPin> + 'static) -> Result<Self, OutputError> {
        let mut pin = PinDriver::output(pin).map_err(|e| OutputError::Gpio(format!("{:?}", e)))?;
        pin.set_low()
            .map_err(|e| OutputError::Gpio(format!("{:?}", e)))?;
        Ok(Self { pin, level: false })
    }
}

impl OutputLine for GpioOutput {
    fn set_level(&mut self, high: bool) -> Result<(), OutputError> {
        let result = if high {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        result.map_err(|e| OutputError::Gpio(format!("{:?}", e)))?;
        self.level = high;
        Ok(())
    }

    fn level(&self) -> bool {
        self.level
    }
}
