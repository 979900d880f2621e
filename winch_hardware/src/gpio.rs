//! GPIO edge-interrupt encoder input (rppal).
//!
//! Watches the A line with an async interrupt on both edges; the callback
//! samples B at that instant and forwards both levels to the registered
//! handler. Pins are BCM-numbered and pulled up by default, matching 3.3 V
//! open-collector Hall encoders.

use rppal::gpio::{Gpio, InputPin, Level, Trigger};
use winch_traits::EncoderInput;

use crate::error::{HwError, Result};

pub struct GpioEncoderInput {
    pin_a: InputPin,
    // Moved into the interrupt callback on register.
    pin_b: Option<InputPin>,
}

impl GpioEncoderInput {
    pub fn new(pin_a: u8, pin_b: u8, pull_up: bool) -> Result<Self> {
        let gpio = Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
        let get = |pin: u8| -> Result<InputPin> {
            let pin = gpio
                .get(pin)
                .map_err(|e| HwError::Gpio(format!("pin {pin}: {e}")))?;
            Ok(if pull_up {
                pin.into_input_pullup()
            } else {
                pin.into_input()
            })
        };
        Ok(Self {
            pin_a: get(pin_a)?,
            pin_b: Some(get(pin_b)?),
        })
    }
}

impl EncoderInput for GpioEncoderInput {
    fn register(
        &mut self,
        mut handler: Box<dyn FnMut(bool, bool) + Send>,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let pin_b = self.pin_b.take().ok_or(HwError::AlreadyRegistered)?;
        self.pin_a
            .set_async_interrupt(Trigger::Both, move |level: Level| {
                let a_high = level == Level::High;
                let b_high = pin_b.read() == Level::High;
                handler(a_high, b_high);
            })
            .map_err(|e| HwError::Gpio(e.to_string()))?;
        tracing::info!(pin_a = self.pin_a.pin(), "encoder edge interrupt armed");
        Ok(())
    }
}
