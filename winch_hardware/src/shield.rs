//! Adafruit Motor Shield V2.3 driver (PCA9685 PWM controller over I2C).
//!
//! Each DC motor terminal uses three PCA9685 outputs: one PWM for speed and
//! two logic outputs into the TB6612 H-bridge for direction. The output map
//! matches the stock shield firmware.

use std::thread;
use std::time::Duration;

use rppal::i2c::I2c;
use winch_traits::{Direction, MotorDriver};

use crate::error::{HwError, Result};

const MODE1: u8 = 0x00;
const MODE2: u8 = 0x01;
const PRESCALE: u8 = 0xFE;
const LED0_ON_L: u8 = 0x06;

const MODE1_SLEEP: u8 = 0x10;
const MODE1_AUTO_INC: u8 = 0x20;
const MODE1_RESTART: u8 = 0x80;
const MODE2_TOTEM_POLE: u8 = 0x04;

/// PCA9685 internal oscillator.
const OSC_HZ: f32 = 25_000_000.0;
/// PWM carrier used by the stock shield firmware.
const PWM_HZ: f32 = 1600.0;

/// (pwm, in2, in1) PCA9685 outputs per shield motor terminal M1..M4.
const MOTOR_PINS: [(u8, u8, u8); 4] = [(8, 9, 10), (13, 12, 11), (2, 3, 4), (7, 6, 5)];

/// Motor driver backed by the shield.
///
/// `motors[id]` names the shield terminal (1-4) that core channel `id` is
/// wired to.
pub struct ShieldDriver {
    i2c: I2c,
    motors: Vec<u8>,
}

impl ShieldDriver {
    pub fn new(bus: u8, address: u16, motors: Vec<u8>) -> Result<Self> {
        for m in &motors {
            if !(1..=4).contains(m) {
                return Err(HwError::I2c(format!("shield terminal {m} out of range 1-4")));
            }
        }
        let mut i2c = I2c::with_bus(bus).map_err(|e| HwError::I2c(e.to_string()))?;
        i2c.set_slave_address(address)
            .map_err(|e| HwError::I2c(e.to_string()))?;

        let mut driver = Self { i2c, motors };
        driver.init()?;
        Ok(driver)
    }

    fn init(&mut self) -> Result<()> {
        // Reset, then program the prescaler with the oscillator asleep.
        self.write_reg(MODE1, MODE1_SLEEP)?;
        let prescale = (OSC_HZ / (4096.0 * PWM_HZ)).round() as u8 - 1;
        self.write_reg(PRESCALE, prescale)?;
        self.write_reg(MODE2, MODE2_TOTEM_POLE)?;
        self.write_reg(MODE1, MODE1_AUTO_INC)?;
        // Oscillator needs at most 500 us to come back up.
        thread::sleep(Duration::from_micros(500));
        self.write_reg(MODE1, MODE1_AUTO_INC | MODE1_RESTART)?;
        tracing::info!(prescale, "motor shield initialized");
        Ok(())
    }

    fn write_reg(&mut self, reg: u8, value: u8) -> Result<()> {
        self.i2c
            .smbus_write_byte(reg, value)
            .map_err(|e| HwError::I2c(e.to_string()))
    }

    /// Program one PCA9685 output with raw on/off counts (0..=4095, bit 12
    /// forces full on/off).
    fn set_output(&mut self, output: u8, on: u16, off: u16) -> Result<()> {
        let base = LED0_ON_L + 4 * output;
        let buf = [
            base,
            (on & 0xFF) as u8,
            (on >> 8) as u8,
            (off & 0xFF) as u8,
            (off >> 8) as u8,
        ];
        self.i2c
            .write(&buf)
            .map_err(|e| HwError::I2c(e.to_string()))?;
        Ok(())
    }

    fn set_logic(&mut self, output: u8, high: bool) -> Result<()> {
        if high {
            self.set_output(output, 0x1000, 0)
        } else {
            self.set_output(output, 0, 0x1000)
        }
    }

    fn pins_for(&self, channel: usize) -> Result<(u8, u8, u8)> {
        let terminal = self
            .motors
            .get(channel)
            .ok_or(HwError::UnknownChannel(channel))?;
        Ok(MOTOR_PINS[usize::from(terminal - 1)])
    }
}

impl MotorDriver for ShieldDriver {
    fn set_speed(
        &mut self,
        channel: usize,
        duty: f32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let (pwm, _, _) = self.pins_for(channel)?;
        let off = (duty.clamp(0.0, 1.0) * 4095.0) as u16;
        self.set_output(pwm, 0, off)?;
        tracing::debug!(channel, duty, "shield duty set");
        Ok(())
    }

    fn run(
        &mut self,
        channel: usize,
        direction: Direction,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let (_, in2, in1) = self.pins_for(channel)?;
        match direction {
            Direction::Forward => {
                self.set_logic(in2, false)?;
                self.set_logic(in1, true)?;
            }
            Direction::Backward => {
                self.set_logic(in1, false)?;
                self.set_logic(in2, true)?;
            }
        }
        tracing::debug!(channel, ?direction, "shield run");
        Ok(())
    }
}

impl Drop for ShieldDriver {
    fn drop(&mut self) {
        // De-energize every configured terminal; the core never stops motors
        // itself, so process exit is where they get parked.
        for channel in 0..self.motors.len() {
            if let Ok((pwm, in2, in1)) = self.pins_for(channel) {
                let _ = self.set_output(pwm, 0, 0x1000);
                let _ = self.set_logic(in1, false);
                let _ = self.set_logic(in2, false);
            }
        }
    }
}
