#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema and validation for the winch controller.
//!
//! The `Config` struct and its sections are deserialized from TOML and
//! validated field by field before any hardware is touched.

use serde::Deserialize;
use std::collections::HashSet;

/// One winch channel: wiring plus spool geometry.
#[derive(Debug, Deserialize, Clone)]
pub struct ChannelCfg {
    /// Logical name used in logs and telemetry.
    pub name: String,
    /// Motor terminal on the shield (1-4).
    pub driver_channel: u8,
    /// Encoder A line, BCM numbering.
    pub pin_a: u8,
    /// Encoder B line, BCM numbering.
    pub pin_b: u8,
    /// Enable internal pull-ups on the encoder pins.
    #[serde(default = "default_pull_up")]
    pub pull_up: bool,
    /// Drive magnitude, 0..=1.
    #[serde(default = "default_duty")]
    pub duty: f32,
    /// Desired line travel in millimetres.
    pub travel_mm: f64,
    /// Winding spool diameter in millimetres.
    pub spool_diameter_mm: f64,
    /// Decoded encoder counts per encoder-shaft revolution. This is the
    /// decoded figure, not raw edges; state it explicitly rather than
    /// guessing a halving factor.
    pub encoder_resolution: f64,
}

fn default_pull_up() -> bool {
    true
}

fn default_duty() -> f32 {
    0.5
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct ControlCfg {
    /// Control loop period in milliseconds.
    pub period_ms: u64,
}

impl Default for ControlCfg {
    fn default() -> Self {
        Self { period_ms: 100 }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PersistenceCfg {
    /// Minimum idle time (ms) since the last decoded edge before a changed
    /// count is persisted.
    pub idle_ms: u64,
    /// Location of the position record.
    pub path: String,
}

impl Default for PersistenceCfg {
    fn default() -> Self {
        Self {
            idle_ms: 5000,
            path: "winch_position.bin".into(),
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct Hardware {
    /// I2C bus the motor shield sits on.
    pub i2c_bus: u8,
    /// Shield I2C address.
    pub i2c_address: u16,
}

impl Default for Hardware {
    fn default() -> Self {
        Self {
            i2c_bus: 1,
            i2c_address: 0x60,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub channels: Vec<ChannelCfg>,
    #[serde(default)]
    pub control: ControlCfg,
    #[serde(default)]
    pub persistence: PersistenceCfg,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub hardware: Hardware,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        if self.channels.is_empty() {
            eyre::bail!("at least one [[channels]] entry is required");
        }

        if self.control.period_ms == 0 {
            eyre::bail!("control.period_ms must be >= 1");
        }
        if self.persistence.idle_ms == 0 {
            eyre::bail!("persistence.idle_ms must be >= 1");
        }
        if self.persistence.path.is_empty() {
            eyre::bail!("persistence.path must not be empty");
        }

        let mut terminals = HashSet::new();
        let mut pins = HashSet::new();
        for ch in &self.channels {
            if ch.name.is_empty() {
                eyre::bail!("channel name must not be empty");
            }
            if !(1..=4).contains(&ch.driver_channel) {
                eyre::bail!("{}: driver_channel must be 1-4", ch.name);
            }
            if !terminals.insert(ch.driver_channel) {
                eyre::bail!(
                    "{}: driver_channel {} used by more than one channel",
                    ch.name,
                    ch.driver_channel
                );
            }
            if ch.pin_a == ch.pin_b {
                eyre::bail!("{}: pin_a and pin_b must differ", ch.name);
            }
            for pin in [ch.pin_a, ch.pin_b] {
                if !pins.insert(pin) {
                    eyre::bail!("{}: pin {} used by more than one channel", ch.name, pin);
                }
            }
            if !(ch.duty > 0.0 && ch.duty <= 1.0) {
                eyre::bail!("{}: duty must be in (0.0, 1.0]", ch.name);
            }
            if !ch.travel_mm.is_finite() || ch.travel_mm < 0.0 {
                eyre::bail!("{}: travel_mm must be finite and >= 0", ch.name);
            }
            if !(ch.spool_diameter_mm.is_finite() && ch.spool_diameter_mm > 0.0) {
                eyre::bail!("{}: spool_diameter_mm must be > 0", ch.name);
            }
            if !(ch.encoder_resolution.is_finite() && ch.encoder_resolution > 0.0) {
                eyre::bail!("{}: encoder_resolution must be > 0", ch.name);
            }
        }

        Ok(())
    }
}
