//! Config to hardware assembly: choose the backend, wire encoder handlers,
//! calibrate targets, and hand back the ready-to-run pieces.

use eyre::WrapErr;

use winch_config::Config;
use winch_core::WinchCore;
use winch_core::calibration::{self, ChannelGeometry};
use winch_core::channel::MotorChannel;
use winch_core::encoder::EncoderHandle;
use winch_core::record;
use winch_hardware::FilePositionStore;
use winch_traits::{Clock, EncoderInput, MonotonicClock, MotorDriver};

/// Whatever must stay alive while the motors run: the simulated rig's edge
/// thread, or the GPIO pins holding armed interrupts.
pub enum Keepalive {
    #[cfg(not(all(feature = "hardware", target_os = "linux")))]
    Sim(winch_hardware::SimulatedRig),
    #[cfg(all(feature = "hardware", target_os = "linux"))]
    Gpio(Vec<winch_hardware::GpioEncoderInput>),
}

/// Driver plus per-channel encoder handles, before a core is built around
/// them. The `smoke` subcommand drives these directly.
pub struct Parts {
    pub driver: Box<dyn MotorDriver>,
    pub encoders: Vec<EncoderHandle>,
    pub _keepalive: Keepalive,
}

/// A fully assembled controller.
pub struct Rig {
    pub core: WinchCore<Box<dyn MotorDriver>, FilePositionStore>,
    pub _keepalive: Keepalive,
}

fn register_edges(
    input: &mut dyn EncoderInput,
    handle: &EncoderHandle,
    name: &str,
) -> eyre::Result<()> {
    let clock = MonotonicClock::new();
    let sink = handle.clone();
    input
        .register(Box::new(move |a, b| sink.record_edge(a, b, clock.now())))
        .map_err(|e| eyre::eyre!("{e}"))
        .wrap_err_with(|| format!("registering edge handler for {name}"))
}

#[cfg(not(all(feature = "hardware", target_os = "linux")))]
pub fn build_parts(cfg: &Config) -> eyre::Result<Parts> {
    let clock = MonotonicClock::new();
    let rig = winch_hardware::SimulatedRig::new(cfg.channels.len());
    let mut encoders = Vec::with_capacity(cfg.channels.len());
    for (i, ch) in cfg.channels.iter().enumerate() {
        let handle = EncoderHandle::new(clock.now());
        let mut input = rig
            .encoder_input(i)
            .ok_or_else(|| eyre::eyre!("simulated channel {i} missing"))?;
        register_edges(&mut input, &handle, &ch.name)?;
        encoders.push(handle);
    }
    tracing::info!(channels = cfg.channels.len(), "simulated rig assembled");
    Ok(Parts {
        driver: Box::new(rig.driver()),
        encoders,
        _keepalive: Keepalive::Sim(rig),
    })
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub fn build_parts(cfg: &Config) -> eyre::Result<Parts> {
    let clock = MonotonicClock::new();
    let mut encoders = Vec::with_capacity(cfg.channels.len());
    let mut inputs = Vec::with_capacity(cfg.channels.len());
    for ch in &cfg.channels {
        let handle = EncoderHandle::new(clock.now());
        let mut input = winch_hardware::GpioEncoderInput::new(ch.pin_a, ch.pin_b, ch.pull_up)
            .wrap_err_with(|| format!("opening encoder pins for {}", ch.name))?;
        register_edges(&mut input, &handle, &ch.name)?;
        encoders.push(handle);
        inputs.push(input);
    }

    let motors = cfg.channels.iter().map(|ch| ch.driver_channel).collect();
    let driver =
        winch_hardware::ShieldDriver::new(cfg.hardware.i2c_bus, cfg.hardware.i2c_address, motors)
            .wrap_err("opening motor shield")?;
    tracing::info!(
        channels = cfg.channels.len(),
        bus = cfg.hardware.i2c_bus,
        address = cfg.hardware.i2c_address,
        "hardware rig assembled"
    );
    Ok(Parts {
        driver: Box::new(driver),
        encoders,
        _keepalive: Keepalive::Gpio(inputs),
    })
}

/// Targets computed from each channel's spool geometry.
pub fn targets(cfg: &Config) -> Vec<i32> {
    cfg.channels
        .iter()
        .map(|ch| {
            calibration::target_steps(&ChannelGeometry {
                travel_mm: ch.travel_mm,
                spool_diameter_mm: ch.spool_diameter_mm,
                encoder_resolution: ch.encoder_resolution,
            })
        })
        .collect()
}

pub fn position_store(cfg: &Config) -> FilePositionStore {
    FilePositionStore::new(
        &cfg.persistence.path,
        record::record_len(cfg.channels.len()),
    )
}

pub fn build_rig(cfg: &Config) -> eyre::Result<Rig> {
    let parts = build_parts(cfg)?;
    let targets = targets(cfg);
    let channels = cfg
        .channels
        .iter()
        .zip(parts.encoders)
        .zip(&targets)
        .enumerate()
        .map(|(i, ((ch, encoder), &target))| {
            tracing::info!(channel = %ch.name, target_steps = target, "calibrated");
            MotorChannel::new(i, ch.name.clone(), encoder, target, ch.duty)
        })
        .collect();

    let core = WinchCore::new(
        parts.driver,
        position_store(cfg),
        channels,
        winch_core::ControlCfg {
            period_ms: cfg.control.period_ms,
            idle_threshold_ms: cfg.persistence.idle_ms,
        },
    )?;
    Ok(Rig {
        core,
        _keepalive: parts._keepalive,
    })
}
