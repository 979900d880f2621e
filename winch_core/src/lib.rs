#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core winch position logic (hardware-agnostic).
//!
//! Drives N independent winch motors, each with a quadrature Hall encoder,
//! back and forth between 0 and a calibrated travel target, persisting the
//! encoder counts across power cycles with idle-gated writes. All hardware
//! interactions go through the `winch_traits` capability traits.
//!
//! ## Architecture
//!
//! - **Decoding**: edge-domain counter cells (`encoder` module)
//! - **Calibration**: spool geometry → target counts (`calibration` module)
//! - **Control**: bounds-based direction reversal (`WinchCore::step`)
//! - **Persistence**: validity-marked record, idle/change gated
//!   (`WinchCore::{restore, maybe_flush}`, `record` module)
//! - **Orchestration**: fixed-cadence loop (`runner` module)
//!
//! ## Concurrency
//!
//! Two domains: edge callbacks (one per channel, asynchronous, preemptive)
//! and the single cooperative control loop. The only shared state is the
//! per-channel counter cell, read via an untorn snapshot; nothing in this
//! crate blocks beyond that short critical section.

pub mod calibration;
pub mod channel;
pub mod encoder;
pub mod error;
pub mod mocks;
pub mod record;
pub mod runner;
pub mod telemetry;

use std::sync::Arc;
use std::time::Duration;

use eyre::WrapErr;

use crate::channel::MotorChannel;
use crate::error::{Result, WinchError};
use crate::telemetry::{ChannelReading, CycleSnapshot};
use winch_traits::clock::{Clock, MonotonicClock};
use winch_traits::{Direction, MotorDriver, PositionStore};

/// Outcome of the startup restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// A valid record was found and its counts adopted.
    Restored,
    /// Storage held no usable state; counts were zeroed and a fresh valid
    /// record written, so storage is never left invalid after startup.
    Initialized,
}

/// Control-loop configuration.
#[derive(Debug, Clone)]
pub struct ControlCfg {
    /// Control loop period in milliseconds. Not latency-critical.
    pub period_ms: u64,
    /// Minimum time since the last decoded edge before a changed count is
    /// eligible for persistence.
    pub idle_threshold_ms: u64,
}

impl Default for ControlCfg {
    fn default() -> Self {
        Self {
            period_ms: 100,
            idle_threshold_ms: 5000,
        }
    }
}

/// Controller plus persistence manager for all winch channels.
///
/// Owns the channel array, the motor driver and the position store; the
/// encoder handles inside the channels are shared with the registered edge
/// handlers, which are this struct's only concurrent collaborators.
pub struct WinchCore<D: MotorDriver, P: PositionStore> {
    driver: D,
    store: P,
    channels: Vec<MotorChannel>,
    control: ControlCfg,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl<D: MotorDriver, P: PositionStore> core::fmt::Debug for WinchCore<D, P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WinchCore")
            .field("channels", &self.channels.len())
            .field("period_ms", &self.control.period_ms)
            .field("idle_threshold_ms", &self.control.idle_threshold_ms)
            .finish()
    }
}

impl<D: MotorDriver, P: PositionStore> WinchCore<D, P> {
    pub fn new(
        driver: D,
        store: P,
        channels: Vec<MotorChannel>,
        control: ControlCfg,
    ) -> Result<Self> {
        if channels.is_empty() {
            return Err(eyre::Report::new(WinchError::Config(
                "at least one channel is required".into(),
            )));
        }
        Ok(Self {
            driver,
            store,
            channels,
            control,
            clock: Arc::new(MonotonicClock::new()),
        })
    }

    /// Swap in a custom clock; defaults to the real monotonic clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        self.clock = clock;
        self
    }

    pub fn channels(&self) -> &[MotorChannel] {
        &self.channels
    }

    pub fn clock(&self) -> &Arc<dyn Clock + Send + Sync> {
        &self.clock
    }

    /// Control loop period as a `Duration`.
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.control.period_ms)
    }

    /// Restore channel counts from storage, or zero-initialize.
    ///
    /// A valid record is adopted as-is (`Restored`); anything else — wrong
    /// size, marker mismatch, erased storage — zeroes every channel and
    /// immediately writes a fresh valid record (`Initialized`). Only actual
    /// storage I/O failures return an error; callers should fail fast on
    /// those before entering the control loop.
    pub fn restore(&mut self) -> Result<RestoreOutcome> {
        let bytes = self
            .store
            .read()
            .map_err(|e| eyre::Report::new(WinchError::Storage(e.to_string())))
            .wrap_err("reading position record")?;

        match record::decode(&bytes, self.channels.len()) {
            Some(counts) => {
                for (ch, count) in self.channels.iter_mut().zip(counts) {
                    ch.encoder.reset(count);
                    ch.last_saved = count;
                    tracing::debug!(channel = %ch.name, count, "count restored");
                }
                Ok(RestoreOutcome::Restored)
            }
            None => {
                for ch in &mut self.channels {
                    ch.encoder.reset(0);
                    ch.last_saved = 0;
                }
                let counts = self.current_counts();
                self.write_record(&counts)
                    .wrap_err("initializing position record")?;
                tracing::info!("no valid position record; storage re-initialized");
                Ok(RestoreOutcome::Initialized)
            }
        }
    }

    /// Configure each channel's duty once and start every motor forward.
    pub fn start(&mut self) -> Result<()> {
        for ch in &self.channels {
            self.driver
                .set_speed(ch.id, ch.duty)
                .map_err(|e| eyre::Report::new(WinchError::Driver(e.to_string())))
                .wrap_err("configuring duty")?;
            self.driver
                .run(ch.id, Direction::Forward)
                .map_err(|e| eyre::Report::new(WinchError::Driver(e.to_string())))
                .wrap_err("starting forward")?;
            tracing::info!(
                channel = %ch.name,
                target_steps = ch.target_steps,
                duty = ch.duty,
                "channel started"
            );
        }
        Ok(())
    }

    /// One control cycle.
    ///
    /// Per channel: take one untorn snapshot and apply the bounds law —
    /// `count >= target_steps` commands backward, `count < 0` commands
    /// forward, anything between leaves the current direction alone. The
    /// motor is never stopped and never reversed mid-travel. The upper bound
    /// is deliberately closed while the lower is open; a non-positive target
    /// therefore commands backward every cycle (documented degenerate
    /// misconfiguration, not handled specially).
    ///
    /// After all channels, the persistence pass runs, and the cycle snapshot
    /// is returned for the telemetry sink.
    pub fn step(&mut self) -> Result<CycleSnapshot> {
        let mut snapshot = CycleSnapshot {
            channels: Vec::with_capacity(self.channels.len()),
        };
        for ch in &self.channels {
            let snap = ch.encoder.snapshot();
            if snap.count >= ch.target_steps {
                self.driver
                    .run(ch.id, Direction::Backward)
                    .map_err(|e| eyre::Report::new(WinchError::Driver(e.to_string())))
                    .wrap_err("reversing at upper bound")?;
                tracing::debug!(channel = %ch.name, count = snap.count, "upper bound reached");
            } else if snap.count < 0 {
                self.driver
                    .run(ch.id, Direction::Forward)
                    .map_err(|e| eyre::Report::new(WinchError::Driver(e.to_string())))
                    .wrap_err("reversing at lower bound")?;
                tracing::debug!(channel = %ch.name, count = snap.count, "lower bound reached");
            }
            snapshot.channels.push(ChannelReading {
                id: ch.id,
                count: snap.count,
                target_steps: ch.target_steps,
            });
        }
        self.maybe_flush()?;
        Ok(snapshot)
    }

    /// Idle-gated, change-gated persistence pass.
    ///
    /// A channel is eligible when no edge arrived for longer than the idle
    /// threshold AND its count differs from the last persisted value. Every
    /// eligible channel triggers one write of the whole record — the
    /// then-current counts of ALL channels plus the validity marker, never a
    /// partial record — after which that channel's `last_saved` is updated.
    /// A failed write leaves `last_saved` untouched, so the gate re-fires on
    /// a later idle cycle; in-memory counts stay authoritative meanwhile.
    ///
    /// Returns how many flushes were performed this pass.
    pub fn maybe_flush(&mut self) -> Result<usize> {
        let now = self.clock.now();
        let idle = Duration::from_millis(self.control.idle_threshold_ms);
        let mut flushes = 0;
        for i in 0..self.channels.len() {
            let snap = self.channels[i].encoder.snapshot();
            let idle_for = now.saturating_duration_since(snap.last_change);
            if idle_for > idle && snap.count != self.channels[i].last_saved {
                let counts = self.current_counts();
                self.write_record(&counts)
                    .wrap_err("flushing position record")?;
                self.channels[i].last_saved = counts[i];
                flushes += 1;
                tracing::info!(
                    channel = %self.channels[i].name,
                    count = counts[i],
                    idle_ms = idle_for.as_millis() as u64,
                    "position flushed"
                );
            }
        }
        Ok(flushes)
    }

    fn current_counts(&self) -> Vec<i32> {
        self.channels
            .iter()
            .map(|ch| ch.encoder.snapshot().count)
            .collect()
    }

    fn write_record(&mut self, counts: &[i32]) -> Result<()> {
        let bytes = record::encode(counts);
        self.store
            .write(&bytes)
            .map_err(|e| eyre::Report::new(WinchError::Storage(e.to_string())))?;
        Ok(())
    }
}
