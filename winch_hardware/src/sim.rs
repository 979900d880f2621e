//! Simulated winch rig: a motor driver whose "motion" is delivered as
//! quadrature edges to the registered encoder handlers.
//!
//! One background thread ticks every few milliseconds and, for every channel
//! that has been commanded to run with a non-zero duty, emits edges whose
//! A/B levels encode the commanded direction (equal levels count up). The
//! thread is signalled and joined when the rig is dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;
use std::time::Duration;

use winch_traits::{Direction, EncoderInput, MotorDriver};

use crate::error::HwError;

const TICK: Duration = Duration::from_millis(5);
/// Edges emitted per tick at full duty.
const EDGES_PER_TICK_FULL: f32 = 8.0;

type EdgeHandler = Box<dyn FnMut(bool, bool) + Send>;

#[derive(Default)]
struct SimChannel {
    duty: Mutex<f32>,
    direction: Mutex<Option<Direction>>,
    handler: Mutex<Option<EdgeHandler>>,
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl SimChannel {
    fn tick(&self) {
        let duty = *lock_unpoisoned(&self.duty);
        let Some(direction) = *lock_unpoisoned(&self.direction) else {
            return;
        };
        let edges = (duty.clamp(0.0, 1.0) * EDGES_PER_TICK_FULL).round() as u32;
        if edges == 0 {
            return;
        }
        // Forward motion presents equal A/B levels at the sampled instant.
        let (a, b) = match direction {
            Direction::Forward => (true, true),
            Direction::Backward => (true, false),
        };
        if let Some(handler) = lock_unpoisoned(&self.handler).as_mut() {
            for _ in 0..edges {
                handler(a, b);
            }
        }
    }
}

/// Owns the simulated channels and the edge-generator thread.
pub struct SimulatedRig {
    channels: Vec<Arc<SimChannel>>,
    shutdown: Arc<AtomicBool>,
    join_handle: Option<JoinHandle<()>>,
}

impl SimulatedRig {
    pub fn new(channel_count: usize) -> Self {
        let channels: Vec<Arc<SimChannel>> = (0..channel_count)
            .map(|_| Arc::new(SimChannel::default()))
            .collect();
        let shutdown = Arc::new(AtomicBool::new(false));

        let thread_channels = channels.clone();
        let thread_shutdown = shutdown.clone();
        let join_handle = std::thread::spawn(move || {
            while !thread_shutdown.load(Ordering::Relaxed) {
                for ch in &thread_channels {
                    ch.tick();
                }
                std::thread::sleep(TICK);
            }
            tracing::trace!("simulated rig thread exiting");
        });

        Self {
            channels,
            shutdown,
            join_handle: Some(join_handle),
        }
    }

    /// Driver half of the rig; channel ids index the rig's channels.
    pub fn driver(&self) -> SimulatedDriver {
        SimulatedDriver {
            channels: self.channels.clone(),
        }
    }

    /// Encoder input for one channel.
    pub fn encoder_input(&self, channel: usize) -> Option<SimulatedEncoderInput> {
        self.channels.get(channel).map(|ch| SimulatedEncoderInput {
            channel: ch.clone(),
        })
    }
}

impl Drop for SimulatedRig {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.join_handle.take()
            && let Err(e) = handle.join()
        {
            tracing::warn!(?e, "simulated rig thread panicked during shutdown");
        }
    }
}

/// Simulated motor driver.
#[derive(Clone)]
pub struct SimulatedDriver {
    channels: Vec<Arc<SimChannel>>,
}

impl SimulatedDriver {
    fn channel(&self, channel: usize) -> Result<&Arc<SimChannel>, HwError> {
        self.channels
            .get(channel)
            .ok_or(HwError::UnknownChannel(channel))
    }
}

impl MotorDriver for SimulatedDriver {
    fn set_speed(
        &mut self,
        channel: usize,
        duty: f32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let ch = self.channel(channel)?;
        *lock_unpoisoned(&ch.duty) = duty.clamp(0.0, 1.0);
        tracing::debug!(channel, duty, "simulated duty set");
        Ok(())
    }

    fn run(
        &mut self,
        channel: usize,
        direction: Direction,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let ch = self.channel(channel)?;
        *lock_unpoisoned(&ch.direction) = Some(direction);
        tracing::debug!(channel, ?direction, "simulated run");
        Ok(())
    }
}

/// Simulated digital-input capability for one channel's encoder.
pub struct SimulatedEncoderInput {
    channel: Arc<SimChannel>,
}

impl EncoderInput for SimulatedEncoderInput {
    fn register(
        &mut self,
        handler: Box<dyn FnMut(bool, bool) + Send>,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut slot = lock_unpoisoned(&self.channel.handler);
        if slot.is_some() {
            return Err(Box::new(HwError::AlreadyRegistered));
        }
        *slot = Some(handler);
        Ok(())
    }
}
