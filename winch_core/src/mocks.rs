//! Test and simulation doubles for winch_core.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::telemetry::{CycleSnapshot, TelemetrySink};
use winch_traits::{Clock, Direction, MotorDriver, PositionStore};

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[derive(Debug, Default)]
struct MockDriverState {
    speeds: Vec<(usize, f32)>,
    runs: Vec<(usize, Direction)>,
    failing: bool,
}

/// Driver that records every command; can be switched to fail.
#[derive(Debug, Default, Clone)]
pub struct MockDriver {
    state: Arc<Mutex<MockDriverState>>,
}

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn speeds(&self) -> Vec<(usize, f32)> {
        lock_unpoisoned(&self.state).speeds.clone()
    }

    pub fn runs(&self) -> Vec<(usize, Direction)> {
        lock_unpoisoned(&self.state).runs.clone()
    }

    /// Most recent direction commanded for `channel`, if any.
    pub fn last_run_for(&self, channel: usize) -> Option<Direction> {
        lock_unpoisoned(&self.state)
            .runs
            .iter()
            .rev()
            .find(|(ch, _)| *ch == channel)
            .map(|(_, dir)| *dir)
    }

    pub fn set_failing(&self, failing: bool) {
        lock_unpoisoned(&self.state).failing = failing;
    }
}

impl MotorDriver for MockDriver {
    fn set_speed(
        &mut self,
        channel: usize,
        duty: f32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut st = lock_unpoisoned(&self.state);
        if st.failing {
            return Err(Box::new(std::io::Error::other("mock driver failure")));
        }
        st.speeds.push((channel, duty));
        Ok(())
    }

    fn run(
        &mut self,
        channel: usize,
        direction: Direction,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut st = lock_unpoisoned(&self.state);
        if st.failing {
            return Err(Box::new(std::io::Error::other("mock driver failure")));
        }
        st.runs.push((channel, direction));
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MemoryStoreState {
    bytes: Vec<u8>,
    writes: usize,
    fail_reads: bool,
    fail_writes: bool,
}

/// In-memory position store with failure injection.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryStoreState>>,
}

impl MemoryStore {
    /// Empty store, as after a full erase.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bytes(bytes: Vec<u8>) -> Self {
        let store = Self::default();
        lock_unpoisoned(&store.state).bytes = bytes;
        store
    }

    pub fn contents(&self) -> Vec<u8> {
        lock_unpoisoned(&self.state).bytes.clone()
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        lock_unpoisoned(&self.state).writes
    }

    pub fn set_fail_reads(&self, fail: bool) {
        lock_unpoisoned(&self.state).fail_reads = fail;
    }

    pub fn set_fail_writes(&self, fail: bool) {
        lock_unpoisoned(&self.state).fail_writes = fail;
    }
}

impl PositionStore for MemoryStore {
    fn read(&mut self) -> Result<Vec<u8>, Box<dyn std::error::Error + Send + Sync>> {
        let st = lock_unpoisoned(&self.state);
        if st.fail_reads {
            return Err(Box::new(std::io::Error::other("mock storage read failure")));
        }
        Ok(st.bytes.clone())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut st = lock_unpoisoned(&self.state);
        if st.fail_writes {
            return Err(Box::new(std::io::Error::other(
                "mock storage write failure",
            )));
        }
        st.bytes = bytes.to_vec();
        st.writes += 1;
        Ok(())
    }
}

/// Deterministic clock advanced manually by tests.
///
/// now() = origin + offset; sleep(d) advances the offset without sleeping,
/// which lets the runner be driven at full speed in tests.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    offset: Arc<Mutex<Duration>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    pub fn advance(&self, d: Duration) {
        let mut off = lock_unpoisoned(&self.offset);
        *off = off.saturating_add(d);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + *lock_unpoisoned(&self.offset)
    }

    fn sleep(&self, d: Duration) {
        self.advance(d);
    }
}

/// Sink that keeps every snapshot it receives.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub snapshots: Vec<CycleSnapshot>,
}

impl TelemetrySink for RecordingSink {
    fn record(&mut self, snapshot: &CycleSnapshot) {
        self.snapshots.push(snapshot.clone());
    }
}
