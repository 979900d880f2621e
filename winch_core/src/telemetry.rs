//! Per-cycle observability snapshot and its output-only sink.

/// One channel's contribution to the cycle snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelReading {
    pub id: usize,
    pub count: i32,
    pub target_steps: i32,
}

/// Counts and targets of every channel, captured once per control cycle.
#[derive(Debug, Clone, Default)]
pub struct CycleSnapshot {
    pub channels: Vec<ChannelReading>,
}

/// Receives the snapshot emitted each control cycle. Purely an output; no
/// core behavior depends on what the sink does with it.
pub trait TelemetrySink {
    fn record(&mut self, snapshot: &CycleSnapshot);
}

/// Sink that discards every snapshot.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl TelemetrySink for NullSink {
    fn record(&mut self, _snapshot: &CycleSnapshot) {}
}
