//! Telemetry sinks and structured output helpers.

use std::io::Write;

use winch_core::telemetry::{CycleSnapshot, TelemetrySink};

/// Emits each cycle snapshot as tracing events.
#[derive(Debug, Default)]
pub struct TracingSink;

impl TelemetrySink for TracingSink {
    fn record(&mut self, snapshot: &CycleSnapshot) {
        for r in &snapshot.channels {
            tracing::debug!(
                channel = r.id,
                count = r.count,
                target_steps = r.target_steps,
                "cycle"
            );
        }
    }
}

/// Emits each cycle snapshot as one JSON line on the given writer.
pub struct JsonLinesSink<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> TelemetrySink for JsonLinesSink<W> {
    fn record(&mut self, snapshot: &CycleSnapshot) {
        let channels: Vec<_> = snapshot
            .channels
            .iter()
            .map(|r| {
                serde_json::json!({
                    "id": r.id,
                    "count": r.count,
                    "target_steps": r.target_steps,
                })
            })
            .collect();
        let line = serde_json::json!({ "channels": channels });
        if writeln!(self.out, "{line}").is_err() {
            tracing::warn!("telemetry writer closed");
        }
    }
}
