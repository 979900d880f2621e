//! Fixed-cadence control loop orchestration.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::WinchCore;
use crate::error::Result;
use crate::telemetry::TelemetrySink;
use winch_traits::{MotorDriver, PositionStore};

/// Run the control loop until `shutdown` is raised or `max_cycles`
/// completes (`None` runs until shutdown).
///
/// Startup is fail-fast: a storage failure during restore, or a driver
/// failure while starting the motors, aborts before the loop begins. Once
/// the loop is running, collaborator failures are logged and the loop keeps
/// going on in-memory state — losing persistence or one cycle's command
/// does not prevent safe motor operation.
pub fn run_loop<D, P>(
    core: &mut WinchCore<D, P>,
    sink: &mut dyn TelemetrySink,
    shutdown: &Arc<AtomicBool>,
    max_cycles: Option<u64>,
) -> Result<()>
where
    D: MotorDriver,
    P: PositionStore,
{
    let outcome = core.restore()?;
    tracing::info!(
        ?outcome,
        channels = core.channels().len(),
        period_ms = core.period().as_millis() as u64,
        "control loop starting"
    );
    core.start()?;

    let period = core.period();
    let clock = Arc::clone(core.clock());
    let mut cycles: u64 = 0;
    loop {
        if shutdown.load(Ordering::Relaxed) {
            tracing::info!(cycles, "shutdown requested");
            break;
        }
        match core.step() {
            Ok(snapshot) => sink.record(&snapshot),
            Err(e) => tracing::warn!(error = %e, "control cycle degraded"),
        }
        cycles += 1;
        if let Some(max) = max_cycles
            && cycles >= max
        {
            tracing::info!(cycles, "cycle limit reached");
            break;
        }
        clock.sleep(period);
    }
    Ok(())
}
