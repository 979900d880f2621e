//! Shared quadrature counter state, one cell per channel.
//!
//! The edge-notification domain is the only writer of `count` and
//! `last_change`; the control loop only reads, and always through
//! [`EncoderHandle::snapshot`] so the two fields can never be observed torn.

use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Consistent two-field view of a channel's encoder state.
#[derive(Debug, Clone, Copy)]
pub struct EncoderSnapshot {
    /// Signed decoded position, relative to the last restore/clear.
    pub count: i32,
    /// Monotonic instant of the most recent decoded edge.
    pub last_change: Instant,
}

#[derive(Debug)]
struct EncoderState {
    count: i32,
    last_change: Instant,
}

/// Cloneable handle to one channel's counter cell.
///
/// Cheap to clone (Arc); one clone lives inside the registered edge handler,
/// another inside the channel owned by the controller.
#[derive(Debug, Clone)]
pub struct EncoderHandle {
    state: Arc<Mutex<EncoderState>>,
}

impl EncoderHandle {
    pub fn new(now: Instant) -> Self {
        Self {
            state: Arc::new(Mutex::new(EncoderState {
                count: 0,
                last_change: now,
            })),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, EncoderState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Classify one A-line edge: equal levels count up, unequal levels count
    /// down. Runs in the notification context; one lock, one add, one
    /// timestamp store, nothing else.
    pub fn record_edge(&self, a_high: bool, b_high: bool, now: Instant) {
        let delta = if a_high == b_high { 1 } else { -1 };
        let mut st = self.lock();
        st.count = st.count.wrapping_add(delta);
        st.last_change = now;
    }

    /// Untorn copy of `(count, last_change)`.
    pub fn snapshot(&self) -> EncoderSnapshot {
        let st = self.lock();
        EncoderSnapshot {
            count: st.count,
            last_change: st.last_change,
        }
    }

    /// Overwrite the count (startup restore and the clearing utility).
    pub fn reset(&self, count: i32) {
        self.lock().count = count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_levels_count_up() {
        let enc = EncoderHandle::new(Instant::now());
        enc.record_edge(true, true, Instant::now());
        enc.record_edge(false, false, Instant::now());
        assert_eq!(enc.snapshot().count, 2);
    }

    #[test]
    fn unequal_levels_count_down() {
        let enc = EncoderHandle::new(Instant::now());
        enc.record_edge(true, false, Instant::now());
        enc.record_edge(false, true, Instant::now());
        assert_eq!(enc.snapshot().count, -2);
    }

    #[test]
    fn reset_overwrites_count_only() {
        let t0 = Instant::now();
        let enc = EncoderHandle::new(t0);
        enc.record_edge(true, true, t0);
        enc.reset(-42);
        let snap = enc.snapshot();
        assert_eq!(snap.count, -42);
        assert_eq!(snap.last_change, t0);
    }
}
