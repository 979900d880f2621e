pub mod clock;

pub use clock::{Clock, MonotonicClock};

/// Run direction for a winch channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Winding out toward the travel target (counts increase).
    Forward,
    /// Winding back toward zero (counts decrease).
    Backward,
}

/// Multi-channel motor driver capability.
///
/// `set_speed` configures the duty magnitude for a channel (the core sets it
/// once at startup); `run` asserts a direction. There is intentionally no
/// stop/brake operation: the control law only ever reverses.
pub trait MotorDriver {
    fn set_speed(
        &mut self,
        channel: usize,
        duty: f32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    fn run(
        &mut self,
        channel: usize,
        direction: Direction,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Edge-notification capability for one quadrature encoder.
///
/// The implementation watches the A line and, on every level change, reads
/// both lines and invokes the handler with `(a_high, b_high)` from its own
/// notification context. The handler must be non-blocking and bounded-time;
/// it may be invoked concurrently with the control loop.
pub trait EncoderInput {
    fn register(
        &mut self,
        handler: Box<dyn FnMut(bool, bool) + Send>,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Non-volatile storage holding a single fixed-size position record.
///
/// Reads return whatever bytes are currently stored (possibly empty or
/// garbage on first boot); writes replace the whole record. Failures are
/// reported to the caller, never retried here.
pub trait PositionStore {
    fn read(&mut self) -> Result<Vec<u8>, Box<dyn std::error::Error + Send + Sync>>;

    fn write(&mut self, bytes: &[u8]) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

impl<T: MotorDriver + ?Sized> MotorDriver for Box<T> {
    fn set_speed(
        &mut self,
        channel: usize,
        duty: f32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).set_speed(channel, duty)
    }

    fn run(
        &mut self,
        channel: usize,
        direction: Direction,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).run(channel, direction)
    }
}

impl<T: PositionStore + ?Sized> PositionStore for Box<T> {
    fn read(&mut self) -> Result<Vec<u8>, Box<dyn std::error::Error + Send + Sync>> {
        (**self).read()
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).write(bytes)
    }
}

impl<T: EncoderInput + ?Sized> EncoderInput for Box<T> {
    fn register(
        &mut self,
        handler: Box<dyn FnMut(bool, bool) + Send>,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).register(handler)
    }
}
