//! Hardware adapters for the winch controller.
//!
//! The default build ships a simulated rig (driver + edge-generating
//! encoders) and a file-backed position store, so the whole stack runs on a
//! development machine. The `hardware` feature swaps in the Raspberry Pi
//! backends: the Adafruit Motor Shield V2.3 over I2C and GPIO edge
//! interrupts for the encoders (rppal, Linux only).

pub mod error;
pub mod sim;
pub mod store;

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod gpio;
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod shield;

pub use error::HwError;
pub use sim::{SimulatedDriver, SimulatedEncoderInput, SimulatedRig};
pub use store::FilePositionStore;

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub use gpio::GpioEncoderInput;
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub use shield::ShieldDriver;
