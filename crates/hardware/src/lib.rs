//! # Hardware
//!
//! Simulated devices behind the device traits.
//!
//! - `echo`: trigger/echo pins replaying a distance profile
//! - `camera`: synthetic and file-backed camera sources
//! - `outputs`: LED/buzzer pins and a display that write to the log
//!
//! Real GPIO, camera and LCD bindings plug into the same traits.

mod camera;
mod echo;
mod outputs;

pub use camera::{camera_from_config, FileCamera, SyntheticCamera};
pub use echo::{simulated_ranger, simulated_pins, DistanceScript, EchoPin, TriggerPin};
pub use outputs::{simulated_outputs, ConsoleDisplay, LogPin, SimulatedOutputs};
