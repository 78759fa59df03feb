//! Microphone capture adapters

mod cpal_microphone;
mod processing;

pub use cpal_microphone::{CpalMicrophone, InputDeviceInfo};
pub use processing::CaptureProcessor;
