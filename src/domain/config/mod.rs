//! Configuration domain module

mod app_config;

pub use app_config::{
    AppConfig, CaptureConfig, DEFAULT_BITRATE, DEFAULT_SAMPLE_RATE, DEFAULT_TIMESLICE_MS,
    ENCODER_SAMPLE_RATES,
};
