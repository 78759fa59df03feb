//! Microphone adapter backed by cpal
//!
//! `cpal::Stream` is not `Send` on every backend, so each capture owns a
//! dedicated thread that builds, plays and finally drops the stream. Startup
//! success or failure is reported back over a channel before `open` returns.

use std::sync::mpsc;
use std::sync::Once;
use std::thread::JoinHandle;

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, Sample, SampleFormat, SizedSample, Stream, StreamConfig};

use super::processing::{downmix, CaptureProcessor};
use crate::application::ports::{CaptureError, CaptureStream, FrameBus, MediaTrack, Microphone};
use crate::domain::audio::AudioConstraints;

static ECHO_CANCELLATION_WARNING: Once = Once::new();

/// An input device as reported by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputDeviceInfo {
    pub name: String,
    pub is_default: bool,
}

/// Microphone using the default cpal host
#[derive(Debug, Clone, Default)]
pub struct CpalMicrophone {
    device_name: Option<String>,
}

impl CpalMicrophone {
    /// `device_name` selects an input by exact name; `None` uses the default
    pub fn new(device_name: Option<String>) -> Self {
        Self {
            device_name: device_name.filter(|n| !n.trim().is_empty()),
        }
    }

    /// Input devices of the default host, sorted by name
    pub fn list_input_devices() -> Result<Vec<InputDeviceInfo>, CaptureError> {
        let host = cpal::default_host();
        let default_name = host.default_input_device().and_then(|d| d.name().ok());
        let devices = host
            .input_devices()
            .map_err(|e| CaptureError::StreamFailed(format!("Failed to list input devices: {}", e)))?;

        let mut out: Vec<InputDeviceInfo> = devices
            .filter_map(|d| d.name().ok())
            .map(|name| InputDeviceInfo {
                is_default: default_name.as_deref() == Some(name.as_str()),
                name,
            })
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out.dedup_by(|a, b| a.name == b.name);
        Ok(out)
    }

    /// Whether the host exposes any input device
    pub fn has_input_device() -> bool {
        cpal::default_host().default_input_device().is_some()
    }
}

#[async_trait]
impl Microphone for CpalMicrophone {
    async fn open(&self, constraints: AudioConstraints) -> Result<CaptureStream, CaptureError> {
        if constraints.echo_cancellation {
            ECHO_CANCELLATION_WARNING.call_once(|| {
                tracing::warn!("Echo cancellation is not available for native capture; ignoring");
            });
        }

        let device_name = self.device_name.clone();
        // Waiting for the capture thread to report startup blocks
        tokio::task::spawn_blocking(move || open_capture(device_name, constraints))
            .await
            .map_err(|e| CaptureError::StreamFailed(format!("Task join error: {}", e)))?
    }
}

/// A running capture thread. Stopping ends the thread and drops the stream.
struct CpalTrack {
    label: String,
    stop_tx: Option<mpsc::Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl MediaTrack for CpalTrack {
    fn label(&self) -> &str {
        &self.label
    }

    fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(worker) = self.worker.take() {
            let label = self.label.clone();
            let join = move || {
                if worker.join().is_err() {
                    tracing::warn!(device = %label, "Capture thread panicked");
                }
            };
            // Closing the device can take a while; never hold an async worker for it
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    handle.spawn_blocking(join);
                }
                Err(_) => join(),
            }
        }
    }
}

impl Drop for CpalTrack {
    fn drop(&mut self) {
        self.stop();
    }
}

struct StartedCapture {
    stream: Stream,
    sample_rate: u32,
    label: String,
}

fn open_capture(
    device_name: Option<String>,
    constraints: AudioConstraints,
) -> Result<CaptureStream, CaptureError> {
    let bus = FrameBus::new();
    let worker_bus = bus.clone();
    let (ready_tx, ready_rx) = mpsc::channel::<Result<(u32, String), CaptureError>>();
    let (stop_tx, stop_rx) = mpsc::channel::<()>();

    let worker = std::thread::Builder::new()
        .name("audio-capture".to_string())
        .spawn(move || {
            match start_stream(device_name.as_deref(), constraints, worker_bus) {
                Ok(started) => {
                    let _ = ready_tx.send(Ok((started.sample_rate, started.label.clone())));
                    // Park until stopped or the track is dropped
                    let _ = stop_rx.recv();
                    drop(started.stream);
                    tracing::debug!(device = %started.label, "Capture stream closed");
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                }
            }
        })
        .map_err(|e| CaptureError::StreamFailed(format!("Failed to spawn capture thread: {}", e)))?;

    match ready_rx.recv() {
        Ok(Ok((sample_rate, label))) => {
            let track = CpalTrack {
                label,
                stop_tx: Some(stop_tx),
                worker: Some(worker),
            };
            Ok(CaptureStream::new(sample_rate, bus, vec![Box::new(track)]))
        }
        Ok(Err(e)) => {
            let _ = worker.join();
            Err(e)
        }
        Err(_) => Err(CaptureError::StreamFailed(
            "Capture thread exited during startup".to_string(),
        )),
    }
}

fn select_device(name: Option<&str>) -> Result<Device, CaptureError> {
    let host = cpal::default_host();

    if let Some(needle) = name {
        if let Ok(devices) = host.input_devices() {
            for device in devices {
                if device.name().map(|n| n == needle).unwrap_or(false) {
                    return Ok(device);
                }
            }
        }
        tracing::warn!(device = needle, "Input device not found, using the default input");
    }

    host.default_input_device().ok_or(CaptureError::NoDevice)
}

fn start_stream(
    device_name: Option<&str>,
    constraints: AudioConstraints,
    bus: FrameBus,
) -> Result<StartedCapture, CaptureError> {
    let device = select_device(device_name)?;
    let label = device.name().unwrap_or_else(|_| "unknown input".to_string());
    let supported = device
        .default_input_config()
        .map_err(|e| classify(e.to_string(), CaptureError::UnsupportedConfig))?;

    let sample_rate = supported.sample_rate().0;
    let channels = supported.channels() as usize;
    let config = supported.config();
    let processor = CaptureProcessor::new(sample_rate, constraints);

    tracing::debug!(
        device = %label,
        sample_rate,
        channels,
        format = ?supported.sample_format(),
        processing = processor.is_active(),
        "Opening input stream"
    );

    let stream = match supported.sample_format() {
        SampleFormat::I8 => build_input_stream::<i8>(&device, &config, channels, processor, bus),
        SampleFormat::I16 => build_input_stream::<i16>(&device, &config, channels, processor, bus),
        SampleFormat::I32 => build_input_stream::<i32>(&device, &config, channels, processor, bus),
        SampleFormat::U8 => build_input_stream::<u8>(&device, &config, channels, processor, bus),
        SampleFormat::U16 => build_input_stream::<u16>(&device, &config, channels, processor, bus),
        SampleFormat::U32 => build_input_stream::<u32>(&device, &config, channels, processor, bus),
        SampleFormat::F32 => build_input_stream::<f32>(&device, &config, channels, processor, bus),
        SampleFormat::F64 => build_input_stream::<f64>(&device, &config, channels, processor, bus),
        other => {
            return Err(CaptureError::UnsupportedConfig(format!(
                "sample format {:?}",
                other
            )))
        }
    }
    .map_err(|e| classify(e.to_string(), CaptureError::StreamFailed))?;

    stream
        .play()
        .map_err(|e| classify(e.to_string(), CaptureError::StreamFailed))?;

    Ok(StartedCapture {
        stream,
        sample_rate,
        label,
    })
}

fn build_input_stream<T>(
    device: &Device,
    config: &StreamConfig,
    channels: usize,
    mut processor: CaptureProcessor,
    bus: FrameBus,
) -> Result<Stream, cpal::BuildStreamError>
where
    T: Sample + SizedSample + Send + 'static,
    f32: FromSample<T>,
{
    let mut mono = Vec::new();
    device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            downmix(data, channels, &mut mono, |s| s.to_sample::<f32>());
            processor.process(&mut mono);
            bus.publish(&mono);
        },
        |err| tracing::error!(error = %err, "Audio stream error"),
        None,
    )
}

/// Backends report denied access as free-form text
fn classify(message: String, otherwise: fn(String) -> CaptureError) -> CaptureError {
    let lower = message.to_lowercase();
    if lower.contains("permission") || lower.contains("denied") || lower.contains("not authorized") {
        CaptureError::PermissionDenied(message)
    } else {
        otherwise(message)
    }
}
