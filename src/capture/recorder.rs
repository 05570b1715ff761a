//! Audio capture from the system microphone.
//!
//! Captures PCM samples from a specified or default input device at the
//! device's native sample rate, downmixing multi-channel input to mono.
//! Stopping a capture finalizes the buffered samples into an immutable
//! in-memory WAV clip, ready for upload.

use std::io::Cursor;
use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use hound::WavWriter;
use thiserror::Error;

/// Capture failures, split between access problems and device problems.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("microphone access was denied. Check your system audio permissions")]
    PermissionDenied,

    #[error("audio input device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("audio encoding failed: {0}")]
    Encode(String),
}

/// A finished, immutable capture: mono 16-bit PCM WAV bytes.
#[derive(Debug, Clone)]
pub struct AudioClip {
    bytes: Vec<u8>,
    sample_rate: u32,
    duration_secs: f32,
}

impl AudioClip {
    /// The fixed upload encoding.
    pub const MIME: &'static str = "audio/wav";

    pub fn new(bytes: Vec<u8>, sample_rate: u32, duration_secs: f32) -> Self {
        Self {
            bytes,
            sample_rate,
            duration_secs,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn duration_secs(&self) -> f32 {
        self.duration_secs
    }

    /// File name used for the multipart upload part.
    pub fn file_name(&self) -> String {
        "speech.wav".to_string()
    }
}

/// Records one capture session at a time from the configured input device.
///
/// State machine: Idle → Recording → Idle. Entering Recording acquires the
/// hardware stream; leaving it releases the stream and delivers the clip
/// exactly once. Dropping the recorder mid-session also releases the stream.
pub struct SpeechRecorder {
    /// Actual sample rate, updated from the device on start.
    sample_rate: u32,
    /// Buffered mono samples for the active session.
    samples: Arc<Mutex<Vec<i16>>>,
    /// Active input stream; Some only while Recording.
    stream: Option<cpal::Stream>,
    /// Device name, numeric index, or "default".
    device_name: String,
}

impl SpeechRecorder {
    pub fn new(requested_sample_rate: u32, device_name: String) -> Self {
        Self {
            sample_rate: requested_sample_rate,
            samples: Arc::new(Mutex::new(Vec::new())),
            stream: None,
            device_name,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.stream.is_some()
    }

    /// Number of samples buffered so far in the active session.
    pub fn sample_count(&self) -> usize {
        self.samples.lock().unwrap().len()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Starts a capture session.
    ///
    /// On failure no session is created and the recorder stays Idle. A start
    /// while already Recording is ignored; one session per instance.
    pub fn start(&mut self) -> Result<(), CaptureError> {
        if self.stream.is_some() {
            tracing::warn!("start() called while already recording; ignored");
            return Ok(());
        }

        suppress_alsa_warnings();

        let host = cpal::default_host();
        let device = if self.device_name == "default" {
            host.default_input_device().ok_or_else(|| {
                CaptureError::DeviceUnavailable("no audio input device available".into())
            })?
        } else {
            find_device(&host, &self.device_name)?
        };

        let device_label = device.name().unwrap_or_else(|_| "unknown device".into());
        tracing::info!("Recording device: {device_label}");

        let device_config = device
            .default_input_config()
            .map_err(|e| classify_device_error(&e.to_string()))?;
        let device_sample_rate = device_config.sample_rate().0;
        let num_channels = device_config.channels() as usize;

        if device_sample_rate != self.sample_rate {
            tracing::warn!(
                "Requested {}Hz but device uses {}Hz; recording at device rate",
                self.sample_rate,
                device_sample_rate
            );
        }
        self.sample_rate = device_sample_rate;

        self.samples.lock().unwrap().clear();
        let samples_arc = Arc::clone(&self.samples);

        let stream = device
            .build_input_stream(
                &device_config.into(),
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    buffer_samples(data, &samples_arc, num_channels);
                },
                |err| {
                    tracing::error!("Audio stream error: {err}");
                },
                None,
            )
            .map_err(|e| classify_device_error(&e.to_string()))?;

        stream
            .play()
            .map_err(|e| classify_device_error(&e.to_string()))?;
        self.stream = Some(stream);

        tracing::debug!("Capture started: {device_sample_rate}Hz, {num_channels} channels");
        Ok(())
    }

    /// Ends the active session and finalizes the clip.
    ///
    /// Releases the hardware stream, encodes the buffered samples to WAV and
    /// returns the clip. A stop while Idle is a no-op returning None, as is
    /// a session that captured no samples.
    pub fn stop(&mut self) -> Result<Option<AudioClip>, CaptureError> {
        if self.stream.take().is_none() {
            tracing::debug!("stop() called while idle; ignored");
            return Ok(None);
        }

        let samples = std::mem::take(&mut *self.samples.lock().unwrap());
        if samples.is_empty() {
            tracing::warn!("Capture stopped with no samples buffered");
            return Ok(None);
        }

        let duration_secs = samples.len() as f32 / self.sample_rate as f32;
        tracing::info!(
            "Capture stopped: {:.2}s ({} samples at {}Hz)",
            duration_secs,
            samples.len(),
            self.sample_rate
        );

        let bytes = encode_wav(&samples, self.sample_rate)?;
        Ok(Some(AudioClip::new(bytes, self.sample_rate, duration_secs)))
    }
}

/// Appends incoming device samples to the session buffer, downmixing to mono
/// by averaging all channels of each frame.
fn buffer_samples(data: &[i16], samples_arc: &Arc<Mutex<Vec<i16>>>, num_channels: usize) {
    let mut samples = samples_arc.lock().unwrap();
    match num_channels {
        0 | 1 => samples.extend_from_slice(data),
        _ => {
            for frame in data.chunks_exact(num_channels) {
                let sum: i32 = frame.iter().map(|&s| s as i32).sum();
                samples.push((sum / num_channels as i32) as i16);
            }
        }
    }
}

/// Encodes mono 16-bit samples as a WAV document in memory.
pub fn encode_wav(samples: &[i16], sample_rate: u32) -> Result<Vec<u8>, CaptureError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    let mut writer =
        WavWriter::new(&mut cursor, spec).map_err(|e| CaptureError::Encode(e.to_string()))?;
    for &sample in samples {
        writer
            .write_sample(sample)
            .map_err(|e| CaptureError::Encode(e.to_string()))?;
    }
    writer
        .finalize()
        .map_err(|e| CaptureError::Encode(e.to_string()))?;

    Ok(cursor.into_inner())
}

/// Finds an input device by name or numeric index.
fn find_device(host: &cpal::Host, device_spec: &str) -> Result<cpal::Device, CaptureError> {
    let devices: Vec<cpal::Device> = host
        .input_devices()
        .map_err(|e| classify_device_error(&e.to_string()))?
        .collect();

    if let Ok(index) = device_spec.parse::<usize>() {
        return devices.into_iter().nth(index).ok_or_else(|| {
            CaptureError::DeviceUnavailable(format!("device index {index} is out of range"))
        });
    }

    devices
        .into_iter()
        .find(|d| d.name().map(|n| n == device_spec).unwrap_or(false))
        .ok_or_else(|| {
            CaptureError::DeviceUnavailable(format!(
                "audio input device '{device_spec}' not found. Use 'lingo list-devices' to see available devices"
            ))
        })
}

/// Splits device failures into permission denials and everything else.
fn classify_device_error(message: &str) -> CaptureError {
    let lowered = message.to_lowercase();
    if lowered.contains("permission") || lowered.contains("denied") || lowered.contains("access") {
        CaptureError::PermissionDenied
    } else {
        CaptureError::DeviceUnavailable(message.to_string())
    }
}

/// Points ALSA at a dummy card so the library's benign probe warnings don't
/// leak onto the terminal. No-op everywhere but Linux.
fn suppress_alsa_warnings() {
    #[cfg(target_os = "linux")]
    if std::env::var("ALSA_CARD").is_err() {
        std::env::set_var("ALSA_CARD", "dummy");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoded_clip_is_nonempty_wav() {
        let samples: Vec<i16> = (0..16000)
            .map(|i| ((i as f32 * 0.05).sin() * 8000.0) as i16)
            .collect();
        let bytes = encode_wav(&samples, 16000).unwrap();

        assert!(!bytes.is_empty());
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");
        assert_eq!(AudioClip::MIME, "audio/wav");
    }

    #[test]
    fn downmix_averages_stereo_frames() {
        let samples = Arc::new(Mutex::new(Vec::new()));
        buffer_samples(&[100, 200, -50, 50], &samples, 2);
        assert_eq!(*samples.lock().unwrap(), vec![150, 0]);
    }

    #[test]
    fn mono_input_is_buffered_verbatim() {
        let samples = Arc::new(Mutex::new(Vec::new()));
        buffer_samples(&[1, 2, 3], &samples, 1);
        assert_eq!(*samples.lock().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn stop_while_idle_is_a_noop() {
        let mut recorder = SpeechRecorder::new(16000, "default".into());
        assert!(!recorder.is_recording());
        assert!(recorder.stop().unwrap().is_none());
    }

    #[test]
    fn classifies_permission_failures() {
        assert!(matches!(
            classify_device_error("Access denied by the OS"),
            CaptureError::PermissionDenied
        ));
        assert!(matches!(
            classify_device_error("device disconnected"),
            CaptureError::DeviceUnavailable(_)
        ));
    }
}
