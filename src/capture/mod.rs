//! Microphone capture and WAV finalization.

pub mod recorder;

pub use recorder::{encode_wav, AudioClip, CaptureError, SpeechRecorder};
