//! Authenticated HTTP boundary to the grading backend.
//!
//! All traffic to the backend goes through [`ApiClient`]. The client is
//! constructed with an explicit [`TokenProvider`] and re-reads the token on
//! every call, so a token refreshed between calls is honored without
//! rebuilding the client.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;

use crate::capture::AudioClip;
use crate::recordings::Recording;

/// Source of the bearer credential used on every request.
///
/// Implementations read current state at call time rather than caching; the
/// concrete provider used by the application re-reads the credential file on
/// each call.
pub trait TokenProvider {
    /// Returns the current token, or None when the user has not logged in.
    fn token(&self) -> anyhow::Result<Option<String>>;
}

/// The four grading-backend operations the rest of the application uses.
///
/// The pipeline is generic over this trait so its behavior can be exercised
/// against a stub backend in tests.
pub trait GradingApi {
    /// Fetches the full recording listing, most recent first.
    async fn list_recordings(&self) -> Result<Vec<Recording>, ApiError>;

    /// Uploads a finished audio clip with its speaking prompt for analysis.
    /// Returns the raw grading result payload on success.
    async fn analyze(&self, clip: &AudioClip, prompt: &str) -> Result<String, ApiError>;

    /// Fetches the audio bytes for a recording by its server filename.
    async fn fetch_audio(&self, filename: &str) -> Result<Vec<u8>, ApiError>;

    /// Deletes a recording. Success is signaled only by a 2xx status.
    async fn delete_recording(&self, id: i64) -> Result<(), ApiError>;
}
