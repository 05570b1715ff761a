//! reqwest-backed implementation of the grading API.

use std::time::Duration;

use reqwest::multipart;

use super::error::ApiError;
use super::{GradingApi, TokenProvider};
use crate::capture::AudioClip;
use crate::recordings::Recording;

/// HTTP client for the grading backend.
///
/// Every call carries a bounded timeout so an unresponsive backend cannot
/// hang the submit flow, and derives its bearer header from the token
/// provider at call time.
pub struct ApiClient<T: TokenProvider> {
    base_url: String,
    http: reqwest::Client,
    tokens: T,
}

impl<T: TokenProvider> ApiClient<T> {
    /// Creates a client for the given base URL (e.g. `http://host:8000/api`).
    pub fn new(base_url: &str, tokens: T, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
            tokens,
        })
    }

    /// Reads the current bearer token. Missing tokens fail the call rather
    /// than sending an unauthenticated request the server would reject.
    fn bearer(&self) -> Result<String, ApiError> {
        match self.tokens.token() {
            Ok(Some(token)) => Ok(token),
            Ok(None) => Err(ApiError::MissingToken),
            Err(err) => Err(ApiError::Credentials(err.to_string())),
        }
    }

    /// Passes 2xx responses through and maps everything else onto the error
    /// taxonomy, consuming the body as diagnostic text.
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_status(status, body))
    }
}

impl<T: TokenProvider> GradingApi for ApiClient<T> {
    async fn list_recordings(&self) -> Result<Vec<Recording>, ApiError> {
        let url = format!("{}/recordings", self.base_url);
        tracing::debug!("GET {url}");

        let response = self
            .http
            .get(&url)
            .bearer_auth(self.bearer()?)
            .send()
            .await
            .map_err(ApiError::from_transport)?;
        let response = Self::check_status(response).await?;

        let recordings: Vec<Recording> = response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        tracing::debug!("Listed {} recordings", recordings.len());
        Ok(recordings)
    }

    async fn analyze(&self, clip: &AudioClip, prompt: &str) -> Result<String, ApiError> {
        let url = format!("{}/analyze-audio", self.base_url);
        tracing::info!(
            "Submitting {:.1}s clip ({} bytes) for analysis",
            clip.duration_secs(),
            clip.bytes().len()
        );

        let audio_part = multipart::Part::bytes(clip.bytes().to_vec())
            .file_name(clip.file_name())
            .mime_str(AudioClip::MIME)
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        let form = multipart::Form::new()
            .part("audio", audio_part)
            .text("prompt", prompt.to_string());

        let response = self
            .http
            .post(&url)
            .bearer_auth(self.bearer()?)
            .multipart(form)
            .send()
            .await
            .map_err(ApiError::from_transport)?;
        let response = Self::check_status(response).await?;

        response
            .text()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn fetch_audio(&self, filename: &str) -> Result<Vec<u8>, ApiError> {
        let url = format!(
            "{}/recordings/{}",
            self.base_url,
            urlencoding::encode(filename)
        );
        tracing::debug!("GET {url}");

        let response = self
            .http
            .get(&url)
            .bearer_auth(self.bearer()?)
            .send()
            .await
            .map_err(ApiError::from_transport)?;
        let response = Self::check_status(response).await?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    async fn delete_recording(&self, id: i64) -> Result<(), ApiError> {
        let url = format!("{}/recordings/{id}", self.base_url);
        tracing::info!("DELETE {url}");

        let response = self
            .http
            .delete(&url)
            .bearer_auth(self.bearer()?)
            .send()
            .await
            .map_err(ApiError::from_transport)?;
        Self::check_status(response).await?;
        Ok(())
    }
}
