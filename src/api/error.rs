//! Error taxonomy for the grading API boundary.

use reqwest::StatusCode;
use thiserror::Error;

/// Failures surfaced by the grading API client.
///
/// There is deliberately no retry machinery here: every operation is a
/// single attempt and the error propagates to the caller for user-facing
/// messaging. Error response bodies are opaque diagnostic text.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("not authorized by the grading server. Run 'lingo auth' to update your access token")]
    Unauthorized,

    #[error("the recording was not found on the server")]
    NotFound,

    #[error("grading server error (status {status}): {body}")]
    Server { status: u16, body: String },

    #[error("request to the grading server timed out. The server is not responding")]
    Timeout,

    #[error("could not connect to the grading server. Check the server URL and your connection")]
    Connect,

    #[error("network error talking to the grading server: {0}")]
    Network(String),

    #[error("unexpected response from the grading server: {0}")]
    Decode(String),

    #[error("no access token configured. Run 'lingo auth' first")]
    MissingToken,

    #[error("could not read the stored access token: {0}")]
    Credentials(String),
}

impl ApiError {
    /// Maps a non-2xx response onto the taxonomy.
    pub fn from_status(status: StatusCode, body: String) -> Self {
        match status.as_u16() {
            401 => ApiError::Unauthorized,
            404 => ApiError::NotFound,
            code => ApiError::Server {
                status: code,
                body: truncate(&body, 200),
            },
        }
    }

    /// Maps a reqwest transport failure onto the taxonomy.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if err.is_connect() {
            ApiError::Connect
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

fn truncate(text: &str, max: usize) -> String {
    let trimmed = text.trim();
    match trimmed.char_indices().nth(max) {
        Some((cut, _)) => format!("{}…", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_status_codes() {
        assert!(matches!(
            ApiError::from_status(StatusCode::UNAUTHORIZED, String::new()),
            ApiError::Unauthorized
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::NOT_FOUND, String::new()),
            ApiError::NotFound
        ));
        match ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, "boom".into()) {
            ApiError::Server { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("expected Server, got {other:?}"),
        }
    }

    #[test]
    fn truncates_long_error_bodies() {
        let body = "x".repeat(500);
        match ApiError::from_status(StatusCode::BAD_GATEWAY, body) {
            ApiError::Server { body, .. } => assert!(body.chars().count() <= 201),
            other => panic!("expected Server, got {other:?}"),
        }
    }
}
