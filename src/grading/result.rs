//! Tolerant two-level decoding of grading result payloads.
//!
//! The `model_response` attached to a recording is a string that usually
//! contains the grading service's JSON output. Inside it, the `response`
//! field may itself be another JSON document, sometimes wrapped in Markdown
//! code fences by the model. Both levels decode leniently: a failure at
//! either level degrades to less structure, never to an error.

use serde::Deserialize;

use super::grades::GradeSet;

/// Normalized grading result extracted from a `model_response` payload.
///
/// Every field is optional; partial payloads keep whatever sub-fields were
/// present and drop the rest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructuredResult {
    pub status: Option<String>,
    pub transcription: Option<String>,
    /// Display text of the model's response, after nested decoding.
    pub response_text: Option<String>,
    pub confidence: Option<f64>,
    pub sentiment: Option<String>,
    pub audio_duration: Option<f64>,
    pub grades: GradeSet,
}

/// Wire shape of the outer grading payload.
#[derive(Debug, Default, Deserialize)]
struct RawResult {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    transcription: Option<String>,
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    grades: Option<GradeSet>,
    #[serde(default)]
    metadata: Option<RawMetadata>,
}

#[derive(Debug, Default, Deserialize)]
struct RawMetadata {
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    sentiment: Option<String>,
    #[serde(default)]
    audio_duration: Option<f64>,
}

/// Wire shape of a nested `response` document.
#[derive(Debug, Default, Deserialize)]
struct InnerResponse {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    sentiment: Option<String>,
}

/// Decodes a recording's `model_response` field.
///
/// Returns `None` when the payload is absent, empty, or not a JSON object;
/// the caller then falls back to the flat fields already present on the
/// recording. Never panics and never returns an error.
pub fn parse_model_response(raw: Option<&str>) -> Option<StructuredResult> {
    let text = raw?.trim();
    if text.is_empty() {
        return None;
    }

    let outer: RawResult = match serde_json::from_str(text) {
        Ok(parsed) => parsed,
        Err(err) => {
            tracing::debug!("model_response is not structured JSON: {err}");
            return None;
        }
    };

    let metadata = outer.metadata.unwrap_or_default();
    let mut result = StructuredResult {
        status: outer.status,
        transcription: outer.transcription,
        response_text: None,
        confidence: metadata.confidence,
        sentiment: metadata.sentiment,
        audio_duration: metadata.audio_duration,
        grades: outer.grades.unwrap_or_default(),
    };

    if let Some(inner_raw) = outer.response {
        let stripped = strip_code_fences(&inner_raw);
        if looks_like_json(stripped) {
            match serde_json::from_str::<InnerResponse>(stripped) {
                Ok(inner) => {
                    result.response_text = inner.response;
                    // Nested values win over the outer metadata.
                    if inner.confidence.is_some() {
                        result.confidence = inner.confidence;
                    }
                    if inner.sentiment.is_some() {
                        result.sentiment = inner.sentiment;
                    }
                }
                Err(err) => {
                    tracing::debug!("nested response is not valid JSON: {err}");
                    result.response_text = Some(stripped.to_string());
                }
            }
        } else {
            result.response_text = Some(stripped.to_string());
        }
    }

    Some(result)
}

/// Removes Markdown code-fence delimiters around a payload, if present.
///
/// Handles both multi-line fences with an optional language tag
/// (```` ```json ````) and single-line fenced snippets.
fn strip_code_fences(text: &str) -> &str {
    let mut body = text.trim();
    if let Some(rest) = body.strip_prefix("```") {
        body = match rest.split_once('\n') {
            Some((_, after_fence_line)) => after_fence_line,
            // Single-line fence: drop the language tag glued to the fence.
            None => rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
        };
    }
    body = body.trim();
    if let Some(rest) = body.strip_suffix("```") {
        body = rest.trim_end();
    }
    body.trim()
}

fn looks_like_json(text: &str) -> bool {
    text.starts_with('{') || text.starts_with('[')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_and_empty_payloads_yield_none() {
        assert_eq!(parse_model_response(None), None);
        assert_eq!(parse_model_response(Some("")), None);
        assert_eq!(parse_model_response(Some("   ")), None);
    }

    #[test]
    fn malformed_payloads_yield_none() {
        for bad in ["not json", "{truncated", "[1, 2", "null", "42", "\"text\""] {
            assert_eq!(parse_model_response(Some(bad)), None, "input: {bad}");
        }
    }

    #[test]
    fn decodes_flat_payload() {
        let payload = r#"{
            "status": "success",
            "transcription": "I went to the beach.",
            "grades": {"pronunciation": 0.81, "fluency": 0.77},
            "metadata": {"confidence": 0.92, "sentiment": "positive", "audio_duration": 4.2}
        }"#;
        let result = parse_model_response(Some(payload)).unwrap();
        assert_eq!(result.transcription.as_deref(), Some("I went to the beach."));
        assert_eq!(result.grades.pronunciation, Some(0.81));
        assert_eq!(result.confidence, Some(0.92));
        assert_eq!(result.sentiment.as_deref(), Some("positive"));
        assert_eq!(result.audio_duration, Some(4.2));
    }

    #[test]
    fn decodes_fenced_nested_response() {
        let payload = r#"{
            "response": "```json\n{\"response\": \"Good pacing overall.\", \"confidence\": 0.88, \"sentiment\": \"neutral\"}\n```"
        }"#;
        let result = parse_model_response(Some(payload)).unwrap();
        assert_eq!(result.response_text.as_deref(), Some("Good pacing overall."));
        assert_eq!(result.confidence, Some(0.88));
        assert_eq!(result.sentiment.as_deref(), Some("neutral"));
    }

    #[test]
    fn nested_values_win_over_outer_metadata() {
        let payload = r#"{
            "metadata": {"confidence": 0.5, "sentiment": "negative"},
            "response": "{\"confidence\": 0.9}"
        }"#;
        let result = parse_model_response(Some(payload)).unwrap();
        assert_eq!(result.confidence, Some(0.9));
        // Sentiment absent from the nested document keeps the outer value.
        assert_eq!(result.sentiment.as_deref(), Some("negative"));
    }

    #[test]
    fn invalid_nested_json_falls_back_to_plain_text() {
        let payload = r#"{"response": "```json\n{broken\n```"}"#;
        let result = parse_model_response(Some(payload)).unwrap();
        assert_eq!(result.response_text.as_deref(), Some("{broken"));
        assert_eq!(result.confidence, None);
    }

    #[test]
    fn plain_text_response_passes_through() {
        let payload = r#"{"response": "Try to vary your vocabulary."}"#;
        let result = parse_model_response(Some(payload)).unwrap();
        assert_eq!(
            result.response_text.as_deref(),
            Some("Try to vary your vocabulary.")
        );
    }

    #[test]
    fn strips_single_line_fences() {
        assert_eq!(strip_code_fences("```json {\"a\": 1}```"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("``` {} ```"), "{}");
        assert_eq!(strip_code_fences("plain"), "plain");
    }
}
