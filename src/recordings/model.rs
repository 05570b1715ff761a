//! The recording entity as served by the grading backend.

use chrono::{DateTime, Local};
use serde::Deserialize;

use crate::grading::{self, GradeSet, StructuredResult};

/// One submitted speech recording with its grading results.
///
/// Everything except `id` and `filename` is nullable on the wire: a recording
/// exists as soon as the audio is stored, while transcription and grades are
/// filled in by the grading step and may be absent or partial. Deserialization
/// must therefore never fail on a missing optional field.
#[derive(Debug, Clone, Deserialize)]
pub struct Recording {
    pub id: i64,
    #[serde(default)]
    pub user_id: String,
    /// Server-assigned unique name, used as the audio retrieval key.
    pub filename: String,
    /// Creation instant, ISO-8601 encoded. Kept as raw text so that an
    /// unexpected server format degrades display, not deserialization.
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub transcription: Option<String>,
    #[serde(default)]
    pub model_response: Option<String>,
    #[serde(default)]
    pub metadata: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub pronunciation_grade: Option<f64>,
    #[serde(default)]
    pub fluency_grade: Option<f64>,
    #[serde(default)]
    pub coherence_grade: Option<f64>,
    #[serde(default)]
    pub grammar_grade: Option<f64>,
    #[serde(default)]
    pub vocabulary_grade: Option<f64>,
    #[serde(default)]
    pub grading_explanation: Option<String>,
    #[serde(default)]
    pub grading_notes: Option<String>,
}

impl Recording {
    /// The five grade fields collected into one set.
    pub fn grades(&self) -> GradeSet {
        GradeSet {
            pronunciation: self.pronunciation_grade,
            fluency: self.fluency_grade,
            coherence: self.coherence_grade,
            grammar: self.grammar_grade,
            vocabulary: self.vocabulary_grade,
        }
    }

    /// Parses the creation timestamp into local time.
    ///
    /// Accepts RFC 3339 as well as the space-separated `YYYY-MM-DD HH:MM:SS`
    /// form some backends emit; anything else degrades to None.
    pub fn recorded_at(&self) -> Option<DateTime<Local>> {
        if let Ok(parsed) = DateTime::parse_from_rfc3339(&self.timestamp) {
            return Some(parsed.with_timezone(&Local));
        }
        chrono::NaiveDateTime::parse_from_str(&self.timestamp, "%Y-%m-%d %H:%M:%S%.f")
            .ok()
            .and_then(|naive| naive.and_local_timezone(Local).single())
    }

    /// Tolerantly decodes the attached `model_response`, if any.
    pub fn structured_result(&self) -> Option<StructuredResult> {
        grading::parse_model_response(self.model_response.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_minimal_recording() {
        let json = r#"{"id": 7, "filename": "recording_abc.wav"}"#;
        let recording: Recording = serde_json::from_str(json).unwrap();
        assert_eq!(recording.id, 7);
        assert_eq!(recording.filename, "recording_abc.wav");
        assert!(recording.grades().is_empty());
        assert_eq!(recording.structured_result(), None);
        assert_eq!(recording.recorded_at(), None);
    }

    #[test]
    fn collects_partial_grades() {
        let json = r#"{
            "id": 1,
            "filename": "r.wav",
            "fluency_grade": 0.7,
            "vocabulary_grade": 0.9
        }"#;
        let recording: Recording = serde_json::from_str(json).unwrap();
        let grades = recording.grades();
        assert_eq!(grades.fluency, Some(0.7));
        assert_eq!(grades.vocabulary, Some(0.9));
        assert_eq!(grades.pronunciation, None);
    }

    #[test]
    fn parses_rfc3339_timestamp() {
        let json = r#"{"id": 1, "filename": "r.wav", "timestamp": "2026-03-01T12:30:00+00:00"}"#;
        let recording: Recording = serde_json::from_str(json).unwrap();
        assert!(recording.recorded_at().is_some());
    }
}
