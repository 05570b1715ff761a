//! Plain-text rendering of recordings and grading results.
//!
//! Rendering is deliberately tolerant: every field of a recording may be
//! absent, and a recording whose grading never ran still renders cleanly
//! with whatever it has. All helpers return plain text; callers add color.

use crate::grading::{GradeSet, StructuredResult};
use crate::recordings::Recording;

const BAR_WIDTH: usize = 10;

/// A ten-segment meter for a grade in [0,1], e.g. `▰▰▰▰▰▰▰▰▱▱ 0.82`.
pub fn grade_bar(value: f64) -> String {
    let clamped = value.clamp(0.0, 1.0);
    let filled = (clamped * BAR_WIDTH as f64).round() as usize;
    let mut bar = String::new();
    for i in 0..BAR_WIDTH {
        bar.push(if i < filled { '▰' } else { '▱' });
    }
    format!("{bar} {clamped:.2}")
}

/// The five-axis performance section, or None when no axis has been graded.
///
/// Ungraded recordings omit the section entirely rather than showing zeros.
pub fn format_performance(grades: &GradeSet) -> Option<String> {
    if grades.is_empty() {
        return None;
    }

    let mut lines = vec!["Performance".to_string()];
    for (label, grade) in grades.entries() {
        if let Some(value) = grade {
            lines.push(format!("  {label:<14}{}", grade_bar(value)));
        }
    }
    if let Some(average) = grades.average() {
        lines.push(format!("  {:<14}{}", "overall", grade_bar(average)));
    }
    Some(lines.join("\n"))
}

/// The model-feedback section of a structured grading result.
///
/// Only present sub-fields are rendered; a fully empty result produces no
/// output at all.
pub fn format_analysis(result: &StructuredResult) -> Option<String> {
    let mut lines = Vec::new();
    if let Some(text) = &result.response_text {
        lines.push(format!("Feedback: {text}"));
    }
    if let Some(confidence) = result.confidence {
        lines.push(format!("Confidence: {confidence:.2}"));
    }
    if let Some(sentiment) = &result.sentiment {
        lines.push(format!("Sentiment: {sentiment}"));
    }
    if let Some(duration) = result.audio_duration {
        lines.push(format!("Audio duration: {duration:.1}s"));
    }
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

/// Full detail view for one recording.
pub fn format_recording_detail(recording: &Recording) -> String {
    let mut sections = Vec::new();

    let mut header = Vec::new();
    let recorded = recording
        .recorded_at()
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "unknown time".to_string());
    header.push(format!("Recording #{} ({recorded})", recording.id));
    if !recording.user_id.is_empty() {
        header.push(format!("User: {}", recording.user_id));
    }
    if let Some(duration) = recording.duration {
        header.push(format!("Duration: {duration:.1}s"));
    }
    if let Some(prompt) = &recording.prompt {
        header.push(format!("Prompt: {prompt}"));
    }
    sections.push(header.join("\n"));

    // The structured result enriches the display but never replaces the
    // flat fields: a malformed payload falls back to them.
    let structured = recording.structured_result();

    let transcription = structured
        .as_ref()
        .and_then(|s| s.transcription.clone())
        .or_else(|| recording.transcription.clone());
    if let Some(text) = transcription {
        sections.push(format!("Transcription: {text}"));
    }

    if let Some(performance) = format_performance(&recording.grades()) {
        sections.push(performance);
    }

    if let Some(analysis) = structured.as_ref().and_then(format_analysis) {
        sections.push(analysis);
    }

    if let Some(explanation) = &recording.grading_explanation {
        sections.push(format!("Explanation: {explanation}"));
    }
    if let Some(notes) = &recording.grading_notes {
        sections.push(format!("Notes: {notes}"));
    }
    if let Some(metadata) = &recording.metadata {
        sections.push(format!("Metadata: {metadata}"));
    }

    sections.join("\n\n")
}

/// One-line listing entry: timestamp, duration, overall grade, prompt.
pub fn format_recording_row(index: usize, recording: &Recording) -> String {
    let recorded = recording
        .recorded_at()
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "----------- --:--".to_string());
    let duration = recording
        .duration
        .map(|d| format!("{d:>5.1}s"))
        .unwrap_or_else(|| "    --".to_string());
    let overall = recording
        .grades()
        .average()
        .map(|avg| format!("{avg:.2}"))
        .unwrap_or_else(|| "  --".to_string());
    let prompt = recording.prompt.as_deref().unwrap_or("--");

    format!("{index:>3}  {recorded}  {duration}  {overall}  {prompt}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording_from(json: &str) -> Recording {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn ungraded_recording_omits_performance_section() {
        let recording = recording_from(
            r#"{"id": 1, "filename": "r.wav", "transcription": "hello there"}"#,
        );
        let detail = format_recording_detail(&recording);

        assert!(!detail.contains("Performance"));
        assert!(detail.contains("hello there"));
    }

    #[test]
    fn malformed_model_response_still_shows_transcription() {
        let recording = recording_from(
            r#"{"id": 1, "filename": "r.wav",
                "transcription": "my day was great",
                "model_response": "{this is not json"}"#,
        );
        let detail = format_recording_detail(&recording);

        assert!(detail.contains("my day was great"));
        assert!(!detail.contains("Feedback"));
    }

    #[test]
    fn partial_grades_render_only_present_axes() {
        let grades = GradeSet {
            fluency: Some(0.5),
            ..GradeSet::default()
        };
        let section = format_performance(&grades).unwrap();

        assert!(section.contains("fluency"));
        assert!(!section.contains("pronunciation"));
    }

    #[test]
    fn nested_result_fields_appear_in_detail() {
        let recording = recording_from(
            r#"{"id": 1, "filename": "r.wav",
                "model_response": "{\"response\": \"{\\\"response\\\": \\\"Nice rhythm.\\\", \\\"confidence\\\": 0.9}\"}"}"#,
        );
        let detail = format_recording_detail(&recording);

        assert!(detail.contains("Nice rhythm."));
        assert!(detail.contains("Confidence: 0.90"));
    }

    #[test]
    fn empty_structured_result_renders_nothing() {
        assert_eq!(format_analysis(&StructuredResult::default()), None);
    }

    #[test]
    fn grade_bar_clamps_out_of_range_values() {
        assert!(grade_bar(1.5).ends_with("1.00"));
        assert!(grade_bar(-0.2).ends_with("0.00"));
    }
}
