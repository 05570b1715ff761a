//! Five-axis speech grades.
//!
//! Each grade is a real number in [0,1] and every axis is independently
//! nullable. An absent grade means "not graded", never zero.

use serde::{Deserialize, Serialize};

/// The five performance axes produced by the grading service.
///
/// All fields are optional: the service may grade any subset of axes, and a
/// recording that has not been graded yet carries no grades at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GradeSet {
    #[serde(default)]
    pub pronunciation: Option<f64>,
    #[serde(default)]
    pub fluency: Option<f64>,
    #[serde(default)]
    pub coherence: Option<f64>,
    #[serde(default)]
    pub grammar: Option<f64>,
    #[serde(default)]
    pub vocabulary: Option<f64>,
}

impl GradeSet {
    /// Returns true when no axis has been graded.
    ///
    /// Callers use this to omit the performance section entirely rather than
    /// rendering a row of empty grades.
    pub fn is_empty(&self) -> bool {
        self.entries().iter().all(|(_, grade)| grade.is_none())
    }

    /// Mean of the present grades, or None when nothing has been graded.
    pub fn average(&self) -> Option<f64> {
        let present: Vec<f64> = self
            .entries()
            .iter()
            .filter_map(|(_, grade)| *grade)
            .collect();
        if present.is_empty() {
            return None;
        }
        Some(present.iter().sum::<f64>() / present.len() as f64)
    }

    /// Labelled grades in display order.
    pub fn entries(&self) -> [(&'static str, Option<f64>); 5] {
        [
            ("pronunciation", self.pronunciation),
            ("fluency", self.fluency),
            ("coherence", self.coherence),
            ("grammar", self.grammar),
            ("vocabulary", self.vocabulary),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_grade_set_has_no_average() {
        let grades = GradeSet::default();
        assert!(grades.is_empty());
        assert_eq!(grades.average(), None);
    }

    #[test]
    fn average_ignores_absent_axes() {
        let grades = GradeSet {
            pronunciation: Some(0.8),
            grammar: Some(0.6),
            ..GradeSet::default()
        };
        assert!(!grades.is_empty());
        let avg = grades.average().unwrap();
        assert!((avg - 0.7).abs() < 1e-9);
    }

    #[test]
    fn deserializes_with_missing_fields() {
        let grades: GradeSet = serde_json::from_str(r#"{"fluency": 0.9}"#).unwrap();
        assert_eq!(grades.fluency, Some(0.9));
        assert_eq!(grades.pronunciation, None);
    }
}
