//! Grading result types and tolerant result decoding.
//!
//! The grading service attaches a raw `model_response` payload to every
//! recording. The payload is usually JSON but arrives as opaque text and may
//! be truncated, malformed, or missing entirely. This module normalizes it
//! into a structured record without ever failing the caller.

pub mod grades;
pub mod result;

pub use grades::GradeSet;
pub use result::{parse_model_response, StructuredResult};
