//! Shared value types for the pipeline registry domain.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types are
//! the values that flow through an analyze call: the question/context pair
//! going in and the answer coming out.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ModelName;

// ---------------------------------------------------------------------------
// Analyze request / result
// ---------------------------------------------------------------------------

/// A question to be answered from a context passage by a named model.
///
/// Transient: built per request and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    /// Model whose pipeline should answer.
    pub model_name: ModelName,
    /// Natural-language question.
    pub question: String,
    /// Passage the answer is extracted from.
    pub context: String,
}

/// The answer produced for an [`AnalyzeRequest`], paired with the model name
/// the caller asked for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeResult {
    /// The model name from the request, echoed back.
    pub model_name: ModelName,
    /// The answer as returned by the inference collaborator.
    pub answer: Answer,
}

// ---------------------------------------------------------------------------
// Answer
// ---------------------------------------------------------------------------

/// An extracted answer.
///
/// Only [`Answer::text`] is part of the HTTP contract. Backends that report a
/// confidence score or the character span of the answer inside the context
/// fill the optional fields; they are logged but never required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    /// The answer text, passed through verbatim.
    pub text: String,

    /// Backend confidence in `[0.0, 1.0]`, if reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,

    /// Character offsets `[start, end)` of the answer within the context, if reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<(usize, usize)>,
}

impl Answer {
    /// Creates an answer carrying only its text.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            score: None,
            span: None,
        }
    }

    /// Attaches a confidence score.
    ///
    /// Scores that are not finite or fall outside `[0.0, 1.0]` are dropped.
    #[must_use]
    pub fn with_score(mut self, score: f64) -> Self {
        self.score = (score.is_finite() && (0.0..=1.0).contains(&score)).then_some(score);
        self
    }

    /// Attaches the character span of the answer within its context.
    #[must_use]
    pub fn with_span(mut self, start: usize, end: usize) -> Self {
        self.span = (start <= end).then_some((start, end));
        self
    }
}

impl std::fmt::Display for Answer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}

// ---------------------------------------------------------------------------
// Registry snapshots
// ---------------------------------------------------------------------------

/// A read-only description of one registered pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// The model name the pipeline was registered under.
    pub name: ModelName,
    /// When the model finished loading.
    pub loaded_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answer_drops_out_of_range_scores() {
        assert_eq!(Answer::new("x").with_score(0.75).score, Some(0.75));
        assert_eq!(Answer::new("x").with_score(1.5).score, None);
        assert_eq!(Answer::new("x").with_score(f64::NAN).score, None);
    }

    #[test]
    fn answer_rejects_inverted_span() {
        assert_eq!(Answer::new("x").with_span(3, 7).span, Some((3, 7)));
        assert_eq!(Answer::new("x").with_span(7, 3).span, None);
    }

    #[test]
    fn answer_serialisation_omits_missing_metadata() {
        let json = serde_json::to_value(Answer::new("Seoul")).unwrap();
        assert_eq!(json, serde_json::json!({ "text": "Seoul" }));
    }
}
