//! Error types for the session engine and its gateways.
//!
//! Only [`GenerationFailure`] and [`IngestionError`] ever block the learner.
//! [`FeedbackFailure`] is recovered inside the controller and
//! [`SessionError`] rejects a single action without changing state.

use thiserror::Error;

use crate::session::Stage;

/// A generated quiz or feedback payload did not match the expected shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaViolation {
    #[error("expected {expected} questions, found {found}")]
    QuestionCount { expected: usize, found: usize },

    #[error("question {question_id} has {found} options, expected 4")]
    OptionCount { question_id: u32, found: usize },

    #[error("question {question_id} has correct index {correct}, expected 0..=3")]
    CorrectOutOfRange { question_id: u32, correct: i64 },

    #[error("question id {0} appears more than once")]
    DuplicateId(u32),

    #[error("question {0} has empty text")]
    EmptyQuestionText(u32),

    #[error("feedback text is empty")]
    EmptyFeedback,
}

/// Quiz generation failed; the session goes back to onboarding.
#[derive(Debug, Error)]
pub enum GenerationFailure {
    /// The LLM provider could not be reached or returned an error.
    #[error("quiz generation request failed: {0}")]
    Provider(String),

    /// The response was not the JSON document we asked for.
    #[error("quiz response is not valid JSON: {0}")]
    Malformed(String),

    #[error("quiz response violates the schema: {0}")]
    Schema(#[from] SchemaViolation),
}

/// Feedback synthesis failed; the controller substitutes fallback feedback.
#[derive(Debug, Error)]
pub enum FeedbackFailure {
    #[error("feedback request failed: {0}")]
    Provider(String),

    #[error("feedback response is not valid JSON: {0}")]
    Malformed(String),

    #[error("feedback response violates the schema: {0}")]
    Schema(#[from] SchemaViolation),
}

/// Study material could not be turned into a corpus.
#[derive(Debug, Error)]
pub enum IngestionError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} contains no readable text")]
    Empty(String),

    #[error("no documents supplied")]
    NoDocuments,

    #[error("unknown course: {0}")]
    UnknownCourse(String),
}

/// A learner action that is not allowed right now.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("cannot {action} while {stage}")]
    InvalidTransition { stage: Stage, action: &'static str },

    #[error("a name is required to start")]
    MissingName,

    #[error("study content is required to start")]
    MissingContent,

    #[error("option {0} does not exist (expected 0..=3)")]
    OptionOutOfRange(usize),

    #[error("question {0} is already answered")]
    AlreadyAnswered(u32),

    #[error("time is up for question {0}")]
    TimedOut(u32),

    #[error("question {0} must be answered or timed out before moving on")]
    CannotAdvance(u32),
}
