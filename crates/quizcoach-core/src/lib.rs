//! quizcoach-core: session engine for timed, AI-generated quizzes.
//!
//! This crate holds the data model, the session state machine, scoring,
//! the question timer and the gateway traits the rest of quizcoach builds on.

pub mod courses;
pub mod error;
pub mod gateway;
pub mod ingest;
pub mod model;
pub mod prompt;
pub mod schema;
pub mod scoring;
pub mod session;
pub mod timer;
pub mod traits;
