//! Prompting the scoring model and validating what comes back.

pub mod client;
pub mod request;
pub mod result;
pub mod rubric;
pub mod scorer;

#[cfg(test)]
pub(crate) mod tests;

pub use client::{AnthropicClient, ModelClient, TransportError};
pub use request::{PromptMessage, Role, ScoringRequest};
pub use result::{parse_score_response, DivisionScore, Score, ScoreResult, ValidationError};
pub use rubric::{Division, DivisionProfile, Rubric, ScoreBand};
pub use scorer::{AttemptFailure, JobScorer, ScoringError, ScoringPolicy};
