use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use super::client::{ModelClient, TransportError};
use super::request::ScoringRequest;
use super::result::{parse_score_response, ScoreResult, ValidationError};
use super::rubric::Rubric;
use crate::workflows::cancel::CancelSignal;
use crate::workflows::scope::JobScopeSummary;

/// Retry budget for a single scoring call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoringPolicy {
    pub max_attempts: u32,
    pub attempt_timeout: Duration,
    /// Delay before attempt `n + 1` is `retry_backoff * n`.
    pub retry_backoff: Duration,
}

impl ScoringPolicy {
    /// Delay after the given failed attempt, saturating instead of overflowing.
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        self.retry_backoff
            .checked_mul(attempt)
            .unwrap_or(Duration::MAX)
    }
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            attempt_timeout: Duration::from_secs(60),
            retry_backoff: Duration::from_millis(500),
        }
    }
}

/// Why a single attempt did not produce a usable verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptFailure {
    TimedOut(Duration),
    Transport(TransportError),
    Invalid(ValidationError),
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptFailure::TimedOut(limit) => {
                write!(f, "no response within {}s", limit.as_secs_f32())
            }
            AttemptFailure::Transport(err) => write!(f, "{err}"),
            AttemptFailure::Invalid(err) => write!(f, "{err}"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ScoringError {
    #[error(transparent)]
    Transport(TransportError),
    #[error("scoring failed after {attempts} attempts: {last_error}")]
    Exhausted {
        attempts: u32,
        last_error: AttemptFailure,
        last_response: Option<String>,
    },
    #[error("scoring cancelled")]
    Cancelled,
}

/// Drives the model through bounded attempts until a reply validates.
pub struct JobScorer<C> {
    client: Arc<C>,
    rubric: Rubric,
    policy: ScoringPolicy,
}

impl<C> JobScorer<C>
where
    C: ModelClient + 'static,
{
    pub fn new(client: Arc<C>, rubric: Rubric, policy: ScoringPolicy) -> Self {
        Self {
            client,
            rubric,
            policy,
        }
    }

    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    pub async fn score(
        &self,
        summary: &JobScopeSummary,
        cancel: &CancelSignal,
    ) -> Result<ScoreResult, ScoringError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let base = ScoringRequest::build(summary, &self.rubric);
        let mut request = base.clone();
        let mut last_response = None;
        let mut attempt = 0u32;

        loop {
            if cancel.is_cancelled() {
                return Err(ScoringError::Cancelled);
            }
            attempt += 1;

            let outcome =
                tokio::time::timeout(self.policy.attempt_timeout, self.client.score(&request))
                    .await;

            let failure = match outcome {
                Err(_) => {
                    request = base.clone();
                    AttemptFailure::TimedOut(self.policy.attempt_timeout)
                }
                Ok(Err(err)) if !err.is_retryable() => {
                    warn!(attempt, error = %err, "model call failed permanently");
                    return Err(ScoringError::Transport(err));
                }
                Ok(Err(err)) => {
                    request = base.clone();
                    AttemptFailure::Transport(err)
                }
                Ok(Ok(raw)) => match parse_score_response(&raw) {
                    Ok(result) => {
                        info!(
                            attempt,
                            package_score = result.package_score.value(),
                            "job scored"
                        );
                        return Ok(result);
                    }
                    Err(err) => {
                        request = base.with_correction(&raw, &err.to_string());
                        last_response = Some(raw);
                        AttemptFailure::Invalid(err)
                    }
                },
            };

            if attempt >= max_attempts {
                warn!(attempts = attempt, error = %failure, "scoring attempts exhausted");
                return Err(ScoringError::Exhausted {
                    attempts: attempt,
                    last_error: failure,
                    last_response,
                });
            }

            warn!(attempt, max_attempts, error = %failure, "scoring attempt failed, retrying");
            tokio::time::sleep(self.policy.backoff_after(attempt)).await;
        }
    }
}
