use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::workflows::scope::{JobScopeSummary, ScopeIndicator};
use crate::workflows::scoring::{ModelClient, ScoringPolicy, ScoringRequest, TransportError};

/// One scripted reaction of the fake model.
#[derive(Debug, Clone)]
pub(crate) enum Step {
    Reply(String),
    Fail(TransportError),
    /// Never answers, so the attempt runs into its timeout.
    Stall,
}

/// Model client that replays a fixed script and records every request.
#[derive(Debug, Default)]
pub(crate) struct ScriptedClient {
    steps: Mutex<VecDeque<Step>>,
    requests: Mutex<Vec<ScoringRequest>>,
}

impl ScriptedClient {
    pub(crate) fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn requests(&self) -> Vec<ScoringRequest> {
        self.requests.lock().expect("requests lock").clone()
    }

    pub(crate) fn calls(&self) -> usize {
        self.requests.lock().expect("requests lock").len()
    }
}

#[async_trait]
impl ModelClient for ScriptedClient {
    async fn score(&self, request: &ScoringRequest) -> Result<String, TransportError> {
        self.requests
            .lock()
            .expect("requests lock")
            .push(request.clone());
        let step = self.steps.lock().expect("steps lock").pop_front();
        match step {
            Some(Step::Reply(text)) => Ok(text),
            Some(Step::Fail(err)) => Err(err),
            Some(Step::Stall) => Ok(std::future::pending::<String>().await),
            None => Err(TransportError::Rejected {
                status: 400,
                body: "script exhausted".to_string(),
            }),
        }
    }
}

pub(crate) fn valid_response(package_score: u8) -> String {
    format!(
        r#"{{
  "erw_retaining_walls": {{"score": 4, "reasoning": "Three wall sheets", "key_indicators": ["retaining walls"]}},
  "kaufman_concrete": {{"score": 3, "reasoning": "Sidewalk package", "key_indicators": ["concrete flatwork"]}},
  "landtec_landscape": {{"score": 1, "reasoning": "Minor planting", "key_indicators": []}},
  "ratliff_hardscape": {{"score": 0, "reasoning": "No hardscape", "key_indicators": []}},
  "overall_recommendation": "Worth pursuing for walls and concrete.",
  "package_score": {package_score}
}}"#
    )
}

pub(crate) fn fenced(body: &str) -> String {
    format!("```json\n{body}\n```")
}

pub(crate) fn summary() -> JobScopeSummary {
    JobScopeSummary {
        total_sheets: 5,
        sheets_with_scope: 5,
        scope_counts: BTreeMap::from([
            (ScopeIndicator::RetainingWalls, 3),
            (ScopeIndicator::ConcreteFlatwork, 2),
        ]),
        files_analyzed: vec!["a.csv".to_string(), "b.csv".to_string()],
        narrative: "[a.csv] Sheet L1: Walls | density: High | scope: retaining walls".to_string(),
    }
}

pub(crate) fn policy() -> ScoringPolicy {
    ScoringPolicy {
        max_attempts: 3,
        attempt_timeout: Duration::from_secs(5),
        retry_backoff: Duration::from_millis(500),
    }
}
