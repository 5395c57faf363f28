use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::body::to_bytes;
use axum::response::Response;
use serde_json::Value;

pub(super) use crate::workflows::scoring::tests::common::{valid_response, ScriptedClient, Step};

use crate::workflows::cancel::CancelSignal;
use crate::workflows::job::{
    JobId, JobRecord, JobRepository, JobService, PersistenceError, SchemaPolicy, ScoringPipeline,
};
use crate::workflows::scope::SourceFile;
use crate::workflows::scoring::{Rubric, ScoringPolicy};

pub(super) fn matrix_file() -> SourceFile {
    SourceFile::new(
        "site-walls.csv",
        "Page,Sheet Number,Title,Scale,Scope Summary,Density,Est. Takeoff Time,Retaining walls,Concrete flatwork\n\
         1,L1.01,North Walls,1/8,Segmental walls,High,40 min,x,\n\
         2,L1.02,South Walls,1/8,Boulder walls,Medium,30 min,x,\n\
         3,L1.03,Wall Details,NTS,MSE wall sections,Low,20 min,x,\n",
    )
}

pub(super) fn tag_list_file() -> SourceFile {
    SourceFile::new(
        "civil-paving.csv",
        "sheet_id,sheet_name,scope_tags,intensity,notes\n\
         C-101,Paving Plan,Concrete flatwork,high,Sidewalks and ramps\n\
         C-102,Paving Details,concrete flatwork,2,Curb and gutter\n",
    )
}

pub(super) fn cover_only_file() -> SourceFile {
    SourceFile::new(
        "cover.csv",
        "Sheet Number,Title,Density,Retaining walls,Pavers\n\
         G0.00,Cover Sheet,Low,,\n\
         G0.01,General Notes,Low,,\n",
    )
}

pub(super) fn unrecognized_file() -> SourceFile {
    SourceFile::new("budget.csv", "Owner,Budget\nACME,100\n")
}

pub(super) fn policy() -> ScoringPolicy {
    crate::workflows::scoring::tests::common::policy()
}

pub(super) fn pipeline(
    client: &Arc<ScriptedClient>,
    schema_policy: SchemaPolicy,
) -> ScoringPipeline<ScriptedClient> {
    ScoringPipeline::new(client.clone(), Rubric::standard(), policy(), schema_policy)
}

pub(super) fn build_service<R: JobRepository + 'static>(
    steps: Vec<Step>,
    repository: Arc<R>,
) -> (JobService<ScriptedClient, R>, Arc<ScriptedClient>) {
    let client = Arc::new(ScriptedClient::new(steps));
    let service = JobService::new(
        Arc::new(pipeline(&client, SchemaPolicy::FailJob)),
        repository,
        CancelSignal::new(),
    );
    (service, client)
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) records: Arc<Mutex<HashMap<JobId, JobRecord>>>,
}

impl JobRepository for MemoryRepository {
    fn insert(&self, record: JobRecord) -> Result<JobRecord, PersistenceError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.job_id) {
            return Err(PersistenceError::Conflict(record.job_id.clone()));
        }
        guard.insert(record.job_id.clone(), record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &JobId) -> Result<Option<JobRecord>, PersistenceError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }
}

pub(super) struct UnavailableRepository;

impl JobRepository for UnavailableRepository {
    fn insert(&self, _record: JobRecord) -> Result<JobRecord, PersistenceError> {
        Err(PersistenceError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &JobId) -> Result<Option<JobRecord>, PersistenceError> {
        Err(PersistenceError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("json body")
}
