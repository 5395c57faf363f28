use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::workflows::scope::JobScopeSummary;
use crate::workflows::scoring::ScoreResult;

/// Short job handle: eight lowercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub const LEN: usize = 8;

    pub fn generate() -> Self {
        let mut id = Uuid::new_v4().simple().to_string();
        id.truncate(Self::LEN);
        Self(id)
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let valid = raw.len() == Self::LEN
            && raw
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));
        valid.then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity and provenance attached to a scored job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobMetadata {
    pub job_id: JobId,
    pub analyzed_at: DateTime<Utc>,
    pub source_files: Vec<String>,
}

impl JobMetadata {
    pub fn new(source_files: Vec<String>) -> Self {
        Self::with(JobId::generate(), Utc::now(), source_files)
    }

    pub fn with(job_id: JobId, analyzed_at: DateTime<Utc>, source_files: Vec<String>) -> Self {
        Self {
            job_id,
            analyzed_at,
            source_files,
        }
    }

    /// `plan.xlsx` for one file, `2 files: plan.xlsx, civil.csv` for several.
    pub fn display_filename(&self) -> String {
        match self.source_files.as_slice() {
            [single] => single.clone(),
            files => format!("{} files: {}", files.len(), files.join(", ")),
        }
    }
}

/// Final output of a scoring job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: JobId,
    pub filename: String,
    pub files_analyzed: Vec<String>,
    pub analyzed_at: DateTime<Utc>,
    pub summary: JobScopeSummary,
    pub scores: ScoreResult,
    #[serde(
        rename = "pdf_base64",
        with = "pdf_base64",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pdf: Option<Vec<u8>>,
}

impl JobRecord {
    pub fn assemble(summary: JobScopeSummary, scores: ScoreResult, metadata: JobMetadata) -> Self {
        let filename = metadata.display_filename();
        Self {
            job_id: metadata.job_id,
            filename,
            files_analyzed: metadata.source_files,
            analyzed_at: metadata.analyzed_at,
            summary,
            scores,
            pdf: None,
        }
    }

    /// Attaches a rendered report ahead of persistence.
    pub fn with_pdf(mut self, document: Vec<u8>) -> Self {
        self.pdf = Some(document);
        self
    }

    pub fn pdf(&self) -> Option<&[u8]> {
        self.pdf.as_deref()
    }
}

mod pdf_base64 {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S>(value: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(bytes) => serializer.serialize_some(&STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|encoded| STANDARD.decode(encoded).map_err(D::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::scope::ScopeIndicator;
    use crate::workflows::scoring::parse_score_response;
    use chrono::TimeZone;
    use std::collections::BTreeMap;

    fn scores() -> ScoreResult {
        parse_score_response(
            r#"{
                "erw_retaining_walls": {"score": 4, "reasoning": "walls", "key_indicators": ["MSE walls"]},
                "kaufman_concrete": {"score": 3, "reasoning": "flatwork", "key_indicators": []},
                "landtec_landscape": {"score": 1, "reasoning": "little planting", "key_indicators": []},
                "ratliff_hardscape": {"score": 0, "reasoning": "none", "key_indicators": []},
                "overall_recommendation": "Bid walls and concrete together.",
                "package_score": 3
            }"#,
        )
        .expect("valid scores")
    }

    fn summary() -> JobScopeSummary {
        JobScopeSummary {
            total_sheets: 5,
            sheets_with_scope: 5,
            scope_counts: BTreeMap::from([
                (ScopeIndicator::RetainingWalls, 3),
                (ScopeIndicator::ConcreteFlatwork, 2),
            ]),
            files_analyzed: vec!["a.csv".to_string(), "b.csv".to_string()],
            narrative: "[a.csv] Sheet L1: Walls | density: High | scope: retaining walls"
                .to_string(),
        }
    }

    fn metadata(files: &[&str]) -> JobMetadata {
        JobMetadata::with(
            JobId::parse("0a1b2c3d").expect("valid id"),
            Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0)
                .single()
                .expect("valid timestamp"),
            files.iter().map(|file| file.to_string()).collect(),
        )
    }

    #[test]
    fn generated_ids_are_short_hex_handles() {
        let id = JobId::generate();
        assert_eq!(id.as_str().len(), JobId::LEN);
        assert!(JobId::parse(id.as_str()).is_some());
        assert!(JobId::parse("0A1B2C3D").is_none());
        assert!(JobId::parse("abc").is_none());
        assert!(JobId::parse("zzzzzzzz").is_none());
    }

    #[test]
    fn display_filename_lists_multiple_sources() {
        assert_eq!(metadata(&["plan.xlsx"]).display_filename(), "plan.xlsx");
        assert_eq!(
            metadata(&["b.csv", "a.xlsx"]).display_filename(),
            "2 files: b.csv, a.xlsx"
        );
    }

    #[test]
    fn assemble_merges_metadata_summary_and_scores() {
        let record = JobRecord::assemble(summary(), scores(), metadata(&["b.csv", "a.csv"]));
        assert_eq!(record.job_id.as_str(), "0a1b2c3d");
        assert_eq!(record.filename, "2 files: b.csv, a.csv");
        assert_eq!(record.files_analyzed, vec!["b.csv", "a.csv"]);
        assert_eq!(record.scores.package_score.value(), 3);
        assert!(record.pdf().is_none());
    }

    #[test]
    fn json_shape_and_round_trip() {
        let record = JobRecord::assemble(summary(), scores(), metadata(&["a.csv", "b.csv"]));
        let json = serde_json::to_value(&record).expect("serializes");

        assert_eq!(json["job_id"], "0a1b2c3d");
        assert_eq!(json["analyzed_at"], "2025-03-14T09:30:00Z");
        assert_eq!(json["summary"]["scope_counts"]["retaining walls"], 3);
        assert_eq!(json["scores"]["erw_retaining_walls"]["score"], 4);
        assert!(json.get("pdf_base64").is_none());

        let restored: JobRecord = serde_json::from_value(json).expect("deserializes");
        assert_eq!(restored, record);
    }

    #[test]
    fn attached_pdf_travels_as_base64() {
        let record = JobRecord::assemble(summary(), scores(), metadata(&["a.csv"]))
            .with_pdf(b"%PDF-1.7".to_vec());
        let json = serde_json::to_string(&record).expect("serializes");
        assert!(json.contains("\"pdf_base64\":\"JVBERi0xLjc=\""));

        let restored: JobRecord = serde_json::from_str(&json).expect("deserializes");
        assert_eq!(restored.pdf(), Some(&b"%PDF-1.7"[..]));
    }
}
