use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{ParsedSpreadsheet, ScopeIndicator, ScopeRecord};

/// Upper bound on sheets embedded in the narrative.
pub const MAX_NARRATIVE_SHEETS: usize = 50;

/// Job-level view over every file submitted together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobScopeSummary {
    pub total_sheets: u32,
    pub sheets_with_scope: u32,
    pub scope_counts: BTreeMap<ScopeIndicator, u32>,
    pub files_analyzed: Vec<String>,
    pub narrative: String,
}

impl JobScopeSummary {
    pub fn count_for(&self, indicator: ScopeIndicator) -> u32 {
        self.scope_counts.get(&indicator).copied().unwrap_or(0)
    }
}

/// Merges normalized spreadsheets into a single summary.
///
/// Files are ordered by filename, then by content when names collide, so the
/// result does not depend on the order in which uploads arrived.
pub fn aggregate(files: &[ParsedSpreadsheet]) -> JobScopeSummary {
    let mut ordered: Vec<&ParsedSpreadsheet> = files.iter().collect();
    ordered.sort_by(|left, right| {
        left.filename
            .cmp(&right.filename)
            .then_with(|| left.total_sheets.cmp(&right.total_sheets))
            .then_with(|| left.records.cmp(&right.records))
    });

    let mut total_sheets = 0u32;
    let mut sheets_with_scope = 0u32;
    let mut scope_counts: BTreeMap<ScopeIndicator, u32> = BTreeMap::new();
    let mut lines = Vec::new();
    let mut hidden = 0usize;

    for file in &ordered {
        total_sheets += file.total_sheets;
        sheets_with_scope += file.sheets_with_scope();
        for record in &file.records {
            for indicator in &record.indicators {
                *scope_counts.entry(*indicator).or_insert(0) += 1;
            }
            if lines.len() < MAX_NARRATIVE_SHEETS {
                lines.push(narrative_line(&file.filename, record));
            } else {
                hidden += 1;
            }
        }
    }

    if hidden > 0 {
        lines.push(format!("(+{hidden} more sheets with scope not shown)"));
    }

    JobScopeSummary {
        total_sheets,
        sheets_with_scope,
        scope_counts,
        files_analyzed: ordered.iter().map(|file| file.filename.clone()).collect(),
        narrative: lines.join("\n"),
    }
}

fn narrative_line(filename: &str, record: &ScopeRecord) -> String {
    let indicators = record
        .indicators
        .iter()
        .map(|indicator| indicator.label())
        .collect::<Vec<_>>()
        .join(", ");
    let density = record.density.map(|density| density.label()).unwrap_or("N/A");

    let mut line = format!(
        "[{filename}] {} | density: {density} | scope: {indicators}",
        record.sheet_label()
    );
    if !record.summary.is_empty() {
        line.push_str(" | ");
        line.push_str(&record.summary);
    }
    line
}
