use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::Serialize;
use serde_json::{json, Map, Value};

use super::rubric::{Division, Rubric};
use crate::workflows::scope::JobScopeSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptMessage {
    pub role: Role,
    pub content: String,
}

impl PromptMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Conversation sent to the scoring model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoringRequest {
    pub messages: Vec<PromptMessage>,
}

impl ScoringRequest {
    /// Renders the scoring prompt for a job. Identical inputs always produce
    /// an identical request.
    pub fn build(summary: &JobScopeSummary, rubric: &Rubric) -> Self {
        Self {
            messages: vec![PromptMessage::user(render_prompt(summary, rubric))],
        }
    }

    /// Follow-up conversation asking the model to repair a response that
    /// failed validation. Blank replies are not echoed back as an assistant
    /// turn; the API rejects empty assistant content.
    pub fn with_correction(&self, previous: &str, problem: &str) -> Self {
        let mut messages = self.messages.clone();
        if !previous.trim().is_empty() {
            messages.push(PromptMessage::assistant(previous));
        }
        messages.push(PromptMessage::user(format!(
            "Your previous response could not be used: {problem}\n\n\
             Respond again with ONLY the JSON object in the exact format requested. \
             Every score must be a whole number from 0 to 5 and every field is required."
        )));
        Self { messages }
    }

    pub fn prompt(&self) -> &str {
        self.messages
            .first()
            .map(|message| message.content.as_str())
            .unwrap_or_default()
    }
}

fn render_prompt(summary: &JobScopeSummary, rubric: &Rubric) -> String {
    let counts = summary
        .scope_counts
        .iter()
        .map(|(indicator, count)| (indicator.label(), *count))
        .collect::<BTreeMap<_, _>>()
        .into_iter()
        .map(|(label, count)| (label.to_string(), json!(count)))
        .collect::<Map<String, Value>>();
    let narrative = if summary.narrative.is_empty() {
        "(no sheets with identifiable scope)"
    } else {
        summary.narrative.as_str()
    };

    let mut prompt = String::new();
    prompt.push_str(
        "You are an expert construction estimator familiar with ERW Site Solutions, \
         a Texas-based exterior improvements contractor. Analyze this scope extractor \
         output and score the job for each of their four companies.\n\n",
    );

    prompt.push_str("## Scope Data Summary\n\n");
    let _ = writeln!(prompt, "**Files analyzed:** {}", summary.files_analyzed.join(", "));
    let _ = writeln!(prompt, "**Total sheets analyzed:** {}", summary.total_sheets);
    let _ = writeln!(
        prompt,
        "**Sheets with identifiable scope:** {}\n",
        summary.sheets_with_scope
    );
    let _ = writeln!(
        prompt,
        "**Scope indicator counts across all sheets:**\n{:#}\n",
        Value::Object(counts)
    );
    let _ = writeln!(
        prompt,
        "**Sheet-by-sheet scope (sheets with marked scope items):**\n{narrative}\n"
    );

    prompt.push_str("## Scoring Instructions\n\nScore each company from 0-5 based on:\n");
    for band in &rubric.bands {
        let _ = writeln!(prompt, "- **{}**: {}", band.level, band.description);
    }

    prompt.push_str("\n## Company Scope Mapping\n\n");
    for profile in &rubric.divisions {
        let indicators = profile
            .indicators
            .iter()
            .map(|indicator| format!("`{}`", indicator.column_header()))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(
            prompt,
            "**{}**: Look for {} indicators and mentions of {} in summaries.\n",
            profile.division.name(),
            indicators,
            profile.keywords.join(", ")
        );
    }

    prompt.push_str("## Important Considerations\n\n");
    for (index, (title, detail)) in rubric.considerations.iter().enumerate() {
        let _ = writeln!(prompt, "{}. **{}**: {}", index + 1, title, detail);
    }

    prompt.push_str("\nRespond with ONLY a JSON object in this exact format:\n");
    prompt.push_str(&response_template(rubric));
    prompt
}

fn response_template(rubric: &Rubric) -> String {
    let mut template = String::from("{\n");
    let divisions = rubric
        .divisions
        .iter()
        .map(|profile| profile.division)
        .collect::<Vec<Division>>();
    for division in divisions {
        let _ = writeln!(
            template,
            "    \"{}\": {{\n        \"score\": <0-5>,\n        \"reasoning\": \"<brief explanation of score>\",\n        \"key_indicators\": [\"<specific items found>\"]\n    }},",
            division.key()
        );
    }
    template.push_str("    \"overall_recommendation\": \"<1-2 sentence summary of opportunity>\",\n");
    template.push_str("    \"package_score\": <0-5 overall attractiveness as turnkey package>\n}");
    template
}
