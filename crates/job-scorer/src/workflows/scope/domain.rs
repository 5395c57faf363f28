use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Scope categories emitted by the scope extractor, one per indicator column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ScopeIndicator {
    #[serde(rename = "aggregates / gravel")]
    AggregatesGravel,
    #[serde(rename = "concrete flatwork")]
    ConcreteFlatwork,
    #[serde(rename = "fencing")]
    Fencing,
    #[serde(rename = "furnishings")]
    Furnishings,
    #[serde(rename = "irrigation")]
    Irrigation,
    #[serde(rename = "pavers")]
    Pavers,
    #[serde(rename = "retaining walls")]
    RetainingWalls,
    #[serde(rename = "softscape (landscape planting)")]
    Softscape,
    #[serde(rename = "synthetic turf")]
    SyntheticTurf,
    #[serde(rename = "drainage")]
    Drainage,
    #[serde(rename = "lighting")]
    Lighting,
    #[serde(rename = "bmp / environmental / bioswales")]
    Environmental,
}

impl ScopeIndicator {
    pub const ALL: [ScopeIndicator; 12] = [
        ScopeIndicator::AggregatesGravel,
        ScopeIndicator::ConcreteFlatwork,
        ScopeIndicator::Fencing,
        ScopeIndicator::Furnishings,
        ScopeIndicator::Irrigation,
        ScopeIndicator::Pavers,
        ScopeIndicator::RetainingWalls,
        ScopeIndicator::Softscape,
        ScopeIndicator::SyntheticTurf,
        ScopeIndicator::Drainage,
        ScopeIndicator::Lighting,
        ScopeIndicator::Environmental,
    ];

    /// Canonical lowercase label, also the serialized form.
    pub fn label(self) -> &'static str {
        match self {
            ScopeIndicator::AggregatesGravel => "aggregates / gravel",
            ScopeIndicator::ConcreteFlatwork => "concrete flatwork",
            ScopeIndicator::Fencing => "fencing",
            ScopeIndicator::Furnishings => "furnishings",
            ScopeIndicator::Irrigation => "irrigation",
            ScopeIndicator::Pavers => "pavers",
            ScopeIndicator::RetainingWalls => "retaining walls",
            ScopeIndicator::Softscape => "softscape (landscape planting)",
            ScopeIndicator::SyntheticTurf => "synthetic turf",
            ScopeIndicator::Drainage => "drainage",
            ScopeIndicator::Lighting => "lighting",
            ScopeIndicator::Environmental => "bmp / environmental / bioswales",
        }
    }

    /// Column header as written by the scope extractor.
    pub fn column_header(self) -> &'static str {
        match self {
            ScopeIndicator::AggregatesGravel => "Aggregates / gravel",
            ScopeIndicator::ConcreteFlatwork => "Concrete flatwork",
            ScopeIndicator::Fencing => "Fencing",
            ScopeIndicator::Furnishings => "Furnishings",
            ScopeIndicator::Irrigation => "Irrigation",
            ScopeIndicator::Pavers => "Pavers",
            ScopeIndicator::RetainingWalls => "Retaining walls",
            ScopeIndicator::Softscape => "Softscape (landscape planting)",
            ScopeIndicator::SyntheticTurf => "Synthetic turf",
            ScopeIndicator::Drainage => "Drainage",
            ScopeIndicator::Lighting => "Lighting",
            ScopeIndicator::Environmental => "BMP / Environmental / Bioswales",
        }
    }
}

impl fmt::Display for ScopeIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Density {
    Low,
    Medium,
    High,
}

impl Density {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "low" | "l" | "1" | "light" => Some(Density::Low),
            "medium" | "med" | "m" | "moderate" | "2" => Some(Density::Medium),
            "high" | "h" | "3" | "heavy" => Some(Density::High),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Density::Low => "Low",
            Density::Medium => "Medium",
            Density::High => "High",
        }
    }
}

/// One drawing sheet with at least one recognized scope indicator.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScopeRecord {
    pub sheet_id: String,
    pub title: Option<String>,
    pub indicators: BTreeSet<ScopeIndicator>,
    pub density: Option<Density>,
    pub summary: String,
}

impl ScopeRecord {
    pub fn sheet_label(&self) -> String {
        let sheet_id = if self.sheet_id.is_empty() {
            "N/A"
        } else {
            self.sheet_id.as_str()
        };
        format!("Sheet {}: {}", sheet_id, self.title.as_deref().unwrap_or("N/A"))
    }
}

/// Column layout a spreadsheet was recognized as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialectKind {
    /// One column per scope indicator, marked cells flag the indicator.
    IndicatorMatrix,
    /// A single delimited tag column per sheet.
    TagList,
}

impl DialectKind {
    pub fn label(self) -> &'static str {
        match self {
            DialectKind::IndicatorMatrix => "indicator matrix",
            DialectKind::TagList => "tag list",
        }
    }
}

/// Raw upload as received from a caller.
#[derive(Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl SourceFile {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }
}

impl fmt::Debug for SourceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceFile")
            .field("filename", &self.filename)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// Normalized view of a single spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedSpreadsheet {
    pub filename: String,
    pub dialect: DialectKind,
    pub total_sheets: u32,
    pub skipped_rows: u32,
    pub records: Vec<ScopeRecord>,
}

impl ParsedSpreadsheet {
    pub fn sheets_with_scope(&self) -> u32 {
        self.records.len() as u32
    }
}
