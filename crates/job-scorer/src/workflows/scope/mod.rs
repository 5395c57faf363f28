//! Spreadsheet normalization for scope extractor exports.
//!
//! Two column layouts are accepted: the extractor's native indicator matrix
//! and a tag list layout. Both resolve to the same [`ScopeRecord`] shape before
//! anything downstream sees them.

pub mod aggregate;
mod dialect;
pub mod domain;
mod mapping;
mod normalizer;
mod parser;

pub use aggregate::{aggregate, JobScopeSummary, MAX_NARRATIVE_SHEETS};
pub use domain::{
    Density, DialectKind, ParsedSpreadsheet, ScopeIndicator, ScopeRecord, SourceFile,
};
pub use parser::{parse_spreadsheet, SchemaError};
