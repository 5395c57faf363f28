use std::io::Cursor;
use std::path::Path;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use tracing::debug;

use super::dialect::{Dialect, RowOutcome};
use super::domain::{ParsedSpreadsheet, ScopeRecord, SourceFile};
use super::normalizer::clean_cell;

/// Failure to map a spreadsheet onto either supported layout.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("{file}: unable to read spreadsheet ({reason})")]
    Unreadable { file: String, reason: String },
    #[error("{file}: spreadsheet contains no header row")]
    EmptyWorkbook { file: String },
    #[error("{file}: unrecognized column layout (headers: {})", headers.join(", "))]
    UnrecognizedLayout { file: String, headers: Vec<String> },
}

impl SchemaError {
    pub fn file(&self) -> &str {
        match self {
            SchemaError::Unreadable { file, .. }
            | SchemaError::EmptyWorkbook { file }
            | SchemaError::UnrecognizedLayout { file, .. } => file,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Delimited(u8),
    Workbook,
}

/// Normalizes one uploaded spreadsheet into scope records.
pub fn parse_spreadsheet(file: &SourceFile) -> Result<ParsedSpreadsheet, SchemaError> {
    let rows = match container_for(file) {
        Container::Delimited(delimiter) => read_delimited(file, delimiter)?,
        Container::Workbook => read_workbook(file)?,
    };

    let mut rows = rows.into_iter();
    let headers = rows
        .by_ref()
        .find(|row| row.iter().any(|cell| clean_cell(cell).is_some()))
        .ok_or_else(|| SchemaError::EmptyWorkbook {
            file: file.filename.clone(),
        })?;

    let dialect = Dialect::detect(&headers).ok_or_else(|| SchemaError::UnrecognizedLayout {
        file: file.filename.clone(),
        headers: headers
            .iter()
            .filter_map(|header| clean_cell(header).map(str::to_string))
            .collect(),
    })?;

    let mut total_sheets = 0u32;
    let mut skipped_rows = 0u32;
    let mut records = Vec::new();

    for (offset, row) in rows.enumerate() {
        match dialect.read_row(&row) {
            RowOutcome::Blank => {}
            RowOutcome::Malformed => {
                skipped_rows += 1;
                debug!(file = %file.filename, row = offset + 2, "skipping row without sheet identity");
            }
            RowOutcome::Sheet(sheet) => {
                total_sheets += 1;
                if !sheet.unrecognized_tags.is_empty() {
                    debug!(
                        file = %file.filename,
                        sheet = %sheet.sheet_id,
                        tags = ?sheet.unrecognized_tags,
                        "ignoring unrecognized scope tags"
                    );
                }
                if sheet.indicators.is_empty() {
                    continue;
                }
                records.push(ScopeRecord {
                    sheet_id: sheet.sheet_id,
                    title: sheet.title,
                    indicators: sheet.indicators,
                    density: sheet.density,
                    summary: sheet.summary,
                });
            }
        }
    }

    debug!(
        file = %file.filename,
        dialect = dialect.kind().label(),
        total_sheets,
        sheets_with_scope = records.len(),
        skipped_rows,
        "normalized spreadsheet"
    );

    Ok(ParsedSpreadsheet {
        filename: file.filename.clone(),
        dialect: dialect.kind(),
        total_sheets,
        skipped_rows,
        records,
    })
}

fn container_for(file: &SourceFile) -> Container {
    let extension = Path::new(&file.filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("csv") | Some("txt") => Container::Delimited(b','),
        Some("tsv") => Container::Delimited(b'\t'),
        Some("xlsx") | Some("xlsm") | Some("xlsb") | Some("xls") | Some("ods") => {
            Container::Workbook
        }
        _ => sniff(&file.bytes),
    }
}

fn sniff(bytes: &[u8]) -> Container {
    const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
    const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0];
    if bytes.starts_with(ZIP_MAGIC) || bytes.starts_with(OLE_MAGIC) {
        Container::Workbook
    } else {
        Container::Delimited(b',')
    }
}

fn read_delimited(file: &SourceFile, delimiter: u8) -> Result<Vec<Vec<String>>, SchemaError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .delimiter(delimiter)
        .from_reader(file.bytes.as_slice());

    // Cells are decoded lossily: Excel exports are often cp1252.
    let mut rows = Vec::new();
    for record in reader.byte_records() {
        let record = record.map_err(|err| SchemaError::Unreadable {
            file: file.filename.clone(),
            reason: err.to_string(),
        })?;
        rows.push(
            record
                .iter()
                .map(|field| String::from_utf8_lossy(field).into_owned())
                .collect(),
        );
    }
    Ok(rows)
}

fn read_workbook(file: &SourceFile) -> Result<Vec<Vec<String>>, SchemaError> {
    let unreadable = |reason: String| SchemaError::Unreadable {
        file: file.filename.clone(),
        reason,
    };

    let mut workbook = open_workbook_auto_from_rs(Cursor::new(file.bytes.clone()))
        .map_err(|err| unreadable(err.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| SchemaError::EmptyWorkbook {
            file: file.filename.clone(),
        })?
        .map_err(|err| unreadable(err.to_string()))?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect())
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(value) => value.clone(),
        Data::Float(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
            format!("{}", *value as i64)
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::scope::domain::{DialectKind, ScopeIndicator};

    const MATRIX_CSV: &str = "Page,Sheet Number,Title,Scale,Scope Summary,Density,Est. Takeoff Time,Retaining walls,Concrete flatwork,Irrigation\n\
1,L1.00,Cover,NTS,,Low,5 min,,,\n\
2,L2.01,Wall Plan,1/8,Segmental walls along north edge,High,45 min,x,,\n\
3,L3.01,Planting Plan,1/8,Trees and irrigation zones,Medium,30 min,,,x\n\
,,,,,,,,,\n\
4,,,,orphan note,,,x,,\n";

    #[test]
    fn parses_indicator_matrix_csv() {
        let file = SourceFile::new("site.csv", MATRIX_CSV);
        let parsed = parse_spreadsheet(&file).expect("parses");

        assert_eq!(parsed.dialect, DialectKind::IndicatorMatrix);
        assert_eq!(parsed.total_sheets, 3);
        assert_eq!(parsed.skipped_rows, 1);
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.records[0].sheet_id, "L2.01");
        assert!(parsed.records[0]
            .indicators
            .contains(&ScopeIndicator::RetainingWalls));
        assert_eq!(parsed.records[1].summary, "Trees and irrigation zones");
    }

    #[test]
    fn non_utf8_cells_do_not_reject_the_file() {
        let mut bytes = b"Sheet Number,Title,Scope Summary,Retaining walls\n\
L1,Wall Plan,Segmental walls,x\n\
L2,Wall Sections,Footing 90"
            .to_vec();
        bytes.push(0xB0);
        bytes.extend_from_slice(b" bend,x\n");

        let parsed = parse_spreadsheet(&SourceFile::new("walls.csv", bytes)).expect("parses");

        assert_eq!(parsed.total_sheets, 2);
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.records[0].sheet_id, "L1");
        assert_eq!(parsed.records[1].sheet_id, "L2");
        assert!(parsed.records[1].summary.starts_with("Footing 90"));
        assert!(parsed.records[1].summary.ends_with(" bend"));
    }

    #[test]
    fn parses_tag_list_with_leading_blank_lines_and_tabs() {
        let tsv = "\n\nsheet_id\tsheet_name\tscope_tags\tintensity\tnotes\n\
C-101\tSite Plan\tConcrete flatwork\thigh\tSidewalks and ADA ramps\n\
C-102\tGrading\tdemolition\tlow\t\n";
        let parsed = parse_spreadsheet(&SourceFile::new("civil.tsv", tsv)).expect("parses");

        assert_eq!(parsed.dialect, DialectKind::TagList);
        assert_eq!(parsed.total_sheets, 2);
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].title.as_deref(), Some("Site Plan"));
    }

    #[test]
    fn file_without_scope_rows_yields_empty_records() {
        let csv = "Sheet Number,Title,Pavers\nA1,Cover,\nA2,Notes,\n";
        let parsed = parse_spreadsheet(&SourceFile::new("cover.csv", csv)).expect("parses");
        assert_eq!(parsed.total_sheets, 2);
        assert!(parsed.records.is_empty());
    }

    #[test]
    fn unmappable_headers_name_the_file() {
        let csv = "Owner,Budget\nACME,100\n";
        let error = parse_spreadsheet(&SourceFile::new("budget.csv", csv)).expect_err("rejected");
        match &error {
            SchemaError::UnrecognizedLayout { file, headers } => {
                assert_eq!(file, "budget.csv");
                assert_eq!(headers, &vec!["Owner".to_string(), "Budget".to_string()]);
            }
            other => panic!("expected layout error, got {other:?}"),
        }
        assert!(error.to_string().starts_with("budget.csv:"));
    }

    #[test]
    fn empty_file_is_reported() {
        let error = parse_spreadsheet(&SourceFile::new("empty.csv", "")).expect_err("rejected");
        assert!(matches!(error, SchemaError::EmptyWorkbook { ref file } if file == "empty.csv"));
    }

    #[test]
    fn corrupt_workbook_is_unreadable() {
        let file = SourceFile::new("broken.xlsx", b"PK\x03\x04not really a zip".to_vec());
        let error = parse_spreadsheet(&file).expect_err("rejected");
        assert!(matches!(error, SchemaError::Unreadable { .. }));
        assert_eq!(error.file(), "broken.xlsx");
    }

    #[test]
    fn unknown_extension_is_sniffed() {
        assert_eq!(sniff(b"PK\x03\x04rest"), Container::Workbook);
        assert_eq!(sniff(b"Sheet Number,Title"), Container::Delimited(b','));
    }

    #[test]
    fn whole_number_cells_drop_the_fraction() {
        assert_eq!(cell_text(&Data::Float(12.0)), "12");
        assert_eq!(cell_text(&Data::Float(1.5)), "1.5");
        assert_eq!(cell_text(&Data::Empty), "");
    }
}
