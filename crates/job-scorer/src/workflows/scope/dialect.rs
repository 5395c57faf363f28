use std::collections::BTreeSet;

use super::domain::{DialectKind, Density, ScopeIndicator};
use super::mapping::{column_role, indicator_for_tag, ColumnRole};
use super::normalizer::clean_cell;

/// Column positions shared by both layouts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SheetColumns {
    sheet_id: usize,
    title: Option<usize>,
    summary: Option<usize>,
    density: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MatrixLayout {
    sheet: SheetColumns,
    indicators: Vec<(usize, ScopeIndicator)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TagListLayout {
    sheet: SheetColumns,
    tags: usize,
}

/// Spreadsheet layout, resolved once from the header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Dialect {
    IndicatorMatrix(MatrixLayout),
    TagList(TagListLayout),
}

/// Values read from one data row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SheetRow {
    pub(crate) sheet_id: String,
    pub(crate) title: Option<String>,
    pub(crate) summary: String,
    pub(crate) density: Option<Density>,
    pub(crate) indicators: BTreeSet<ScopeIndicator>,
    pub(crate) unrecognized_tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RowOutcome {
    Blank,
    Malformed,
    Sheet(SheetRow),
}

impl Dialect {
    pub(crate) fn detect(headers: &[String]) -> Option<Self> {
        let mut sheet_id = None;
        let mut title = None;
        let mut summary = None;
        let mut density = None;
        let mut tags = None;
        let mut indicators: Vec<(usize, ScopeIndicator)> = Vec::new();

        for (index, header) in headers.iter().enumerate() {
            let Some(role) = column_role(header) else {
                continue;
            };
            match role {
                ColumnRole::SheetId => {
                    sheet_id.get_or_insert(index);
                }
                ColumnRole::Title => {
                    title.get_or_insert(index);
                }
                ColumnRole::Summary => {
                    summary.get_or_insert(index);
                }
                ColumnRole::Density => {
                    density.get_or_insert(index);
                }
                ColumnRole::TagList => {
                    tags.get_or_insert(index);
                }
                ColumnRole::Indicator(indicator) => {
                    if indicators.iter().all(|(_, seen)| *seen != indicator) {
                        indicators.push((index, indicator));
                    }
                }
                ColumnRole::Informational => {}
            }
        }

        let sheet = SheetColumns {
            sheet_id: sheet_id?,
            title,
            summary,
            density,
        };

        if let Some(tags) = tags {
            return Some(Dialect::TagList(TagListLayout { sheet, tags }));
        }

        if indicators.is_empty() {
            return None;
        }

        Some(Dialect::IndicatorMatrix(MatrixLayout { sheet, indicators }))
    }

    pub(crate) fn kind(&self) -> DialectKind {
        match self {
            Dialect::IndicatorMatrix(_) => DialectKind::IndicatorMatrix,
            Dialect::TagList(_) => DialectKind::TagList,
        }
    }

    pub(crate) fn read_row(&self, row: &[String]) -> RowOutcome {
        if row.iter().all(|cell| clean_cell(cell).is_none()) {
            return RowOutcome::Blank;
        }

        let columns = match self {
            Dialect::IndicatorMatrix(layout) => &layout.sheet,
            Dialect::TagList(layout) => &layout.sheet,
        };

        let sheet_id = cell(row, Some(columns.sheet_id));
        let title = cell(row, columns.title);
        if sheet_id.is_none() && title.is_none() {
            return RowOutcome::Malformed;
        }

        let mut indicators = BTreeSet::new();
        let mut unrecognized_tags = Vec::new();
        match self {
            Dialect::IndicatorMatrix(layout) => {
                for (index, indicator) in &layout.indicators {
                    if cell(row, Some(*index)).is_some() {
                        indicators.insert(*indicator);
                    }
                }
            }
            Dialect::TagList(layout) => {
                for tag in split_tags(cell(row, Some(layout.tags)).unwrap_or_default()) {
                    match indicator_for_tag(tag) {
                        Some(indicator) => {
                            indicators.insert(indicator);
                        }
                        None => unrecognized_tags.push(tag.to_string()),
                    }
                }
            }
        }

        RowOutcome::Sheet(SheetRow {
            sheet_id: sheet_id.unwrap_or_default().to_string(),
            title: title.map(str::to_string),
            summary: cell(row, columns.summary).unwrap_or_default().to_string(),
            density: cell(row, columns.density).and_then(Density::parse),
            indicators,
            unrecognized_tags,
        })
    }
}

fn cell(row: &[String], index: Option<usize>) -> Option<&str> {
    index
        .and_then(|index| row.get(index))
        .and_then(|value| clean_cell(value))
}

fn split_tags(raw: &str) -> impl Iterator<Item = &str> {
    raw.split([';', ',', '|', '\n'])
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|cell| cell.to_string()).collect()
    }

    #[test]
    fn detects_indicator_matrix_from_extractor_headers() {
        let dialect = Dialect::detect(&headers(&[
            "Page",
            "Sheet Number",
            "Title",
            "Scope Summary",
            "Density",
            "Retaining walls",
            "Pavers",
        ]))
        .expect("matrix recognized");
        assert_eq!(dialect.kind(), DialectKind::IndicatorMatrix);
    }

    #[test]
    fn tag_column_wins_over_indicator_columns() {
        let dialect = Dialect::detect(&headers(&["sheet_id", "scope_tags", "Pavers"]))
            .expect("tag list recognized");
        assert_eq!(dialect.kind(), DialectKind::TagList);
    }

    #[test]
    fn layouts_without_sheet_identity_or_scope_columns_are_rejected() {
        assert!(Dialect::detect(&headers(&["Title", "Retaining walls"])).is_none());
        assert!(Dialect::detect(&headers(&["Sheet Number", "Title", "Density"])).is_none());
        assert!(Dialect::detect(&headers(&["Owner", "Budget"])).is_none());
    }

    #[test]
    fn matrix_rows_mark_any_non_blank_indicator_cell() {
        let dialect = Dialect::detect(&headers(&[
            "Sheet Number",
            "Title",
            "Density",
            "Retaining walls",
            "Pavers",
            "Irrigation",
        ]))
        .expect("matrix recognized");

        let outcome = dialect.read_row(&row(&["L1.01", "Walls", "High", "x", "", "1"]));
        let RowOutcome::Sheet(sheet) = outcome else {
            panic!("expected sheet row, got {outcome:?}");
        };
        assert_eq!(sheet.sheet_id, "L1.01");
        assert_eq!(sheet.density, Some(Density::High));
        assert_eq!(
            sheet.indicators,
            BTreeSet::from([ScopeIndicator::RetainingWalls, ScopeIndicator::Irrigation])
        );
    }

    #[test]
    fn tag_rows_split_delimited_tags_and_keep_unknown_ones_aside() {
        let dialect = Dialect::detect(&headers(&["sheet_id", "sheet_name", "scope_tags", "intensity"]))
            .expect("tag list recognized");

        let outcome = dialect.read_row(&row(&[
            "C-201",
            "Paving Plan",
            "Concrete flatwork; curb ramps | Pavers",
            "2",
        ]));
        let RowOutcome::Sheet(sheet) = outcome else {
            panic!("expected sheet row, got {outcome:?}");
        };
        assert_eq!(
            sheet.indicators,
            BTreeSet::from([ScopeIndicator::ConcreteFlatwork, ScopeIndicator::Pavers])
        );
        assert_eq!(sheet.unrecognized_tags, vec!["curb ramps".to_string()]);
        assert_eq!(sheet.density, Some(Density::Medium));
    }

    #[test]
    fn blank_and_anonymous_rows_are_classified() {
        let dialect = Dialect::detect(&headers(&["Sheet Number", "Title", "Pavers"]))
            .expect("matrix recognized");
        assert_eq!(dialect.read_row(&row(&["", " ", ""])), RowOutcome::Blank);
        assert_eq!(dialect.read_row(&row(&[])), RowOutcome::Blank);
        assert_eq!(dialect.read_row(&row(&["", "", "x"])), RowOutcome::Malformed);
    }
}
