use super::domain::ScopeIndicator;
use super::normalizer::normalize_name;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Meaning of a spreadsheet column once its header has been recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ColumnRole {
    SheetId,
    Title,
    Summary,
    Density,
    TagList,
    Indicator(ScopeIndicator),
    /// Known extractor columns that carry nothing the scorer uses.
    Informational,
}

static HEADER_MAP: OnceLock<HashMap<String, ColumnRole>> = OnceLock::new();
static INDICATOR_MAP: OnceLock<HashMap<String, ScopeIndicator>> = OnceLock::new();

pub(crate) fn column_role(header: &str) -> Option<ColumnRole> {
    header_map().get(&normalize_name(header)).copied()
}

pub(crate) fn indicator_for_tag(tag: &str) -> Option<ScopeIndicator> {
    indicator_map().get(&normalize_name(tag)).copied()
}

fn header_map() -> &'static HashMap<String, ColumnRole> {
    HEADER_MAP.get_or_init(|| {
        const HEADER_TO_ROLE: &[(&str, ColumnRole)] = &[
            // Sheet identity
            ("Sheet Number", ColumnRole::SheetId),
            ("Sheet No", ColumnRole::SheetId),
            ("Sheet No.", ColumnRole::SheetId),
            ("Sheet #", ColumnRole::SheetId),
            ("Sheet", ColumnRole::SheetId),
            ("sheet_id", ColumnRole::SheetId),
            ("sheet_ref", ColumnRole::SheetId),
            ("Title", ColumnRole::Title),
            ("Sheet Title", ColumnRole::Title),
            ("sheet_name", ColumnRole::Title),
            // Narrative
            ("Scope Summary", ColumnRole::Summary),
            ("Summary", ColumnRole::Summary),
            ("notes", ColumnRole::Summary),
            ("scope_notes", ColumnRole::Summary),
            ("Description", ColumnRole::Summary),
            // Rating
            ("Density", ColumnRole::Density),
            ("Scope Density", ColumnRole::Density),
            ("intensity", ColumnRole::Density),
            // Tag list dialect
            ("scope_tags", ColumnRole::TagList),
            ("scope_indicators", ColumnRole::TagList),
            ("detected_scope", ColumnRole::TagList),
            ("tags", ColumnRole::TagList),
            // Extractor bookkeeping
            ("Page", ColumnRole::Informational),
            ("PDF Page", ColumnRole::Informational),
            ("Scale", ColumnRole::Informational),
            ("Est. Takeoff Time", ColumnRole::Informational),
            ("Estimated Takeoff Time", ColumnRole::Informational),
        ];

        let mut map = HashMap::with_capacity(HEADER_TO_ROLE.len() + ScopeIndicator::ALL.len());
        for (header, role) in HEADER_TO_ROLE {
            map.insert(normalize_name(header), *role);
        }
        for indicator in ScopeIndicator::ALL {
            map.insert(
                normalize_name(indicator.column_header()),
                ColumnRole::Indicator(indicator),
            );
        }
        map
    })
}

fn indicator_map() -> &'static HashMap<String, ScopeIndicator> {
    INDICATOR_MAP.get_or_init(|| {
        const TAG_TO_INDICATOR: &[(&str, ScopeIndicator)] = &[
            ("Aggregates", ScopeIndicator::AggregatesGravel),
            ("Aggregate", ScopeIndicator::AggregatesGravel),
            ("Gravel", ScopeIndicator::AggregatesGravel),
            ("Decomposed Granite", ScopeIndicator::AggregatesGravel),
            ("Concrete", ScopeIndicator::ConcreteFlatwork),
            ("Flatwork", ScopeIndicator::ConcreteFlatwork),
            ("Concrete Paving", ScopeIndicator::ConcreteFlatwork),
            ("Sidewalks", ScopeIndicator::ConcreteFlatwork),
            ("Fence", ScopeIndicator::Fencing),
            ("Fences", ScopeIndicator::Fencing),
            ("Site Furnishings", ScopeIndicator::Furnishings),
            ("Furniture", ScopeIndicator::Furnishings),
            ("Irrigation Systems", ScopeIndicator::Irrigation),
            ("Paver", ScopeIndicator::Pavers),
            ("Unit Pavers", ScopeIndicator::Pavers),
            ("Retaining Wall", ScopeIndicator::RetainingWalls),
            ("Walls", ScopeIndicator::RetainingWalls),
            ("MSE Walls", ScopeIndicator::RetainingWalls),
            ("Softscape", ScopeIndicator::Softscape),
            ("Landscape Planting", ScopeIndicator::Softscape),
            ("Planting", ScopeIndicator::Softscape),
            ("Landscape", ScopeIndicator::Softscape),
            ("Artificial Turf", ScopeIndicator::SyntheticTurf),
            ("Turf", ScopeIndicator::SyntheticTurf),
            ("Storm Drainage", ScopeIndicator::Drainage),
            ("Site Lighting", ScopeIndicator::Lighting),
            ("BMP", ScopeIndicator::Environmental),
            ("Environmental", ScopeIndicator::Environmental),
            ("Bioswales", ScopeIndicator::Environmental),
            ("Bioswale", ScopeIndicator::Environmental),
        ];

        let mut map = HashMap::with_capacity(TAG_TO_INDICATOR.len() + ScopeIndicator::ALL.len());
        for indicator in ScopeIndicator::ALL {
            map.insert(normalize_name(indicator.label()), indicator);
        }
        for (tag, indicator) in TAG_TO_INDICATOR {
            map.insert(normalize_name(tag), *indicator);
        }
        map
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_extractor_headers_case_insensitively() {
        assert_eq!(column_role("SHEET  NUMBER"), Some(ColumnRole::SheetId));
        assert_eq!(column_role(" scope summary"), Some(ColumnRole::Summary));
        assert_eq!(column_role("Est. Takeoff Time"), Some(ColumnRole::Informational));
        assert_eq!(
            column_role("Retaining Walls"),
            Some(ColumnRole::Indicator(ScopeIndicator::RetainingWalls))
        );
        assert_eq!(
            column_role("bmp/environmental/bioswales"),
            Some(ColumnRole::Indicator(ScopeIndicator::Environmental))
        );
        assert_eq!(column_role("Scope Tags"), Some(ColumnRole::TagList));
        assert_eq!(column_role("Owner"), None);
    }

    #[test]
    fn maps_free_text_tags_onto_the_taxonomy() {
        assert_eq!(
            indicator_for_tag("Retaining walls"),
            Some(ScopeIndicator::RetainingWalls)
        );
        assert_eq!(
            indicator_for_tag("concrete   FLATWORK"),
            Some(ScopeIndicator::ConcreteFlatwork)
        );
        assert_eq!(
            indicator_for_tag("Softscape (Landscape Planting)"),
            Some(ScopeIndicator::Softscape)
        );
        assert_eq!(indicator_for_tag("turf"), Some(ScopeIndicator::SyntheticTurf));
        assert_eq!(indicator_for_tag("demolition"), None);
    }
}
