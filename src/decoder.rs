//! C3: parse one tabular row into a [`DecodedRow`] against a resolved [`Layout`] (§4.3).

use crate::errors::{Error, ValidationError};
use crate::layout::Layout;
use crate::normalize::is_empty_value;

/// Cells of one source row, keyed by header/column name exactly as declared
/// in the layout. Blank cells are represented as empty strings.
#[derive(Debug, Clone, Default)]
pub struct RawRow {
    pub cells: Vec<(String, String)>,
}

impl RawRow {
    pub fn new(cells: Vec<(String, String)>) -> RawRow {
        RawRow { cells }
    }
}

/// A single row, decoded against the layout (§4.3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedRow {
    pub level: i32,
    pub values: Vec<String>,
    pub attributes: Vec<(String, String)>,
    pub profession: Option<String>,
}

const SIBLING_SEPARATOR: char = ';';

/// Decodes one row. Fails with [`ValidationError::EmptyNodeRow`] if no node
/// column is populated, or [`ValidationError::MultiNodeRow`] if more than one
/// is (§4.3) — both are row-local and do not abort the load.
pub fn decode_row(row: &RawRow, layout: &Layout) -> Result<DecodedRow, Error> {
    let mut populated_node_columns: Vec<(i32, &str)> = Vec::new();

    for level_col in &layout.node_levels {
        if let Some((_, raw)) = row.cells.iter().find(|(name, _)| *name == level_col.type_name) {
            if !is_empty_value(raw) {
                populated_node_columns.push((level_col.level, raw.as_str()));
            }
        }
    }

    if populated_node_columns.is_empty() {
        return Err(ValidationError::EmptyNodeRow.into());
    }
    if populated_node_columns.len() > 1 {
        return Err(ValidationError::MultiNodeRow.into());
    }
    let (level, raw_value) = populated_node_columns[0];

    let values: Vec<String> = raw_value
        .split(SIBLING_SEPARATOR)
        .map(|token| crate::normalize::normalize(token))
        .filter(|token| !token.is_empty())
        .collect();
    if values.is_empty() {
        return Err(ValidationError::EmptyNodeRow.into());
    }

    let mut attributes = Vec::new();
    for attr_name in &layout.attribute_types {
        if let Some((_, raw)) = row.cells.iter().find(|(name, _)| name == attr_name) {
            if !is_empty_value(raw) {
                attributes.push((attr_name.clone(), crate::normalize::normalize(raw)));
            }
        }
    }

    let profession = layout
        .profession_column
        .as_ref()
        .and_then(|col| row.cells.iter().find(|(name, _)| name == col))
        .map(|(_, raw)| raw)
        .filter(|raw| !is_empty_value(raw))
        .map(|raw| crate::normalize::normalize(raw));

    Ok(DecodedRow { level, values, attributes, profession })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{HeaderTag, Layout};

    fn layout_with_levels() -> Layout {
        let tags = vec![
            HeaderTag::Node { level: 0, name: "Industry".to_string() },
            HeaderTag::Node { level: 1, name: "Profession Group".to_string() },
            HeaderTag::Attribute { name: "State".to_string() },
        ];
        Layout::resolve(&tags, false).unwrap()
    }

    #[test]
    fn decodes_single_populated_level() {
        let layout = layout_with_levels();
        let row = RawRow::new(vec![
            ("Industry".to_string(), "".to_string()),
            ("Profession Group".to_string(), "Nursing".to_string()),
            ("State".to_string(), "TX".to_string()),
        ]);
        let decoded = decode_row(&row, &layout).unwrap();
        assert_eq!(decoded.level, 1);
        assert_eq!(decoded.values, vec!["Nursing".to_string()]);
        assert_eq!(decoded.attributes, vec![("State".to_string(), "TX".to_string())]);
    }

    #[test]
    fn empty_node_row_fails() {
        let layout = layout_with_levels();
        let row = RawRow::new(vec![
            ("Industry".to_string(), "".to_string()),
            ("Profession Group".to_string(), "".to_string()),
        ]);
        let err = decode_row(&row, &layout).unwrap_err();
        assert!(matches!(err, crate::errors::Error::Validation(ValidationError::EmptyNodeRow)));
    }

    #[test]
    fn multiple_populated_node_columns_fails() {
        let layout = layout_with_levels();
        let row = RawRow::new(vec![
            ("Industry".to_string(), "Healthcare".to_string()),
            ("Profession Group".to_string(), "Nursing".to_string()),
        ]);
        let err = decode_row(&row, &layout).unwrap_err();
        assert!(matches!(err, crate::errors::Error::Validation(ValidationError::MultiNodeRow)));
    }

    #[test]
    fn semicolon_cell_splits_into_siblings() {
        let layout = layout_with_levels();
        let row = RawRow::new(vec![("Industry".to_string(), "Acute; Critical".to_string())]);
        let decoded = decode_row(&row, &layout).unwrap();
        assert_eq!(decoded.values, vec!["Acute".to_string(), "Critical".to_string()]);
    }

    #[test]
    fn profession_column_recorded_when_present() {
        let tags = vec![
            HeaderTag::Node { level: 0, name: "Industry".to_string() },
            HeaderTag::Attribute { name: "Profession".to_string() },
            HeaderTag::Profession { name: "Profession".to_string() },
        ];
        let layout = Layout::resolve(&tags, true).unwrap();
        let row = RawRow::new(vec![
            ("Industry".to_string(), "Healthcare".to_string()),
            ("Profession".to_string(), "Registered Nurse".to_string()),
        ]);
        let decoded = decode_row(&row, &layout).unwrap();
        assert_eq!(decoded.profession.as_deref(), Some("Registered Nurse"));
    }
}
