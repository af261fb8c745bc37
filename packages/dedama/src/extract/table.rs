//! Data-row recognition and table-to-record mapping.

use crate::automation::query::TableData;
use crate::types::record::{is_unit_id, UnitRecord};

/// Name used for a directly extracted table with no usable heading.
pub const UNKNOWN_GROUP: &str = "Unknown Machine";

/// A row is data when it has enough cells and its first cell is a unit number.
///
/// Row position is never consulted, so header and footer rows anywhere in the
/// table are rejected the same way.
pub fn is_data_row<S: AsRef<str>>(cells: &[S], min_columns: usize) -> bool {
    cells.len() >= min_columns && cells.first().is_some_and(|c| is_unit_id(c.as_ref()))
}

/// Records for every data row of one table, in row order.
pub fn parse_rows(rows: &[Vec<String>], min_columns: usize) -> Vec<UnitRecord> {
    rows.iter()
        .filter(|cells| is_data_row(cells, min_columns))
        .map(|cells| UnitRecord::from_cells(cells))
        .collect()
}

/// Records for every data row across all tables, tables in document order.
pub fn parse_tables(tables: &[TableData], min_columns: usize) -> Vec<UnitRecord> {
    tables
        .iter()
        .flat_map(|t| parse_rows(&t.rows, min_columns))
        .collect()
}

/// Group name for a table read without a discovery link.
///
/// Uses the heading when it is 3 to 49 characters long.
pub fn table_group_name(heading: Option<&str>) -> String {
    heading
        .map(str::trim)
        .filter(|h| (3..50).contains(&h.chars().count()))
        .map(String::from)
        .unwrap_or_else(|| UNKNOWN_GROUP.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_row_with_alphabetic_first_cell_is_rejected() {
        let cells = row(&["abc", "1", "2", "3", "4", "5", "6", "7", "8", "9"]);
        assert!(!is_data_row(&cells, 8));
    }

    #[test]
    fn test_row_with_numeric_first_cell_is_accepted() {
        let cells = row(&["7", "1", "2", "3", "4", "5", "6", "7", "8", "9"]);
        assert!(is_data_row(&cells, 8));
    }

    #[test]
    fn test_short_rows_are_rejected() {
        let cells = row(&["7", "1", "2"]);
        assert!(!is_data_row(&cells, 8));
    }

    #[test]
    fn test_parse_rows_skips_header_and_footer() {
        let rows = vec![
            row(&["台番号", "回転数", "累計", "総大当り", "初当り", "確変", "確率", "初当確率", "最大", "前日"]),
            row(&["101", "250", "900", "3", "1", "2", "1/83", "1/250", "1,200", "40"]),
            row(&["", "", "", "", "", "", "", "", "", ""]),
            row(&["102", "abc", "", "0", "0", "0", "-", "-", "", ""]),
            row(&["合計", "250", "900", "3", "1", "2", "", "", "", ""]),
        ];

        let records = parse_rows(&rows, 8);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].unit_id, "101");
        assert_eq!(records[0].max_balls, 1200);
        assert_eq!(records[1].unit_id, "102");
        assert_eq!(records[1].spins, 0);
        assert_eq!(records[1].hit_rate, "-");
    }

    #[test]
    fn test_table_group_name() {
        assert_eq!(table_group_name(Some(" Model X ")), "Model X");
        assert_eq!(table_group_name(Some("ab")), UNKNOWN_GROUP);
        assert_eq!(table_group_name(Some(&"x".repeat(50))), UNKNOWN_GROUP);
        assert_eq!(table_group_name(None), UNKNOWN_GROUP);
    }

    proptest! {
        #[test]
        fn alphabetic_first_cell_never_data(
            first in "[a-zA-Z]{0,6}",
            rest in proptest::collection::vec("[0-9]{1,4}", 0..15),
        ) {
            let mut cells = vec![first];
            cells.extend(rest);
            prop_assert!(!is_data_row(&cells, 8));
        }

        #[test]
        fn numeric_first_cell_is_data_with_enough_columns(
            first in "[0-9]{1,5}",
            rest in proptest::collection::vec(".*", 7..12),
        ) {
            let mut cells = vec![first];
            cells.extend(rest);
            prop_assert!(is_data_row(&cells, 8));
        }
    }
}
