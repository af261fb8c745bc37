//! Record types - table rows, date snapshots and group datasets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// One row of a unit data table.
///
/// Column order on the site is fixed, so rows map positionally onto these
/// fields (see [`UnitRecord::from_cells`]). Count fields that are missing or
/// non-numeric on the page become `0`; the two rate fields keep the page
/// text verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitRecord {
    /// Unit number, purely numeric text
    #[serde(alias = "台番号")]
    pub unit_id: String,

    #[serde(alias = "回転数", deserialize_with = "lenient_count", default)]
    pub spins: u64,

    #[serde(alias = "累計スタート", deserialize_with = "lenient_count", default)]
    pub cumulative_starts: u64,

    #[serde(alias = "総大当り", deserialize_with = "lenient_count", default)]
    pub total_hits: u64,

    #[serde(alias = "初当り", deserialize_with = "lenient_count", default)]
    pub first_hits: u64,

    #[serde(alias = "確変当り", deserialize_with = "lenient_count", default)]
    pub bonus_hits: u64,

    /// Hit probability as printed, e.g. `1/319.7`
    #[serde(alias = "大当り確率", default)]
    pub hit_rate: String,

    /// First-hit probability as printed
    #[serde(alias = "初当り確率", default)]
    pub first_hit_rate: String,

    #[serde(alias = "最大持ち玉", deserialize_with = "lenient_count", default)]
    pub max_balls: u64,

    #[serde(alias = "前日最終スタート", deserialize_with = "lenient_count", default)]
    pub prev_day_final_start: u64,
}

impl UnitRecord {
    /// Number of table columns that map onto record fields.
    pub const COLUMNS: usize = 10;

    /// Build a record from trimmed cell texts, in column order.
    ///
    /// Missing trailing columns read as `"0"` (counts) or `""` (rates).
    pub fn from_cells<S: AsRef<str>>(cells: &[S]) -> Self {
        let text = |i: usize| cells.get(i).map(|c| c.as_ref().trim()).unwrap_or("");
        let count = |i: usize| parse_count(text(i));

        Self {
            unit_id: text(0).to_string(),
            spins: count(1),
            cumulative_starts: count(2),
            total_hits: count(3),
            first_hits: count(4),
            bonus_hits: count(5),
            hit_rate: text(6).to_string(),
            first_hit_rate: text(7).to_string(),
            max_balls: count(8),
            prev_day_final_start: count(9),
        }
    }
}

/// Returns true when `text` is a non-empty run of ASCII digits.
///
/// This is the data-row test: header and footer rows carry labels or
/// nothing in their first cell and fail it.
pub fn is_unit_id(text: &str) -> bool {
    let text = text.trim();
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}

/// Parse a count from page text, defaulting to zero.
///
/// Surrounding whitespace and `,` thousands separators are ignored, then the
/// leading run of ASCII digits is read. Text without leading digits yields 0.
/// Values past `u64::MAX` saturate.
pub fn parse_count(text: &str) -> u64 {
    text.trim()
        .chars()
        .filter(|c| *c != ',')
        .take_while(|c| c.is_ascii_digit())
        .fold(0u64, |acc, c| {
            acc.saturating_mul(10)
                .saturating_add(u64::from(c as u8 - b'0'))
        })
}

fn lenient_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
        Other(serde::de::IgnoredAny),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Number(n) => n,
        Raw::Text(s) => parse_count(&s),
        Raw::Other(_) => 0,
    })
}

/// One table snapshot for a group, labelled by the date text shown on the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateEntry {
    /// Free-form date label (e.g. `2024/01/02`, `昨日`), never normalised
    pub date: String,

    pub data: Vec<UnitRecord>,
}

impl DateEntry {
    pub fn new(date: impl Into<String>, data: Vec<UnitRecord>) -> Self {
        Self {
            date: date.into(),
            data,
        }
    }
}

/// All snapshots captured for one group (machine model) in a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDataset {
    #[serde(alias = "machineName")]
    pub name: String,

    /// Page the group was discovered at
    #[serde(alias = "machineUrl")]
    pub url: String,

    #[serde(alias = "data")]
    pub dates: Vec<DateEntry>,

    #[serde(alias = "timestamp")]
    pub captured_at: DateTime<Utc>,
}

impl GroupDataset {
    pub fn new(name: impl Into<String>, url: impl Into<String>, dates: Vec<DateEntry>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            dates,
            captured_at: Utc::now(),
        }
    }

    /// All records across every date, in encounter order.
    pub fn records(&self) -> impl Iterator<Item = &UnitRecord> {
        self.dates.iter().flat_map(|d| d.data.iter())
    }

    /// Set the capture timestamp.
    pub fn with_captured_at(mut self, captured_at: DateTime<Utc>) -> Self {
        self.captured_at = captured_at;
        self
    }
}

/// A discovered link: visible label plus the resolved target URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub label: String,
    pub target: String,
}

impl Candidate {
    pub fn new(label: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            target: target.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_from_cells_maps_columns_in_order() {
        let row = ["7", "1", "2", "3", "4", "5", "1/6", "1/7", "8", "9"];
        let record = UnitRecord::from_cells(&row);

        assert_eq!(record.unit_id, "7");
        assert_eq!(record.spins, 1);
        assert_eq!(record.cumulative_starts, 2);
        assert_eq!(record.total_hits, 3);
        assert_eq!(record.first_hits, 4);
        assert_eq!(record.bonus_hits, 5);
        assert_eq!(record.hit_rate, "1/6");
        assert_eq!(record.first_hit_rate, "1/7");
        assert_eq!(record.max_balls, 8);
        assert_eq!(record.prev_day_final_start, 9);
    }

    #[test]
    fn test_missing_columns_default() {
        let record = UnitRecord::from_cells(&["12", "300", "40", "2", "1", "1", "1/150", "1/300"]);

        assert_eq!(record.max_balls, 0);
        assert_eq!(record.prev_day_final_start, 0);

        let short = UnitRecord::from_cells(&["3"]);
        assert_eq!(short.hit_rate, "");
        assert_eq!(short.first_hit_rate, "");
        assert_eq!(short.spins, 0);
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("123"), 123);
        assert_eq!(parse_count(" 1,234 "), 1234);
        assert_eq!(parse_count("45回"), 45);
        assert_eq!(parse_count("-"), 0);
        assert_eq!(parse_count(""), 0);
        assert_eq!(parse_count("abc"), 0);
        assert_eq!(parse_count("99999999999999999999999"), u64::MAX);
    }

    #[test]
    fn test_is_unit_id() {
        assert!(is_unit_id("7"));
        assert!(is_unit_id(" 0123 "));
        assert!(!is_unit_id(""));
        assert!(!is_unit_id("abc"));
        assert!(!is_unit_id("台番号"));
        assert!(!is_unit_id("12a"));
        assert!(!is_unit_id("-3"));
    }

    #[test]
    fn test_deserialize_source_keys() {
        let json = r#"{
            "台番号": "101",
            "回転数": "250",
            "総大当り": 3,
            "初当り": "1",
            "大当り確率": "1/83.3",
            "最大持ち玉": "1,500"
        }"#;
        let record: UnitRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.unit_id, "101");
        assert_eq!(record.spins, 250);
        assert_eq!(record.total_hits, 3);
        assert_eq!(record.first_hits, 1);
        assert_eq!(record.hit_rate, "1/83.3");
        assert_eq!(record.max_balls, 1500);
        assert_eq!(record.bonus_hits, 0);
    }

    #[test]
    fn test_unreadable_counts_become_zero() {
        let json = r#"{
            "台番号": "102",
            "回転数": null,
            "総大当り": true,
            "初当り": [1, 2],
            "確変当り": -4,
            "最大持ち玉": { "value": 10 }
        }"#;
        let record: UnitRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.unit_id, "102");
        assert_eq!(record.spins, 0);
        assert_eq!(record.total_hits, 0);
        assert_eq!(record.first_hits, 0);
        assert_eq!(record.bonus_hits, 0);
        assert_eq!(record.max_balls, 0);
    }

    proptest! {
        #[test]
        fn parse_count_never_panics(s in ".*") {
            let _ = parse_count(&s);
        }

        #[test]
        fn parse_count_zero_without_leading_digit(s in "[a-zA-Z/\\-].*") {
            prop_assert_eq!(parse_count(&s), 0);
        }

        #[test]
        fn parse_count_reads_digits(n in 0u64..1_000_000_000) {
            prop_assert_eq!(parse_count(&n.to_string()), n);
        }
    }
}
