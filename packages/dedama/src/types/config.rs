//! Configuration types for navigation, extraction and scrape runs.

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for a whole scrape run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    /// Page the run starts from.
    pub entry_url: String,

    /// Upper bound on groups visited per run. Default: 20.
    pub max_groups: usize,

    /// Pause between units, in milliseconds. Default: 1000.
    pub unit_delay_ms: u64,

    /// When set, a page snapshot and a structure report of the entry page
    /// are written here (best effort).
    pub diagnostics_dir: Option<PathBuf>,

    /// Commit runs that found nothing, wiping the previous dataset.
    ///
    /// Default: false (an empty run leaves the cache untouched).
    pub replace_on_empty: bool,

    pub navigator: NavigatorConfig,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            entry_url: "https://www.p-world.co.jp/_machine/dedama.cgi?hall_id=019662&type=pachi"
                .to_string(),
            max_groups: 20,
            unit_delay_ms: 1000,
            diagnostics_dir: None,
            replace_on_empty: false,
            navigator: NavigatorConfig::default(),
        }
    }
}

impl ScrapeConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry_url(mut self, url: impl Into<String>) -> Self {
        self.entry_url = url.into();
        self
    }

    pub fn with_max_groups(mut self, max: usize) -> Self {
        self.max_groups = max;
        self
    }

    pub fn with_unit_delay(mut self, delay: Duration) -> Self {
        self.unit_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn with_diagnostics_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.diagnostics_dir = Some(dir.into());
        self
    }

    pub fn with_replace_on_empty(mut self, replace: bool) -> Self {
        self.replace_on_empty = replace;
        self
    }

    pub fn with_navigator(mut self, navigator: NavigatorConfig) -> Self {
        self.navigator = navigator;
        self
    }

    pub fn unit_delay(&self) -> Duration {
        Duration::from_millis(self.unit_delay_ms)
    }
}

/// How the navigator finds its way from the entry page to data tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigatorConfig {
    /// Labels of the control that opens the search/data listing.
    /// Exact matches win over substring matches.
    pub search_labels: Vec<String>,

    /// Last-resort keywords: any clickable element whose text contains one.
    pub topic_keywords: Vec<String>,

    /// Elements considered clickable when looking for the search control.
    pub control_selector: String,

    /// Cascade for discovering groups on a listing page.
    pub groups: SelectorSpec,

    /// Cascade for discovering date tabs on a unit page.
    pub dates: SelectorSpec,

    pub table: TableSpec,

    /// Tried in order when the entry page yields nothing.
    pub fallback_entry_points: Vec<String>,

    /// Upper bound on date pages visited per unit. Default: 7.
    pub max_dates: usize,

    /// Label for the table found on a unit's landing page.
    /// Default: the current local date, `YYYY/MM/DD`.
    pub today_label: Option<String>,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            search_labels: strings(&["出玉情報", "データ公開", "機種検索"]),
            topic_keywords: strings(&["パチンコ", "機種", "検索", "データ"]),
            control_selector: "a, button, input[type=submit], input[type=button], [onclick]"
                .to_string(),
            groups: SelectorSpec::groups(),
            dates: SelectorSpec::dates(),
            table: TableSpec::default(),
            fallback_entry_points: strings(&["https://www.p-world.co.jp/"]),
            max_dates: 7,
            today_label: None,
        }
    }
}

impl NavigatorConfig {
    pub fn with_fallback_entry_points(
        mut self,
        urls: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.fallback_entry_points = urls.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_max_dates(mut self, max: usize) -> Self {
        self.max_dates = max;
        self
    }

    pub fn with_today_label(mut self, label: impl Into<String>) -> Self {
        self.today_label = Some(label.into());
        self
    }
}

/// An ordered discovery cascade plus the filters every strategy applies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorSpec {
    /// Most specific first. The first strategy that yields a candidate wins.
    pub strategies: Vec<DiscoveryStrategy>,

    /// Labels containing any of these (case-insensitive) are navigation noise.
    pub noise_tokens: Vec<String>,

    /// Labels shorter than this, in characters, are dropped.
    pub min_label_chars: usize,

    /// When set, labels must match.
    pub label_pattern: Option<LabelPattern>,
}

impl SelectorSpec {
    /// Default cascade for machine model links on a hall listing.
    pub fn groups() -> Self {
        Self {
            strategies: vec![
                DiscoveryStrategy::new(
                    "structural",
                    "body#SearchListPachinko div#Prime-Column article section.list1col ul.m_list li.Pachinko a",
                ),
                DiscoveryStrategy::new("relaxed", "li.Pachinko a"),
                DiscoveryStrategy::new("broad", "a")
                    .with_href_hints(["kisyu", "machine_id", "model", "dedama.cgi?"]),
            ],
            noise_tokens: default_noise_tokens(),
            min_label_chars: 3,
            label_pattern: None,
        }
    }

    /// Default cascade for date tabs on a unit page.
    pub fn dates() -> Self {
        Self {
            strategies: vec![
                DiscoveryStrategy::new("structural", "div#Prime-Column section.dataDate ul li a"),
                DiscoveryStrategy::new("relaxed", ".dataDate a"),
                DiscoveryStrategy::new("broad", "a"),
            ],
            noise_tokens: default_noise_tokens(),
            min_label_chars: 2,
            label_pattern: Some(LabelPattern::date()),
        }
    }
}

fn default_noise_tokens() -> Vec<String> {
    strings(&["戻る", "次へ", "前へ", "back", "next", "previous"])
}

/// One named query in a discovery cascade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryStrategy {
    pub name: String,

    /// CSS selector matching the link elements.
    pub selector: String,

    /// When non-empty, a link's target must contain one of these.
    #[serde(default)]
    pub href_hints: Vec<String>,
}

impl DiscoveryStrategy {
    pub fn new(name: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            selector: selector.into(),
            href_hints: Vec::new(),
        }
    }

    pub fn with_href_hints(mut self, hints: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.href_hints = hints.into_iter().map(Into::into).collect();
        self
    }
}

/// Where data tables live and what counts as a data row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSpec {
    pub table_selector: String,
    pub row_selector: String,
    pub cell_selector: String,

    /// Rows with fewer cells are never data. Default: 8.
    pub min_columns: usize,
}

impl Default for TableSpec {
    fn default() -> Self {
        Self {
            table_selector: "table".to_string(),
            row_selector: "tr".to_string(),
            cell_selector: "td".to_string(),
            min_columns: 8,
        }
    }
}

/// A compiled label regex that serializes as its source text.
#[derive(Debug, Clone)]
pub struct LabelPattern(Regex);

impl LabelPattern {
    const DATE: &'static str =
        r"(?i)\d{1,4}/\d{1,2}(?:/\d{1,2})?|今日|本日|昨日|前日|today|yesterday";

    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(Self)
    }

    /// Slash-delimited numeric dates and relative day keywords.
    pub fn date() -> Self {
        Self(Regex::new(Self::DATE).expect("date pattern is valid"))
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.0.is_match(text)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Serialize for LabelPattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for LabelPattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let pattern = String::deserialize(deserializer)?;
        Self::new(&pattern).map_err(serde::de::Error::custom)
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_pattern() {
        let pattern = LabelPattern::date();
        assert!(pattern.is_match("2024/01/02"));
        assert!(pattern.is_match("1/2(火)"));
        assert!(pattern.is_match("昨日"));
        assert!(pattern.is_match("Yesterday"));
        assert!(!pattern.is_match("機種一覧"));
        assert!(!pattern.is_match("2024-01-02"));
    }

    #[test]
    fn test_label_pattern_roundtrips_through_json() {
        let spec = SelectorSpec::dates();
        let json = serde_json::to_string(&spec).unwrap();
        let back: SelectorSpec = serde_json::from_str(&json).unwrap();

        assert_eq!(back.strategies, spec.strategies);
        assert!(back.label_pattern.unwrap().is_match("今日"));
    }

    #[test]
    fn test_group_cascade_is_most_specific_first() {
        let spec = SelectorSpec::groups();
        let names: Vec<_> = spec.strategies.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["structural", "relaxed", "broad"]);
    }
}
