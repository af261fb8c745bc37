//! Structural analysis of an entry page, written out for diagnostics.
//!
//! Nothing reads these reports back. They exist so an operator can see what
//! the scraper saw when a run comes back empty.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::automation::query::PageStructure;
use crate::error::AutomationResult;
use crate::traits::automation::PageAutomation;

/// Keywords that mark a page as belonging to the hall-data domain.
pub const TOPIC_KEYWORDS: &[&str] = &["パチンコ", "台番号", "大当り", "回転数", "出玉", "データ"];

/// Keyword whose presence means unit numbers are shown on the page.
const UNIT_KEYWORD: &str = "台番号";

/// A page's structure plus what it suggests about scraping it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteReport {
    pub structure: PageStructure,
    pub analysis: SiteAnalysis,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteAnalysis {
    pub is_topic_related: bool,
    pub has_data_content: bool,
    /// More than five links
    pub has_navigation: bool,
    pub is_interactive: bool,
    pub recommendations: Vec<String>,
}

impl SiteReport {
    pub fn from_structure(structure: PageStructure) -> Self {
        let mut recommendations = Vec::new();
        if structure.table_count > 0 {
            recommendations.push("Use table selectors for data extraction".to_string());
        }
        if !structure.links.is_empty() {
            recommendations.push("Follow links for detailed data pages".to_string());
        }
        if structure.keywords_found.iter().any(|k| k == UNIT_KEYWORD) {
            recommendations.push("Target unit number and game data".to_string());
        }

        let analysis = SiteAnalysis {
            is_topic_related: !structure.keywords_found.is_empty(),
            has_data_content: structure.table_count > 0,
            has_navigation: structure.link_count > 5,
            is_interactive: structure.form_count > 0,
            recommendations,
        };

        Self {
            structure,
            analysis,
            generated_at: Utc::now(),
        }
    }

    /// Query the current page and build a report from it.
    pub async fn capture<P: PageAutomation + ?Sized>(page: &P) -> AutomationResult<Self> {
        let keywords: Vec<String> = TOPIC_KEYWORDS.iter().map(|k| k.to_string()).collect();
        let structure = page.structure(&keywords).await?;
        Ok(Self::from_structure(structure))
    }

    /// Write as pretty JSON, creating parent directories as needed.
    pub async fn write_to(&self, path: &Path) -> AutomationResult<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec_pretty(self)?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }
}
