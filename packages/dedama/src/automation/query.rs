//! Structural queries over a loaded document.
//!
//! A [`Query`] is the read-only question a caller asks of the current page;
//! backends answer it with a [`QueryOutput`]. [`run_query`] is the shared
//! evaluator over raw HTML, so every backend that can produce the rendered
//! markup answers queries identically.

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AutomationError, AutomationResult};

const MAX_HEADING_CHARS: usize = 100;
const MAX_LINK_TEXT_CHARS: usize = 50;
const MAX_REPORT_LINKS: usize = 20;
const MAX_REPORT_TABLE_HEADERS: usize = 20;
const MAX_REPORT_INPUTS: usize = 10;

/// A read-only structural query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Query {
    /// Link elements matching a selector.
    Links { selector: String },

    /// Clickable elements matching a selector (links, buttons, inputs).
    Controls { selector: String },

    /// Cell texts of every row of every matching table.
    Tables {
        table: String,
        row: String,
        cell: String,
    },

    /// Page-wide structure summary, noting which keywords appear in the body.
    Structure { keywords: Vec<String> },
}

impl Query {
    pub fn links(selector: impl Into<String>) -> Self {
        Self::Links {
            selector: selector.into(),
        }
    }

    pub fn controls(selector: impl Into<String>) -> Self {
        Self::Controls {
            selector: selector.into(),
        }
    }

    pub fn tables(table: impl Into<String>, row: impl Into<String>, cell: impl Into<String>) -> Self {
        Self::Tables {
            table: table.into(),
            row: row.into(),
            cell: cell.into(),
        }
    }

    /// Selector this query matches elements with, if it has a single one.
    pub fn selector(&self) -> Option<&str> {
        match self {
            Self::Links { selector } | Self::Controls { selector } => Some(selector.as_str()),
            Self::Tables { table, .. } => Some(table.as_str()),
            Self::Structure { .. } => None,
        }
    }
}

/// Answer to a [`Query`]; the variant mirrors the query's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "items", rename_all = "snake_case")]
pub enum QueryOutput {
    Links(Vec<Link>),
    Controls(Vec<Control>),
    Tables(Vec<TableData>),
    Structure(PageStructure),
}

impl QueryOutput {
    pub fn into_links(self) -> AutomationResult<Vec<Link>> {
        match self {
            Self::Links(links) => Ok(links),
            _ => Err(AutomationError::UnexpectedOutput { expected: "links" }),
        }
    }

    pub fn into_controls(self) -> AutomationResult<Vec<Control>> {
        match self {
            Self::Controls(controls) => Ok(controls),
            _ => Err(AutomationError::UnexpectedOutput {
                expected: "controls",
            }),
        }
    }

    pub fn into_tables(self) -> AutomationResult<Vec<TableData>> {
        match self {
            Self::Tables(tables) => Ok(tables),
            _ => Err(AutomationError::UnexpectedOutput { expected: "tables" }),
        }
    }

    pub fn into_structure(self) -> AutomationResult<PageStructure> {
        match self {
            Self::Structure(structure) => Ok(structure),
            _ => Err(AutomationError::UnexpectedOutput {
                expected: "structure",
            }),
        }
    }
}

/// A link element: collapsed visible text and resolved target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub text: String,
    pub href: Option<String>,
}

/// A clickable element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Control {
    /// Position among the elements the selector matched; pass it to `click`.
    pub index: usize,
    pub tag: String,
    /// Visible text, or the `value` of an input
    pub text: String,
    pub href: Option<String>,
}

/// Raw cell texts of one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableData {
    /// Text of the preceding sibling element, or of the first header cell
    pub heading: Option<String>,
    pub rows: Vec<Vec<String>>,
}

/// Page-wide structure summary used by the diagnostics report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageStructure {
    pub title: String,
    pub url: String,
    pub element_count: usize,
    pub link_count: usize,
    pub table_count: usize,
    pub form_count: usize,
    pub image_count: usize,
    pub headings: Vec<Heading>,
    pub links: Vec<LinkSummary>,
    pub table_headers: Vec<String>,
    pub form_inputs: Vec<FormInput>,
    pub keywords_found: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    pub tag: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkSummary {
    pub href: String,
    pub text: String,
    pub has_script_handler: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormInput {
    pub kind: String,
    pub name: String,
    pub placeholder: String,
    pub value: String,
}

/// Evaluate `query` against an HTML document loaded from `page_url`.
///
/// Link targets are resolved against `page_url`, as a browser would report them.
pub fn run_query(html: &str, page_url: &Url, query: &Query) -> AutomationResult<QueryOutput> {
    let document = Html::parse_document(html);

    match query {
        Query::Links { selector } => {
            let selector = parse_selector(selector)?;
            let links = document
                .select(&selector)
                .map(|el| Link {
                    text: collapsed_text(&el),
                    href: resolve_href(&el, page_url),
                })
                .collect();
            Ok(QueryOutput::Links(links))
        }
        Query::Controls { selector } => {
            let selector = parse_selector(selector)?;
            let controls = document
                .select(&selector)
                .enumerate()
                .map(|(index, el)| Control {
                    index,
                    tag: el.value().name().to_string(),
                    text: control_text(&el),
                    href: resolve_href(&el, page_url),
                })
                .collect();
            Ok(QueryOutput::Controls(controls))
        }
        Query::Tables { table, row, cell } => {
            let table_sel = parse_selector(table)?;
            let row_sel = parse_selector(row)?;
            let cell_sel = parse_selector(cell)?;
            let th_sel = parse_selector("th")?;

            let tables = document
                .select(&table_sel)
                .map(|table| {
                    let heading = match table.prev_siblings().find_map(ElementRef::wrap) {
                        Some(sibling) => Some(collapsed_text(&sibling)),
                        None => table.select(&th_sel).next().map(|th| collapsed_text(&th)),
                    };
                    let rows = table
                        .select(&row_sel)
                        .map(|row| {
                            row.select(&cell_sel)
                                .map(|cell| cell.text().collect::<String>().trim().to_string())
                                .collect()
                        })
                        .collect();
                    TableData { heading, rows }
                })
                .collect();
            Ok(QueryOutput::Tables(tables))
        }
        Query::Structure { keywords } => Ok(QueryOutput::Structure(structure(
            &document, page_url, keywords,
        )?)),
    }
}

fn structure(document: &Html, page_url: &Url, keywords: &[String]) -> AutomationResult<PageStructure> {
    let count = |s: &str| -> AutomationResult<usize> { Ok(document.select(&parse_selector(s)?).count()) };

    let title = document
        .select(&parse_selector("title")?)
        .next()
        .map(|el| collapsed_text(&el))
        .unwrap_or_default();

    let headings = document
        .select(&parse_selector("h1, h2, h3, h4, h5, h6")?)
        .map(|el| Heading {
            tag: el.value().name().to_string(),
            text: truncate(&collapsed_text(&el), MAX_HEADING_CHARS),
        })
        .collect();

    let links = document
        .select(&parse_selector("a[href]")?)
        .take(MAX_REPORT_LINKS)
        .map(|el| LinkSummary {
            href: resolve_href(&el, page_url).unwrap_or_default(),
            text: truncate(&collapsed_text(&el), MAX_LINK_TEXT_CHARS),
            has_script_handler: el.value().attr("onclick").is_some(),
        })
        .collect();

    let table_headers = document
        .select(&parse_selector("table th")?)
        .take(MAX_REPORT_TABLE_HEADERS)
        .map(|el| collapsed_text(&el))
        .collect();

    let form_inputs = document
        .select(&parse_selector("input, select, textarea")?)
        .take(MAX_REPORT_INPUTS)
        .map(|el| {
            let attr = |name: &str| el.value().attr(name).unwrap_or_default().to_string();
            FormInput {
                kind: el
                    .value()
                    .attr("type")
                    .unwrap_or(el.value().name())
                    .to_string(),
                name: attr("name"),
                placeholder: attr("placeholder"),
                value: attr("value"),
            }
        })
        .collect();

    let body_text = document
        .select(&parse_selector("body")?)
        .next()
        .map(|body| body.text().collect::<String>().to_lowercase())
        .unwrap_or_default();
    let keywords_found = keywords
        .iter()
        .filter(|k| body_text.contains(&k.to_lowercase()))
        .cloned()
        .collect();

    Ok(PageStructure {
        title,
        url: page_url.to_string(),
        element_count: count("*")?,
        link_count: count("a")?,
        table_count: count("table")?,
        form_count: count("form")?,
        image_count: count("img")?,
        headings,
        links,
        table_headers,
        form_inputs,
        keywords_found,
    })
}

fn parse_selector(selector: &str) -> AutomationResult<Selector> {
    Selector::parse(selector).map_err(|e| AutomationError::InvalidSelector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

fn collapsed_text(el: &ElementRef) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn control_text(el: &ElementRef) -> String {
    let text = collapsed_text(el);
    if text.is_empty() && el.value().name() == "input" {
        el.value().attr("value").unwrap_or_default().trim().to_string()
    } else {
        text
    }
}

/// Absolute target of an element's `href`.
///
/// Empty, fragment-only and `javascript:` hrefs have no target: they do not
/// load another document.
fn resolve_href(el: &ElementRef, base: &Url) -> Option<String> {
    let href = el.value().attr("href")?.trim();
    if href.is_empty() || href.starts_with('#') || is_script_href(href) {
        return None;
    }
    base.join(href).ok().map(String::from)
}

fn is_script_href(href: &str) -> bool {
    href.get(..11)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("javascript:"))
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://hall.example/list/index.html").unwrap()
    }

    #[test]
    fn test_links_resolve_relative_hrefs() {
        let html = r#"<ul><li><a href="../kisyu?id=1">  Model
            One </a></li><li><a>No target</a></li></ul>"#;
        let links = run_query(html, &base(), &Query::links("li a"))
            .unwrap()
            .into_links()
            .unwrap();

        assert_eq!(links.len(), 2);
        assert_eq!(links[0].text, "Model One");
        assert_eq!(links[0].href.as_deref(), Some("https://hall.example/kisyu?id=1"));
        assert_eq!(links[1].href, None);
    }

    #[test]
    fn test_fragment_and_script_hrefs_have_no_target() {
        let html = r##"<a href="#">today</a><a href="#top">top</a>
            <a href="JavaScript:void(0)">tab</a><a href="?d=1#rows">1/14</a>"##;
        let links = run_query(html, &base(), &Query::links("a"))
            .unwrap()
            .into_links()
            .unwrap();

        let hrefs: Vec<_> = links.iter().map(|l| l.href.as_deref()).collect();
        assert_eq!(
            hrefs,
            [None, None, None, Some("https://hall.example/list/index.html?d=1#rows")]
        );
    }

    #[test]
    fn test_tables_keep_cells_and_heading() {
        let html = r#"
            <h3>Model X</h3>
            <table>
              <tr><th>No</th><th>Spins</th></tr>
              <tr><td> 101 </td><td>250</td></tr>
            </table>
            <table><tr><th>Other</th></tr><tr><td>1</td></tr></table>"#;
        let tables = run_query(html, &base(), &Query::tables("table", "tr", "td"))
            .unwrap()
            .into_tables()
            .unwrap();

        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].heading.as_deref(), Some("Model X"));
        assert_eq!(tables[0].rows, vec![vec![], vec!["101".to_string(), "250".to_string()]]);
        // Second table's preceding sibling is the first table
        assert!(tables[1].heading.as_deref().unwrap().starts_with("No Spins"));
    }

    #[test]
    fn test_controls_use_input_value() {
        let html = r#"<form><input type="submit" value="検索"></form><a href="/data">データ</a>"#;
        let controls = run_query(html, &base(), &Query::controls("a, input[type=submit]"))
            .unwrap()
            .into_controls()
            .unwrap();

        assert_eq!(controls.len(), 2);
        assert_eq!(controls[0].text, "検索");
        assert_eq!(controls[0].href, None);
        assert_eq!(controls[1].index, 1);
        assert_eq!(controls[1].href.as_deref(), Some("https://hall.example/data"));
    }

    #[test]
    fn test_invalid_selector_is_an_error() {
        let err = run_query("<p></p>", &base(), &Query::links("li[")).unwrap_err();
        assert!(matches!(err, AutomationError::InvalidSelector { .. }));
    }

    #[test]
    fn test_structure_counts_and_keywords() {
        let html = r#"<html><head><title> Hall </title></head><body>
            <h1>出玉情報</h1><a href="/a" onclick="go()">A</a><a href="/b">B</a>
            <table><tr><th>台番号</th></tr></table><form><input name="q" placeholder="search"></form>
            </body></html>"#;
        let structure = run_query(
            html,
            &base(),
            &Query::Structure {
                keywords: vec!["台番号".into(), "大当り".into()],
            },
        )
        .unwrap()
        .into_structure()
        .unwrap();

        assert_eq!(structure.title, "Hall");
        assert_eq!(structure.link_count, 2);
        assert_eq!(structure.table_count, 1);
        assert_eq!(structure.form_count, 1);
        assert_eq!(structure.headings[0].text, "出玉情報");
        assert!(structure.links[0].has_script_handler);
        assert_eq!(structure.table_headers, vec!["台番号"]);
        assert_eq!(structure.form_inputs[0].kind, "input");
        assert_eq!(structure.keywords_found, vec!["台番号"]);
    }

    #[test]
    fn test_mismatched_output_is_rejected() {
        let output = QueryOutput::Links(vec![]);
        assert!(output.into_tables().is_err());
    }
}
