//! Automation backends and the shared query evaluator.

pub mod http;
pub mod query;

pub use http::{HttpBrowser, HttpPage};
pub use query::{
    run_query, Control, FormInput, Heading, Link, LinkSummary, PageStructure, Query, QueryOutput,
    TableData,
};
