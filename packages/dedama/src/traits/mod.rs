//! Core trait abstractions.
//!
//! Backends implement these to give the scraper a page to drive.

pub mod automation;
