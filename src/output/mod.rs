//! Output module for crawl results
//!
//! This module handles:
//! - Writing scraped text and structured documents to the data root
//! - Collecting per-site results into a run summary

mod files;
pub mod stats;

pub use files::{ensure_layout, load_scraped, save_scraped, save_structured, ScrapedDocument};
pub use stats::{format_summary, print_summary, RunSummary, SiteResult};
