//! Crawler module for hotel site text collection
//!
//! This module contains the core crawling logic, including:
//! - Link classification and extraction
//! - The prioritized frontier with the booking throttle
//! - HTTP fetching with a politeness delay
//! - Overall crawl coordination

mod classifier;
mod coordinator;
mod fetcher;
mod frontier;
mod markdown;
mod parser;

pub use classifier::{
    is_booking_link, is_language_link, is_menu_link, AnchorContext, LinkClass, LinkClassifier, LinkRule,
};
pub use coordinator::{Coordinator, CrawlOutcome, CrawlSession};
pub use fetcher::{build_http_client, fetch_url, FetchResult, Fetcher};
pub use frontier::{is_key_page, CrawlTarget, Frontier, Offer};
pub use markdown::html_to_markdown;
pub use parser::{extract_links, extract_links_from, extract_menu_links, parse_page, ExtractedLink, PageResult};

use crate::config::Config;
use crate::HarvestError;
use url::Url;

/// Crawls one hotel site and returns its url -> markdown map
///
/// This is the main entry point for a text crawl. It will:
/// 1. Build the HTTP client
/// 2. Seed the frontier from the landing page
/// 3. Fetch pages in priority order until the page cap is hit
/// 4. Return the collected page text with counts
pub async fn crawl(config: &Config, base_url: Url) -> Result<CrawlOutcome, HarvestError> {
    Coordinator::new(config, base_url)?.run().await
}
