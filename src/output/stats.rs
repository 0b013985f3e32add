//! Per-site results and the run summary
//!
//! This module collects what each pipeline run produced and renders the
//! end-of-run summary for the log and stdout.

use crate::crawler::CrawlOutcome;
use crate::images::ImageReport;
use std::path::PathBuf;

/// What one site produced
#[derive(Debug, Clone, Default)]
pub struct SiteResult {
    pub url: String,
    pub pages: usize,
    pub failed_pages: usize,
    pub booking_pages: u32,
    pub scraped_path: Option<PathBuf>,
    pub structured_path: Option<PathBuf>,
    pub images: Option<ImageReport>,

    /// Images saved by the crawl itself when images run during the crawl
    pub crawl_images: usize,

    /// Stage failure that ended processing of this site
    pub error: Option<String>,
}

impl SiteResult {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn failed(url: impl Into<String>, error: impl ToString) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::new(url)
        }
    }

    pub fn record_crawl(&mut self, outcome: &CrawlOutcome) {
        self.pages = outcome.pages.len();
        self.failed_pages = outcome.failed;
        self.booking_pages = outcome.booking_fetched;
        self.crawl_images = outcome.images_saved;
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn images_saved(&self) -> usize {
        self.crawl_images + self.images.as_ref().map(|r| r.saved).unwrap_or(0)
    }
}

/// Results of a multi-site run, in processing order
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub results: Vec<SiteResult>,
}

impl RunSummary {
    pub fn push(&mut self, result: SiteResult) {
        self.results.push(result);
    }

    pub fn successful(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// Writes the summary to the log
    pub fn log(&self) {
        tracing::info!("=== Processing Summary ===");
        tracing::info!("Successfully processed {}/{} hotels", self.successful(), self.total());
        for (i, result) in self.results.iter().enumerate() {
            match &result.error {
                None => tracing::info!("{}. {} - ✓ Success", i + 1, result.url),
                Some(error) => tracing::info!("{}. {} - ✗ Failed ({})", i + 1, result.url, error),
            }
        }
    }
}

/// Formats the summary as plain text
pub fn format_summary(summary: &RunSummary) -> String {
    let mut out = String::new();
    out.push_str("=== Hotel-Scout Summary ===\n\n");

    for (i, result) in summary.results.iter().enumerate() {
        let status = if result.is_success() { "✓" } else { "✗" };
        out.push_str(&format!("{}. {} {}\n", i + 1, status, result.url));

        if let Some(error) = &result.error {
            out.push_str(&format!("   Error: {}\n", error));
        }
        if result.pages > 0 || result.failed_pages > 0 {
            out.push_str(&format!(
                "   Pages: {} with text, {} failed, {} booking\n",
                result.pages, result.failed_pages, result.booking_pages
            ));
        }
        if let Some(path) = &result.scraped_path {
            out.push_str(&format!("   Scraped: {}\n", path.display()));
        }
        if let Some(path) = &result.structured_path {
            out.push_str(&format!("   Structured: {}\n", path.display()));
        }
        if let Some(report) = &result.images {
            out.push_str(&format!(
                "   Images: {} saved in {} ({} candidates, {} duplicates, {} rejected)\n",
                report.saved,
                report.directory.display(),
                report.candidates,
                report.duplicates,
                report.rejected
            ));
        } else if result.crawl_images > 0 {
            out.push_str(&format!("   Images: {} saved during crawl\n", result.crawl_images));
        }
    }

    out.push_str(&format!(
        "\nSuccess Rate: {}/{} sites processed\n",
        summary.successful(),
        summary.total()
    ));
    out
}

/// Prints the summary to stdout
pub fn print_summary(summary: &RunSummary) {
    print!("{}", format_summary(summary));
}
