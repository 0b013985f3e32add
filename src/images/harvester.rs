//! Standalone image crawl of a hotel site
//!
//! Visits the landing page, then the same-host pages whose URL or anchor text
//! suggests photography (rooms, spa, gallery and so on), running every page
//! through the image pipeline. Priority links are followed from every visited
//! page until the page limit is reached.

use crate::config::Config;
use crate::crawler::{extract_links, CrawlTarget, FetchResult, Fetcher, Frontier, LinkClass, Offer};
use crate::images::{HeadlessBrowser, ImagePipeline, PageImageStats};
use crate::url::SiteScope;
use crate::HarvestError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

static UNSAFE_PATH_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[\\/*?:"<>|]"#).expect("unsafe path pattern"));

/// Words that mark pages likely to carry hotel photography
const IMAGE_PRIORITY_KEYWORDS: &[&str] = &[
    "room",
    "suite",
    "accommodation",
    "stay",
    "lodging",
    "facility",
    "amenity",
    "service",
    "spa",
    "restaurant",
    "dining",
    "gallery",
    "photo",
    "image",
    "tour",
    "about",
    "location",
    "contact",
];

const RENDER_TIMEOUT: Duration = Duration::from_secs(60);

/// Summary of one image crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReport {
    pub site_id: String,
    pub directory: PathBuf,
    pub pages_visited: usize,
    pub candidates: usize,
    pub saved: usize,
    pub duplicates: usize,
    pub rejected: usize,
    pub failed: usize,
}

/// Derives a directory-safe site id from a URL
///
/// `https://www.hotel.com/paris/` becomes `www_hotel_com_paris`.
pub fn site_id_from_url(url: &Url) -> String {
    let mut id = url.host_str().unwrap_or("site").replace('.', "_");
    if let Some(port) = url.port() {
        id.push_str(&format!("_{}", port));
    }

    let path = url.path().trim_matches('/');
    if !path.is_empty() {
        let cleaned = UNSAFE_PATH_CHARS.replace_all(path, "_");
        let truncated: String = cleaned.chars().take(50).collect();
        id.push('_');
        id.push_str(&truncated);
    }

    id.chars().take(100).collect()
}

/// Builds the image pipeline for a site directory, with the rendered fallback when enabled
pub fn build_image_pipeline(config: &Config, client: reqwest::Client, dir: PathBuf) -> ImagePipeline {
    let pipeline = ImagePipeline::new(client, &config.images, dir);
    if config.images.render_fallback {
        pipeline.with_renderer(Arc::new(HeadlessBrowser::new(
            config.images.browser_path.clone(),
            config.crawler.user_agent.clone(),
            RENDER_TIMEOUT,
        )))
    } else {
        pipeline
    }
}

/// Standalone image crawler for one site
pub struct ImageHarvester {
    base_url: Url,
    site_id: String,
    directory: PathBuf,
    max_pages: usize,
    max_booking_visits: u32,
    fetcher: Fetcher,
    pipeline: ImagePipeline,
}

impl ImageHarvester {
    /// Creates a harvester; without an explicit id the site id is derived from the URL
    pub fn new(config: &Config, base_url: Url, site_id: Option<&str>) -> Result<Self, HarvestError> {
        let site_id = site_id
            .map(str::to_string)
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| site_id_from_url(&base_url));
        let directory = config.output.images_dir().join(&site_id);
        tracing::info!("Images for {} will be saved in {}", base_url, directory.display());

        let fetcher = Fetcher::new(&config.crawler)?;
        let pipeline = build_image_pipeline(config, fetcher.client().clone(), directory.clone());

        Ok(Self {
            base_url,
            site_id,
            directory,
            max_pages: config.images.max_pages as usize,
            max_booking_visits: config.crawler.max_booking_visits,
            fetcher,
            pipeline,
        })
    }

    pub fn site_id(&self) -> &str {
        &self.site_id
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub async fn run(&self) -> Result<ImageReport, HarvestError> {
        self.pipeline.prepare().await?;

        let scope = SiteScope::new(&self.base_url)?;
        let mut frontier = Frontier::new(self.max_pages, self.max_booking_visits);
        if let Some(seed) = CrawlTarget::new(self.base_url.clone(), LinkClass::Normal, true, &scope) {
            frontier.seed(seed);
        }

        let mut totals = PageImageStats::default();
        let mut pages_visited = 0;

        while let Some(target) = frontier.next() {
            let (page_url, body) = match self.fetcher.fetch(target.raw_url.as_str()).await {
                FetchResult::Success { final_url, body, .. } => {
                    (Url::parse(&final_url).unwrap_or_else(|_| target.raw_url.clone()), body)
                }
                _ => continue,
            };
            pages_visited += 1;

            for link in extract_links(&body, &page_url) {
                if !self.is_priority_link(&link.url, &link.text) {
                    continue;
                }
                if let Some(priority) = CrawlTarget::new(link.url, LinkClass::Normal, true, &scope) {
                    if frontier.offer(priority.clone()) == Offer::Admitted {
                        tracing::debug!("Found priority page: {}", priority.raw_url);
                    }
                }
            }

            totals += self.pipeline.process_page(&page_url, &body).await;
        }

        let report = ImageReport {
            site_id: self.site_id.clone(),
            directory: self.directory.clone(),
            pages_visited,
            candidates: totals.candidates,
            saved: self.pipeline.saved_count(),
            duplicates: totals.duplicates,
            rejected: totals.rejected,
            failed: totals.failed,
        };

        tracing::info!(
            "Image crawl of {} finished: {} pages, {} images saved to {}",
            self.base_url,
            report.pages_visited,
            report.saved,
            report.directory.display()
        );

        Ok(report)
    }

    /// Same host as the base URL and an image keyword in the URL or anchor text
    fn is_priority_link(&self, url: &Url, text: &str) -> bool {
        if url.host_str() != self.base_url.host_str() {
            return false;
        }
        let href = url.as_str().to_lowercase();
        let text = text.to_lowercase();
        IMAGE_PRIORITY_KEYWORDS
            .iter()
            .any(|keyword| href.contains(keyword) || text.contains(keyword))
    }
}
