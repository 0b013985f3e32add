//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that coordinates:
//! - Seeding the frontier from the landing page
//! - Draining the frontier one page at a time
//! - Link extraction, classification and re-admission
//! - Per-page image harvesting when enabled
//! - Building the final outcome

use crate::config::{Config, CrawlerConfig};
use crate::crawler::classifier::{LinkClass, LinkClassifier};
use crate::crawler::fetcher::{FetchResult, Fetcher};
use crate::crawler::frontier::{is_key_page, CrawlTarget, Frontier, Offer};
use crate::crawler::parser::{extract_menu_links, parse_page, ExtractedLink, PageResult};
use crate::images::{build_image_pipeline, site_id_from_url, ImagePipeline};
use crate::state::CrawlPhase;
use crate::url::{language_subdomain, normalize_parsed, SiteScope};
use crate::{HarvestError, UrlError};
use std::collections::{BTreeMap, HashSet};
use url::Url;

/// Final result of a crawl session
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    /// Normalized URL -> markdown, one entry per successfully fetched page
    pub pages: BTreeMap<String, String>,
    pub visited: usize,
    pub failed: usize,
    pub booking_fetched: u32,
    pub images_saved: usize,
    pub phase: CrawlPhase,
}

impl CrawlOutcome {
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// All mutable state of one crawl
///
/// Created per base URL and passed explicitly; nothing outlives the session.
#[derive(Debug)]
pub struct CrawlSession {
    scope: SiteScope,
    frontier: Frontier,
    classifier: LinkClassifier,
    pages: BTreeMap<String, String>,

    /// Normalized in-scope links found on the landing page
    main_page_links: HashSet<String>,

    /// Language hosts whose menu has already been expanded
    expanded_language_hosts: HashSet<String>,

    phase: CrawlPhase,
    failed: usize,
}

impl CrawlSession {
    /// Creates a session and seeds the frontier with the base URL
    pub fn new(base_url: &Url, config: &CrawlerConfig) -> Result<Self, HarvestError> {
        let scope = SiteScope::new(base_url)?;
        let mut frontier = Frontier::new(config.page_cap as usize, config.max_booking_visits);

        let seed = CrawlTarget::new(base_url.clone(), LinkClass::Normal, true, &scope).ok_or_else(|| {
            UrlError::Parse(format!("{} is not a crawlable page", base_url))
        })?;
        frontier.seed(seed);

        Ok(Self {
            scope,
            frontier,
            classifier: LinkClassifier::default(),
            pages: BTreeMap::new(),
            main_page_links: HashSet::new(),
            expanded_language_hosts: HashSet::new(),
            phase: CrawlPhase::Idle,
            failed: 0,
        })
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    pub fn frontier_mut(&mut self) -> &mut Frontier {
        &mut self.frontier
    }

    pub fn pages(&self) -> &BTreeMap<String, String> {
        &self.pages
    }

    pub fn scope(&self) -> &SiteScope {
        &self.scope
    }

    /// Enters the seeding phase and hands out the landing page target
    pub fn start(&mut self) -> Result<Option<CrawlTarget>, HarvestError> {
        self.phase.transition(CrawlPhase::Seeding)?;
        Ok(self.frontier.next())
    }

    /// Processes the landing page
    ///
    /// Stores its text, remembers every in-scope link as a main-page link and
    /// offers language variants, menu links and booking links ahead of the
    /// remaining links, which are offered as promoted. Returns the number of
    /// targets admitted.
    pub fn seed_from_landing(&mut self, landing: &CrawlTarget, base: &Url, html: &str) -> usize {
        let page = parse_page(html, base, &self.classifier);
        let links = self.record_page(landing, page);

        for link in &links {
            if self.scope.classify_url(&link.url).is_crawlable() {
                if let Ok(normalized) = normalize_parsed(&link.url) {
                    self.main_page_links.insert(normalized);
                }
            }
        }

        let mut admitted = 0;
        for class in [LinkClass::LanguageVariant, LinkClass::Menu, LinkClass::Booking] {
            for link in links.iter().filter(|l| l.class == class) {
                if self.offer_link(link, class, false) {
                    tracing::info!("Added {} link to priority queue: {}", class, link.url);
                    admitted += 1;
                }
            }
        }

        for link in links.iter().filter(|l| l.class == LinkClass::Normal) {
            if self.offer_link(link, LinkClass::Normal, true) {
                admitted += 1;
            }
        }

        tracing::info!(
            "Landing page {} yielded {} links, {} admitted",
            landing.raw_url,
            links.len(),
            admitted
        );
        admitted
    }

    /// Leaves seeding and starts draining the frontier
    pub fn begin_draining(&mut self) -> Result<(), HarvestError> {
        self.phase.transition(CrawlPhase::Draining)
    }

    pub fn next_target(&mut self) -> Option<CrawlTarget> {
        self.frontier.next()
    }

    /// Processes a page fetched while draining; returns the number of targets admitted
    pub fn process_page(&mut self, target: &CrawlTarget, base: &Url, html: &str) -> usize {
        let page = parse_page(html, base, &self.classifier);
        let links = self.record_page(target, page);

        let mut admitted = 0;

        if let Some(host) = base.host_str().map(str::to_lowercase) {
            if language_subdomain(&host).is_some() && self.expanded_language_hosts.insert(host.clone()) {
                tracing::info!("Exploring language subdomain: {}", host);
                for link in extract_menu_links(html, base) {
                    if self.offer_link(&link, LinkClass::Menu, true) {
                        tracing::info!("Added language subdomain menu link: {}", link.url);
                        admitted += 1;
                    }
                }
            }
        }

        for link in links {
            let promoted = link.class == LinkClass::Normal && self.should_promote(&link.url);
            if self.offer_link(&link, link.class, promoted) {
                admitted += 1;
            }
        }

        admitted
    }

    pub fn record_failure(&mut self, target: &CrawlTarget) {
        tracing::debug!("No content for {}", target.normalized_url);
        self.failed += 1;
    }

    /// Completes the session and returns its outcome
    pub fn finish(mut self, images_saved: usize) -> Result<CrawlOutcome, HarvestError> {
        self.phase.transition(CrawlPhase::Completed)?;

        Ok(CrawlOutcome {
            visited: self.frontier.visited_count(),
            failed: self.failed,
            booking_fetched: self.frontier.booking().crawled(),
            images_saved,
            phase: self.phase,
            pages: self.pages,
        })
    }

    /// Stores the page text and hands back its links
    fn record_page(&mut self, target: &CrawlTarget, page: PageResult) -> Vec<ExtractedLink> {
        tracing::debug!(
            "Parsed {}: {} links, {} image candidates",
            page.url,
            page.links.len(),
            page.images.len()
        );
        self.pages.insert(target.normalized_url.clone(), page.text_content);
        page.links
    }

    fn should_promote(&self, url: &Url) -> bool {
        if is_key_page(url) {
            return true;
        }
        if url.host_str().and_then(language_subdomain).is_some() {
            return true;
        }
        normalize_parsed(url)
            .map(|n| self.main_page_links.contains(&n))
            .unwrap_or(false)
    }

    fn offer_link(&mut self, link: &ExtractedLink, class: LinkClass, promoted: bool) -> bool {
        let Some(target) = CrawlTarget::new(link.url.clone(), class, promoted, &self.scope) else {
            tracing::trace!("Out of scope: {}", link.url);
            return false;
        };

        matches!(self.frontier.offer(target), Offer::Admitted)
    }
}

/// Main crawler coordinator structure
pub struct Coordinator {
    base_url: Url,
    crawler: CrawlerConfig,
    fetcher: Fetcher,
    images: Option<ImagePipeline>,
}

impl Coordinator {
    /// Creates a coordinator for one base URL
    ///
    /// When `images.during-crawl` is enabled every fetched page also runs
    /// through the image pipeline.
    pub fn new(config: &Config, base_url: Url) -> Result<Self, HarvestError> {
        let fetcher = Fetcher::new(&config.crawler)?;

        let images = if config.images.during_crawl {
            let dir = config.output.images_dir().join(site_id_from_url(&base_url));
            Some(build_image_pipeline(config, fetcher.client().clone(), dir))
        } else {
            None
        };

        Ok(Self {
            base_url,
            crawler: config.crawler.clone(),
            fetcher,
            images,
        })
    }

    /// Uses the given pipeline for per-page images
    pub fn with_images(mut self, pipeline: ImagePipeline) -> Self {
        self.images = Some(pipeline);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Runs the crawl to completion
    ///
    /// This method:
    /// 1. Fetches the landing page and seeds the frontier from it
    /// 2. Pops targets until the frontier is empty or the page cap is hit
    /// 3. Fetches, converts and mines each page for links
    /// 4. Returns the url -> markdown map with counts
    pub async fn run(&self) -> Result<CrawlOutcome, HarvestError> {
        let mut session = CrawlSession::new(&self.base_url, &self.crawler)?;
        tracing::info!(
            "Starting crawl of {} (page cap {}, max booking pages {})",
            self.base_url,
            self.crawler.page_cap,
            self.crawler.max_booking_visits
        );

        if let Some(pipeline) = &self.images {
            pipeline.prepare().await?;
        }

        if let Some(landing) = session.start()? {
            match self.fetch_page(&landing).await {
                Some((base, body)) => {
                    session.seed_from_landing(&landing, &base, &body);
                    self.harvest_images(&base, &body).await;
                }
                None => {
                    tracing::warn!("Landing page {} produced no content", landing.raw_url);
                    session.record_failure(&landing);
                }
            }
        }

        session.begin_draining()?;

        let mut pages_crawled = 1;
        while let Some(target) = session.next_target() {
            match self.fetch_page(&target).await {
                Some((base, body)) => {
                    session.process_page(&target, &base, &body);
                    self.harvest_images(&base, &body).await;
                }
                None => session.record_failure(&target),
            }

            pages_crawled += 1;
            if pages_crawled % 10 == 0 {
                tracing::info!(
                    "Progress: {} pages crawled, {} in frontier",
                    pages_crawled,
                    session.frontier().queued_count()
                );
            }
        }

        let images_saved = self.images.as_ref().map(|p| p.saved_count()).unwrap_or(0);
        let outcome = session.finish(images_saved)?;

        tracing::info!(
            "Crawling complete. Visited {} URLs, {} pages with content, {} failed",
            outcome.visited,
            outcome.pages.len(),
            outcome.failed
        );

        Ok(outcome)
    }

    /// Fetches a target; returns the effective base URL and body for HTML pages
    async fn fetch_page(&self, target: &CrawlTarget) -> Option<(Url, String)> {
        match self.fetcher.fetch(target.raw_url.as_str()).await {
            FetchResult::Success {
                final_url,
                content_type,
                body,
                ..
            } => {
                if !content_type.is_empty() && !content_type.to_lowercase().contains("html") {
                    tracing::debug!("Skipping {}: not HTML ({})", target.raw_url, content_type);
                    return None;
                }
                let base = Url::parse(&final_url).unwrap_or_else(|_| target.raw_url.clone());
                Some((base, body))
            }
            FetchResult::HttpError { .. } | FetchResult::NetworkError { .. } => None,
        }
    }

    async fn harvest_images(&self, page_url: &Url, html: &str) {
        if let Some(pipeline) = &self.images {
            let stats = pipeline.process_page(page_url, html).await;
            tracing::debug!(
                "Images on {}: {} candidates, {} saved",
                page_url,
                stats.candidates,
                stats.saved
            );
        }
    }
}
