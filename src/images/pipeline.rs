use crate::config::ImageConfig;
use crate::images::{
    extract_image_urls, ImageCandidate, ImageError, ImageStore, PageRenderer, Qualification, Qualifier,
    RejectReason, RenderError, SaveOutcome,
};
use futures::stream::{self, StreamExt};
use reqwest::Client;
use std::ops::AddAssign;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Upper bound for a single retry pause
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Per-page (or accumulated) image counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageImageStats {
    pub candidates: usize,
    pub saved: usize,
    pub duplicates: usize,
    pub rejected: usize,
    pub failed: usize,
}

impl AddAssign for PageImageStats {
    fn add_assign(&mut self, other: Self) {
        self.candidates += other.candidates;
        self.saved += other.saved;
        self.duplicates += other.duplicates;
        self.rejected += other.rejected;
        self.failed += other.failed;
    }
}

#[derive(Debug)]
enum CandidateOutcome {
    Saved,
    Rejected(RejectReason),
    Failed,
}

/// Qualifies and stores one page's candidates with bounded concurrency
pub struct ImagePipeline {
    qualifier: Qualifier,
    store: ImageStore,
    concurrency: usize,
    max_attempts: u32,
    backoff_base: Duration,
    renderer: Option<Arc<dyn PageRenderer>>,
}

impl ImagePipeline {
    pub fn new(client: Client, config: &ImageConfig, dir: impl Into<PathBuf>) -> Self {
        Self {
            qualifier: Qualifier::new(client, config),
            store: ImageStore::new(dir),
            concurrency: config.concurrency.max(1),
            max_attempts: config.max_attempts.max(1),
            backoff_base: Duration::from_millis(config.backoff_base_ms),
            renderer: None,
        }
    }

    /// Enables the rendered-DOM fallback
    pub fn with_renderer(mut self, renderer: Arc<dyn PageRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Creates the image directory
    pub async fn prepare(&self) -> Result<(), ImageError> {
        self.store.ensure_dir().await
    }

    pub fn store(&self) -> &ImageStore {
        &self.store
    }

    pub fn saved_count(&self) -> usize {
        self.store.saved_count()
    }

    /// Discovers and processes the images of a fetched page
    ///
    /// When the static pass saves nothing and a renderer is configured, the
    /// rendered DOM is searched once more.
    pub async fn process_page(&self, page_url: &Url, html: &str) -> PageImageStats {
        let candidates = extract_image_urls(html, page_url);
        tracing::info!("Found {} image candidates on {}", candidates.len(), page_url);

        let mut stats = self.process_candidates(candidates).await;

        if stats.saved == 0 {
            if let Some(renderer) = &self.renderer {
                stats += self.render_fallback(renderer.as_ref(), page_url).await;
            }
        }

        stats
    }

    async fn render_fallback(&self, renderer: &dyn PageRenderer, page_url: &Url) -> PageImageStats {
        match renderer.render(page_url).await {
            Ok(dom) => {
                let candidates = extract_image_urls(&dom, page_url);
                tracing::info!(
                    "Found {} image candidates in rendered DOM of {}",
                    candidates.len(),
                    page_url
                );
                self.process_candidates(candidates).await
            }
            Err(RenderError::Unavailable(reason)) => {
                tracing::debug!("No rendered fallback for {}: {}", page_url, reason);
                PageImageStats::default()
            }
            Err(e) => {
                tracing::warn!("Rendered fallback failed for {}: {}", page_url, e);
                PageImageStats::default()
            }
        }
    }

    /// Runs candidates through qualification and storage
    pub async fn process_candidates(&self, candidates: Vec<ImageCandidate>) -> PageImageStats {
        let mut stats = PageImageStats {
            candidates: candidates.len(),
            ..PageImageStats::default()
        };

        let outcomes: Vec<CandidateOutcome> = stream::iter(candidates)
            .map(|candidate| self.handle_candidate(candidate))
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        for outcome in outcomes {
            match outcome {
                CandidateOutcome::Saved => stats.saved += 1,
                CandidateOutcome::Rejected(RejectReason::Duplicate) => stats.duplicates += 1,
                CandidateOutcome::Rejected(_) => stats.rejected += 1,
                CandidateOutcome::Failed => stats.failed += 1,
            }
        }

        stats
    }

    async fn handle_candidate(&self, candidate: ImageCandidate) -> CandidateOutcome {
        let url = &candidate.absolute_url;

        let image = match self.qualify_with_retry(url).await {
            Ok(Qualification::Accept(image)) => image,
            Ok(Qualification::Reject(reason)) => {
                tracing::debug!("Rejected image {}: {}", url, reason);
                return CandidateOutcome::Rejected(reason);
            }
            Err(e) => {
                tracing::warn!("Skipping image {}: {}", url, e);
                return CandidateOutcome::Failed;
            }
        };

        match self.store.save(&image).await {
            Ok(SaveOutcome::Saved(_)) => CandidateOutcome::Saved,
            Ok(SaveOutcome::Duplicate { content_hash }) => {
                tracing::debug!("Duplicate image {} ({})", url, &content_hash[..12]);
                CandidateOutcome::Rejected(RejectReason::Duplicate)
            }
            Err(e) => {
                tracing::warn!("Failed to store image {}: {}", url, e);
                CandidateOutcome::Failed
            }
        }
    }

    async fn qualify_with_retry(&self, url: &Url) -> Result<Qualification, ImageError> {
        let mut attempt = 0;
        loop {
            match self.qualifier.qualify(url).await {
                Err(e) if e.is_transient() && attempt + 1 < self.max_attempts => {
                    let backoff = backoff_delay(self.backoff_base, attempt);
                    tracing::warn!(
                        "Attempt {} failed for {}: {}. Retrying in {:?}",
                        attempt + 1,
                        url,
                        e,
                        backoff
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}

/// `base * 2^attempt`, capped
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.checked_mul(2u32.saturating_pow(attempt))
        .unwrap_or(MAX_BACKOFF)
        .min(MAX_BACKOFF)
}
