//! Multi-stage processing of hotel sites
//!
//! One site goes through: landing probe, text crawl, raw save, structuring,
//! image crawl. A site list runs the same stages one site at a time.

use crate::config::Config;
use crate::crawler::{Coordinator, Fetcher};
use crate::images::ImageHarvester;
use crate::output::{ensure_layout, save_scraped, save_structured, RunSummary, ScrapedDocument, SiteResult};
use crate::structure::{ChatCompletionsClient, SiteReference, StructuringService};
use crate::url::ensure_scheme;
use crate::HarvestError;
use std::path::Path;
use std::sync::Arc;
use url::Url;

/// Which stages run for each site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Text crawl, structuring and image crawl
    #[default]
    Full,
    /// Text crawl and raw save only
    Text,
    /// Image crawl only
    Images,
}

impl Mode {
    fn crawls_text(&self) -> bool {
        matches!(self, Self::Full | Self::Text)
    }

    fn crawls_images(&self) -> bool {
        matches!(self, Self::Full | Self::Images)
    }
}

/// Runs the processing stages for one or more sites
pub struct Pipeline {
    config: Config,
    mode: Mode,
    structurer: Option<Arc<dyn StructuringService>>,
}

impl Pipeline {
    /// Creates a pipeline without a structuring service
    pub fn new(config: Config, mode: Mode) -> Self {
        Self {
            config,
            mode,
            structurer: None,
        }
    }

    /// Creates a pipeline, connecting the chat completions service when structuring is enabled
    pub fn from_config(config: Config, mode: Mode) -> Result<Self, HarvestError> {
        let structurer: Option<Arc<dyn StructuringService>> = if config.structuring.enabled && mode == Mode::Full {
            Some(Arc::new(ChatCompletionsClient::from_config(&config.structuring)?))
        } else {
            None
        };

        Ok(Self {
            config,
            mode,
            structurer,
        })
    }

    pub fn with_structurer(mut self, structurer: Arc<dyn StructuringService>) -> Self {
        self.structurer = Some(structurer);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Processes one site through every stage the mode asks for
    ///
    /// Stage failures are returned as errors; files written by earlier stages
    /// stay on disk.
    pub async fn process_site(&self, raw_url: &str, id: Option<&str>) -> Result<SiteResult, HarvestError> {
        let mut base = ensure_scheme(raw_url)?;
        tracing::info!("Starting processing for hotel: {}", base);
        ensure_layout(&self.config.output).await?;

        let fetcher = Fetcher::new(&self.config.crawler)?;
        if let Some(final_url) = fetcher.probe_landing(base.as_str()).await? {
            base = Url::parse(&final_url)?;
        }

        let mut result = SiteResult::new(base.as_str());
        let mut image_url = base.clone();
        let mut image_id = id.map(str::to_string);

        if self.mode.crawls_text() {
            tracing::info!("Step 1: Scraping website content for {}", base);
            let outcome = Coordinator::new(&self.config, base.clone())?.run().await?;
            result.record_crawl(&outcome);
            if outcome.is_empty() {
                return Err(HarvestError::NoContent {
                    url: base.to_string(),
                });
            }

            tracing::info!("Step 2: Saving markdown content for {}", base);
            let document = ScrapedDocument::new(&base, outcome.pages);
            result.scraped_path = Some(save_scraped(&self.config.output.scraped_dir(), &document).await?);

            if self.mode == Mode::Text {
                return Ok(result);
            }

            if let Some(structurer) = &self.structurer {
                tracing::info!("Step 3: Structuring content for {}", base);
                let stem = document.file_stem();
                let structured = structurer
                    .structure(&stem, &serde_json::to_value(&document)?)
                    .await
                    .map_err(|e| {
                        tracing::error!("Failed to structure content for {}: {}", base, e);
                        e
                    })?;
                result.structured_path =
                    Some(save_structured(&self.config.output.structured_dir(), &stem, &structured).await?);

                let site = SiteReference::from_structured(&structured, &stem);
                if let Some(website) = site.website {
                    image_url = website;
                }
                image_id = image_id.or(Some(site.id));
            }

            if self.config.images.during_crawl {
                tracing::info!("Images were collected during the crawl of {}", base);
                return Ok(result);
            }
        }

        if self.mode.crawls_images() {
            tracing::info!("Step 4: Downloading images for {}", image_url);
            let harvester = ImageHarvester::new(&self.config, image_url, image_id.as_deref())?;
            let report = harvester.run().await?;
            if report.saved == 0 {
                tracing::warn!("No images were downloaded for {}", base);
            }
            result.images = Some(report);
        }

        tracing::info!("Completed processing for hotel: {}", base);
        Ok(result)
    }

    /// Processes sites one after another, pausing twice the request delay between them
    ///
    /// A failing site is recorded and the run continues; configuration errors abort.
    pub async fn process_site_list(&self, urls: &[String]) -> Result<RunSummary, HarvestError> {
        let mut summary = RunSummary::default();
        let pause = self.config.crawler.request_delay() * 2;

        for (i, url) in urls.iter().enumerate() {
            tracing::info!("Processing hotel {}/{}: {}", i + 1, urls.len(), url);

            match self.process_site(url, None).await {
                Ok(result) => summary.push(result),
                Err(e @ HarvestError::Config(_)) => return Err(e),
                Err(e) => {
                    tracing::error!("Error processing hotel {}: {}", url, e);
                    summary.push(SiteResult::failed(url.as_str(), e));
                }
            }

            if i + 1 < urls.len() && !pause.is_zero() {
                tracing::info!("Waiting {:?} before processing next hotel...", pause);
                tokio::time::sleep(pause).await;
            }
        }

        summary.log();
        Ok(summary)
    }
}

/// Reads a URL list file: one URL per line, blank lines and `#` comments skipped
pub fn read_url_list(path: &Path) -> Result<Vec<String>, HarvestError> {
    let text = std::fs::read_to_string(path)?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_url_list() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "https://hotel-a.com").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "# paused").unwrap();
        writeln!(file, "  hotel-b.com  ").unwrap();

        let urls = read_url_list(file.path()).unwrap();
        assert_eq!(urls, vec!["https://hotel-a.com", "hotel-b.com"]);
    }

    #[test]
    fn test_mode_stages() {
        assert!(Mode::Full.crawls_text() && Mode::Full.crawls_images());
        assert!(Mode::Text.crawls_text() && !Mode::Text.crawls_images());
        assert!(!Mode::Images.crawls_text() && Mode::Images.crawls_images());
    }

    #[test]
    fn test_structuring_skipped_outside_full_mode() {
        let mut config = Config::default();
        config.structuring.api_key_env = "HOTEL_SCOUT_TEST_UNSET_KEY".to_string();

        assert!(Pipeline::from_config(config.clone(), Mode::Text).is_ok());
        assert!(matches!(
            Pipeline::from_config(config, Mode::Full),
            Err(HarvestError::Structuring(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_url_fails_site() {
        let pipeline = Pipeline::new(Config::default(), Mode::Text);
        let result = pipeline.process_site("   ", None).await;
        assert!(matches!(result, Err(HarvestError::UrlError(_))));
    }
}
