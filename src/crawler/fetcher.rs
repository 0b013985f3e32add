//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the page crawl, including:
//! - Building HTTP clients with the configured user agent and timeouts
//! - The fixed politeness delay before every fetch
//! - GET requests to fetch page content
//! - Error classification (HTTP status vs. network, transient vs. permanent)
//! - The landing page reachability probe

use crate::config::CrawlerConfig;
use crate::HarvestError;
use reqwest::{redirect::Policy, Client, StatusCode};
use std::time::Duration;

/// Maximum redirect hops followed per request
const MAX_REDIRECTS: usize = 10;

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched the page
    Success {
        /// Final URL after redirects
        final_url: String,
        /// HTTP status code
        status_code: u16,
        /// Content-Type header value
        content_type: String,
        /// Page body content
        body: String,
    },

    /// Server answered with a non-2xx status
    HttpError {
        /// The HTTP status code
        status_code: u16,
    },

    /// Network error (connection refused, timeout, etc.)
    NetworkError {
        /// Error description
        error: String,
        /// Whether retrying could help (timeouts, connect failures)
        transient: bool,
    },
}

impl FetchResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use hotel_scout::config::CrawlerConfig;
/// use hotel_scout::crawler::build_http_client;
///
/// let client = build_http_client(&CrawlerConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &CrawlerConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Page fetcher with a fixed delay before every request
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    delay: Duration,
}

impl Fetcher {
    pub fn new(config: &CrawlerConfig) -> Result<Self, HarvestError> {
        Ok(Self {
            client: build_http_client(config)?,
            delay: config.request_delay(),
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Sleeps the configured delay, then fetches the URL
    pub async fn fetch(&self, url: &str) -> FetchResult {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        tracing::info!("Fetching {}", url);
        fetch_url(&self.client, url).await
    }

    /// Checks that the landing page answers and resolves redirects
    ///
    /// Returns `Ok(Some(final_url))` when the server redirected elsewhere,
    /// `Ok(None)` when the URL answered directly.
    pub async fn probe_landing(&self, url: &str) -> Result<Option<String>, HarvestError> {
        let response = match self.client.head(url).send().await {
            Ok(response) => response,
            Err(e) => {
                return Err(HarvestError::Unreachable {
                    url: url.to_string(),
                    reason: describe_error(&e),
                })
            }
        };

        let status = response.status();
        // Some servers refuse HEAD; fall back to GET before giving up
        let (status, final_url) = if status == StatusCode::METHOD_NOT_ALLOWED
            || status == StatusCode::NOT_IMPLEMENTED
        {
            let response = self.client.get(url).send().await.map_err(|e| {
                HarvestError::Unreachable {
                    url: url.to_string(),
                    reason: describe_error(&e),
                }
            })?;
            (response.status(), response.url().to_string())
        } else {
            (status, response.url().to_string())
        };

        if !status.is_success() {
            return Err(HarvestError::Unreachable {
                url: url.to_string(),
                reason: format!("HTTP {}", status.as_u16()),
            });
        }

        if trim_slash(&final_url) != trim_slash(url) {
            tracing::info!("URL redirected: {} -> {}", url, final_url);
            return Ok(Some(final_url));
        }

        Ok(None)
    }
}

fn trim_slash(url: &str) -> &str {
    url.trim_end_matches('/')
}

fn describe_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "Request timeout".to_string()
    } else if e.is_connect() {
        "Connection refused".to_string()
    } else {
        e.to_string()
    }
}

/// Fetches a URL and classifies the outcome
///
/// | Condition | Result |
/// |-----------|--------|
/// | HTTP 2xx | Success |
/// | Any other status | HttpError |
/// | Timeout | NetworkError, transient |
/// | Connection refused | NetworkError, transient |
/// | Other transport/body error | NetworkError, permanent |
pub async fn fetch_url(client: &Client, url: &str) -> FetchResult {
    match client.get(url).send().await {
        Ok(response) => {
            let status = response.status();
            let final_url = response.url().to_string();

            if !status.is_success() {
                tracing::warn!("Failed to fetch {}: {}", url, status.as_u16());
                return FetchResult::HttpError {
                    status_code: status.as_u16(),
                };
            }

            let content_type = response
                .headers()
                .get("content-type")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("")
                .to_string();

            match response.text().await {
                Ok(body) => FetchResult::Success {
                    final_url,
                    status_code: status.as_u16(),
                    content_type,
                    body,
                },
                Err(e) => FetchResult::NetworkError {
                    error: e.to_string(),
                    transient: e.is_timeout(),
                },
            }
        }
        Err(e) => {
            let transient = e.is_timeout() || e.is_connect();
            tracing::warn!("Error fetching {}: {}", url, describe_error(&e));
            FetchResult::NetworkError {
                error: describe_error(&e),
                transient,
            }
        }
    }
}
