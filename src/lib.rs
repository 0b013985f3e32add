//! Hotel-Scout: a scoped hotel website harvester
//!
//! This crate crawls a hotel's website (its subdomains and a bounded set of
//! co-branded booking engines), turns the pages into markdown text and collects
//! the qualifying, deduplicated photography the site publishes.

pub mod config;
pub mod crawler;
pub mod images;
pub mod output;
pub mod pipeline;
pub mod state;
pub mod structure;
pub mod url;

use thiserror::Error;

/// Main error type for Hotel-Scout operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Invalid crawl phase transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::CrawlPhase,
        to: state::CrawlPhase,
    },

    #[error("Image pipeline error: {0}")]
    Image(#[from] images::ImageError),

    #[error("Structuring service error: {0}")]
    Structuring(#[from] structure::StructureError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No content could be scraped from {url}")]
    NoContent { url: String },

    #[error("Landing page {url} is not reachable: {reason}")]
    Unreachable { url: String, reason: String },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for Hotel-Scout operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, CrawlOutcome};
pub use images::{ImageHarvester, ImageReport};
pub use pipeline::{Mode, Pipeline};
pub use state::CrawlPhase;
pub use url::{normalize_url, root_domain, Scope, SiteScope};
