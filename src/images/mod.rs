//! Image acquisition module
//!
//! This module discovers image URLs on fetched pages, qualifies them against
//! minimum size requirements, deduplicates them by content hash and writes the
//! survivors to the site's image directory.
//!
//! # Components
//!
//! - `extract_image_urls`: Candidate discovery from markup, CSS and scripts
//! - `Qualifier`: HEAD probe plus body checks (type, bytes, dimensions)
//! - `ImageStore`: Session registry of content hashes and file names
//! - `ImagePipeline`: Bounded concurrent processing of one page's candidates
//! - `PageRenderer`: Optional rendered-DOM fallback
//! - `ImageHarvester`: Standalone image crawl of a site

mod discover;
mod harvester;
mod pipeline;
mod qualify;
mod render;
mod store;

pub use discover::extract_image_urls;
pub use harvester::{build_image_pipeline, site_id_from_url, ImageHarvester, ImageReport};
pub use pipeline::{ImagePipeline, PageImageStats};
pub use qualify::{check_dimensions, Qualification, QualifiedImage, Qualifier, RejectReason};
pub use render::{HeadlessBrowser, PageRenderer, RenderError};
pub use store::{content_hash, file_name_for, ImageRecord, ImageStore, SaveOutcome};

use thiserror::Error;
use url::Url;

/// An image URL found on a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageCandidate {
    /// The value as written in the page
    pub source_url: String,
    pub absolute_url: Url,
}

/// Image pipeline errors
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Network error for {url}: {message}")]
    Network {
        url: String,
        message: String,
        transient: bool,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),
}

impl ImageError {
    /// Returns true if retrying the same request could succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network { transient: true, .. })
    }

    pub(crate) fn from_reqwest(url: &Url, e: reqwest::Error) -> Self {
        Self::Network {
            url: url.to_string(),
            transient: e.is_timeout() || e.is_connect(),
            message: e.to_string(),
        }
    }
}
