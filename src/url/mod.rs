//! URL handling module for Hotel-Scout
//!
//! This module provides URL normalization, root-domain extraction and the
//! scope decision that keeps the crawl on the hotel's own site.

mod domain;
mod normalize;

pub use domain::{extract_domain, language_subdomain, root_domain, subdomain};
pub use normalize::{is_booking_url, normalize_parsed, normalize_url};

use crate::UrlError;
use normalize::BOOKING_TERMS;
use url::Url;

/// Path extensions that never hold page text
const NON_TEXT_EXTENSIONS: &[&str] = &[
    ".pdf", ".jpg", ".jpeg", ".png", ".gif", ".svg", ".webp", ".css", ".js", ".ico", ".xml",
    ".zip", ".rar", ".gz", ".doc", ".docx", ".xls", ".xlsx", ".mp4", ".mp3",
];

/// Scope classification of a URL relative to the crawled site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Same registrable domain as the base URL (subdomains included)
    SameSite,
    /// Co-branded booking engine on another domain
    ExternalBooking,
    /// Anything else, including malformed URLs and non-text resources
    OutOfScope,
}

impl Scope {
    /// Returns true if pages with this scope may be fetched for text
    pub fn is_crawlable(&self) -> bool {
        matches!(self, Self::SameSite | Self::ExternalBooking)
    }
}

/// The site a crawl session is bound to
#[derive(Debug, Clone)]
pub struct SiteScope {
    base: Url,
    root_domain: String,
}

impl SiteScope {
    /// Creates the scope for a base URL
    pub fn new(base: &Url) -> Result<Self, UrlError> {
        let host = base.host_str().ok_or(UrlError::MissingDomain)?;
        let root = root_domain(host);
        tracing::info!("Root domain identified as: {}", root);

        Ok(Self {
            base: base.clone(),
            root_domain: root,
        })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn root_domain(&self) -> &str {
        &self.root_domain
    }

    /// Classifies a URL string; malformed input is out of scope
    pub fn classify(&self, url: &str) -> Scope {
        match Url::parse(url) {
            Ok(parsed) => self.classify_url(&parsed),
            Err(_) => Scope::OutOfScope,
        }
    }

    /// Classifies a parsed URL
    ///
    /// Priority order:
    /// 1. Non-HTTP(S) schemes, missing hosts and non-text extensions are out of scope
    /// 2. Same root domain → SameSite
    /// 3. Host carries booking vocabulary and embeds the site's root domain → ExternalBooking
    /// 4. Out of scope
    pub fn classify_url(&self, url: &Url) -> Scope {
        if url.scheme() != "http" && url.scheme() != "https" {
            return Scope::OutOfScope;
        }

        let host = match url.host_str() {
            Some(h) if !h.is_empty() => h.to_lowercase(),
            _ => return Scope::OutOfScope,
        };

        if has_non_text_extension(url) {
            return Scope::OutOfScope;
        }

        if root_domain(&host) == self.root_domain {
            return Scope::SameSite;
        }

        if BOOKING_TERMS.iter().any(|term| host.contains(term)) && host.contains(&self.root_domain) {
            tracing::debug!("Found potential external booking URL: {}", url);
            return Scope::ExternalBooking;
        }

        Scope::OutOfScope
    }
}

/// Returns true if the URL path ends with a document, media or asset extension
pub fn has_non_text_extension(url: &Url) -> bool {
    let path = url.path().to_lowercase();
    NON_TEXT_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// Parses a user supplied base URL, prepending `https://` when no scheme is given
///
/// # Examples
///
/// ```
/// use hotel_scout::url::ensure_scheme;
///
/// let url = ensure_scheme("www.hotel.com").unwrap();
/// assert_eq!(url.as_str(), "https://www.hotel.com/");
/// ```
pub fn ensure_scheme(raw: &str) -> Result<Url, UrlError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(UrlError::Parse("empty URL".to_string()));
    }

    let candidate = if raw.starts_with("http://") || raw.starts_with("https://") {
        raw.to_string()
    } else {
        let with_scheme = format!("https://{}", raw);
        tracing::info!("Added https:// to URL: {}", with_scheme);
        with_scheme
    };

    let url = Url::parse(&candidate).map_err(|e| UrlError::Parse(e.to_string()))?;
    if url.host_str().map(str::is_empty).unwrap_or(true) {
        return Err(UrlError::MissingDomain);
    }
    Ok(url)
}
