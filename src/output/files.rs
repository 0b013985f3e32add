//! On-disk layout of crawl results
//!
//! Scraped text lands in `{data_root}/scraped/{safe_host}_{unix_ts}.json`,
//! structured documents in `{data_root}/structured/{stem}.json`.

use crate::config::OutputConfig;
use crate::HarvestError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use url::Url;

static UNSAFE_FILE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[\\/*?:"<>|]"#).expect("unsafe file pattern"));

/// The scraped text of one site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapedDocument {
    pub url: String,
    /// Unix seconds at save time
    pub timestamp: i64,
    pub domain: String,
    /// Normalized page URL -> markdown
    pub content: BTreeMap<String, String>,
}

impl ScrapedDocument {
    pub fn new(url: &Url, content: BTreeMap<String, String>) -> Self {
        let domain = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            _ => String::new(),
        };

        Self {
            url: url.to_string(),
            timestamp: chrono::Utc::now().timestamp(),
            domain,
            content,
        }
    }

    /// File stem, also used as the site's structuring id
    pub fn file_stem(&self) -> String {
        format!("{}_{}", UNSAFE_FILE_CHARS.replace_all(&self.domain, "_"), self.timestamp)
    }
}

/// Creates the stage directories below the data root
pub async fn ensure_layout(config: &OutputConfig) -> Result<(), HarvestError> {
    for dir in [config.scraped_dir(), config.structured_dir(), config.images_dir()] {
        tokio::fs::create_dir_all(&dir).await?;
        tracing::debug!("Ensured directory exists: {}", dir.display());
    }
    Ok(())
}

/// Writes the scraped document and returns its path
pub async fn save_scraped(dir: &Path, document: &ScrapedDocument) -> Result<PathBuf, HarvestError> {
    let path = dir.join(format!("{}.json", document.file_stem()));
    write_json(&path, &serde_json::to_value(document)?).await?;
    tracing::info!("Content saved to {}", path.display());
    Ok(path)
}

/// Writes a structured document as `{stem}.json` and returns its path
pub async fn save_structured(dir: &Path, stem: &str, document: &Value) -> Result<PathBuf, HarvestError> {
    let path = dir.join(format!("{}.json", stem));
    write_json(&path, document).await?;
    tracing::info!("Structured content saved to {}", path.display());
    Ok(path)
}

/// Reads a scraped document back from disk
pub async fn load_scraped(path: &Path) -> Result<ScrapedDocument, HarvestError> {
    let raw = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&raw)?)
}

async fn write_json(path: &Path, value: &Value) -> Result<(), HarvestError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let text = serde_json::to_string_pretty(value)?;
    tokio::fs::write(path, text).await?;
    Ok(())
}
