use crate::images::{ImageError, QualifiedImage};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use url::Url;

/// Extensions accepted from the URL's last path segment
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp", "tif", "tiff", "avif", "svg"];

/// A persisted image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    /// Hex SHA-256 of the raw bytes
    pub content_hash: String,
    pub width: u32,
    pub height: u32,
    pub size_bytes: u64,
    pub stored_path: PathBuf,
    pub source_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved(ImageRecord),
    Duplicate { content_hash: String },
}

#[derive(Debug, Default)]
struct Registry {
    /// content hash -> file name
    by_hash: HashMap<String, String>,
    /// file name -> content hash
    by_name: HashMap<String, String>,
}

impl Registry {
    /// Picks a file name that no other content hash holds
    fn assign_name(&self, url: &Url, hash: &str, content_type: &str) -> String {
        let name = file_name_for(url, hash, content_type);
        match self.by_name.get(&name) {
            Some(owner) if owner != hash => {
                let (stem, ext) = split_extension(&name);
                format!("{}-{}.{}", stem, &hash[..12], ext)
            }
            _ => name,
        }
    }

    fn forget(&mut self, hash: &str, name: &str) {
        self.by_hash.remove(hash);
        self.by_name.remove(name);
    }
}

/// Session-scoped image store
///
/// The hash registry and the saved counter are the only state shared between
/// concurrent download workers.
#[derive(Debug)]
pub struct ImageStore {
    dir: PathBuf,
    registry: Mutex<Registry>,
    saved: AtomicUsize,
}

impl ImageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            registry: Mutex::new(Registry::default()),
            saved: AtomicUsize::new(0),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn ensure_dir(&self) -> Result<(), ImageError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    /// Writes a qualified image unless its content was already saved
    pub async fn save(&self, image: &QualifiedImage) -> Result<SaveOutcome, ImageError> {
        let hash = content_hash(&image.bytes);

        let file_name = {
            let mut registry = self.registry.lock().unwrap_or_else(|p| p.into_inner());
            if registry.by_hash.contains_key(&hash) {
                return Ok(SaveOutcome::Duplicate { content_hash: hash });
            }
            let name = registry.assign_name(&image.url, &hash, &image.content_type);
            registry.by_hash.insert(hash.clone(), name.clone());
            registry.by_name.insert(name.clone(), hash.clone());
            name
        };

        let stored_path = self.dir.join(&file_name);
        if let Err(e) = tokio::fs::write(&stored_path, &image.bytes).await {
            self.registry
                .lock()
                .unwrap_or_else(|p| p.into_inner())
                .forget(&hash, &file_name);
            return Err(e.into());
        }

        let count = self.saved.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::info!(
            "Saved image {} ({}x{}, {} KB) as {} [{} total]",
            image.url,
            image.width,
            image.height,
            image.bytes.len() / 1024,
            file_name,
            count
        );

        Ok(SaveOutcome::Saved(ImageRecord {
            content_hash: hash,
            width: image.width,
            height: image.height,
            size_bytes: image.bytes.len() as u64,
            stored_path,
            source_url: image.url.to_string(),
        }))
    }

    pub fn saved_count(&self) -> usize {
        self.saved.load(Ordering::SeqCst)
    }

    /// Returns true if content with this hash was saved in this session
    pub fn contains_hash(&self, hash: &str) -> bool {
        self.registry
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .by_hash
            .contains_key(hash)
    }
}

/// Hex SHA-256 of the given bytes
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// File name for an image
///
/// The URL's last path segment when it carries an image extension, otherwise
/// `{hash}.{ext}` with the extension taken from the content type.
pub fn file_name_for(url: &Url, hash: &str, content_type: &str) -> String {
    let segment = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .map(sanitize_file_name)
        .unwrap_or_default();

    let (_, ext) = split_extension(&segment);
    if !segment.is_empty() && IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()) {
        return segment;
    }

    format!("{}.{}", hash, extension_for_content_type(content_type))
}

fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect()
}

fn split_extension(name: &str) -> (&str, &str) {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, ext),
        _ => (name, ""),
    }
}

fn extension_for_content_type(content_type: &str) -> &'static str {
    let mime = content_type.split(';').next().unwrap_or("").trim().to_lowercase();
    match mime.as_str() {
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/bmp" => "bmp",
        "image/tiff" => "tiff",
        "image/avif" => "avif",
        "image/svg+xml" => "svg",
        _ => "jpg",
    }
}
