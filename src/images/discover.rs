//! Image candidate discovery
//!
//! Sources, in document order per source:
//! - `<img>` `src`, `srcset` entries and `data-*` attributes naming a source or image
//! - `background-image`/`background` `url(...)` in `<style>` blocks and inline styles
//! - absolute image URLs inside `<script>` bodies
//! - links to image files inside gallery, slider or carousel containers

use crate::images::ImageCandidate;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

static BACKGROUND_IMAGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)background-image:\s*url\(['"]?([^'"()]+)['"]?\)"#).expect("background-image pattern")
});

static BACKGROUND_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)background:\s*[^;]*?url\(['"]?([^'"()]+)['"]?\)"#).expect("background pattern")
});

static SCRIPT_IMAGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)https?://[^"'\s<>()\\]+\.(?:jpg|jpeg|png|gif|webp)"#).expect("script image pattern")
});

static IMAGE_FILE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\.(?:jpg|jpeg|png|gif|webp)$").expect("image file pattern"));

/// File name fragments of decorative images
const DECORATIVE_TERMS: &[&str] = &["icon", "logo", "button", "bg-", "background"];

/// Declared dimensions below which an `<img>` is treated as decoration
const MIN_DECLARED_DIMENSION: u32 = 100;

const GALLERY_TERMS: &[&str] = &["gallery", "slider", "carousel"];

/// Collects image candidates from an HTML page
///
/// Candidates are deduplicated by absolute URL; the first occurrence wins.
pub fn extract_image_urls(html: &str, base_url: &Url) -> Vec<ImageCandidate> {
    let document = Html::parse_document(html);
    let mut collector = CandidateCollector::new(base_url);

    collect_img_tags(&document, &mut collector);
    collect_styles(&document, &mut collector);
    collect_scripts(&document, &mut collector);
    collect_gallery_links(&document, &mut collector);

    collector.into_candidates()
}

struct CandidateCollector<'a> {
    base_url: &'a Url,
    seen: HashSet<String>,
    candidates: Vec<ImageCandidate>,
}

impl<'a> CandidateCollector<'a> {
    fn new(base_url: &'a Url) -> Self {
        Self {
            base_url,
            seen: HashSet::new(),
            candidates: Vec::new(),
        }
    }

    fn push(&mut self, raw: &str) {
        let raw = raw.trim();
        if raw.is_empty() || raw.to_lowercase().starts_with("data:") {
            return;
        }

        let Ok(absolute_url) = self.base_url.join(raw) else {
            tracing::trace!("Unresolvable image URL: {}", raw);
            return;
        };

        if absolute_url.scheme() != "http" && absolute_url.scheme() != "https" {
            return;
        }

        if is_decorative(&absolute_url) {
            tracing::trace!("Skipping decorative image: {}", absolute_url);
            return;
        }

        if self.seen.insert(absolute_url.to_string()) {
            self.candidates.push(ImageCandidate {
                source_url: raw.to_string(),
                absolute_url,
            });
        }
    }

    fn into_candidates(self) -> Vec<ImageCandidate> {
        self.candidates
    }
}

fn is_decorative(url: &Url) -> bool {
    let file_name = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or("")
        .to_lowercase();
    DECORATIVE_TERMS.iter().any(|term| file_name.contains(term))
}

/// Both declared dimensions present and below the threshold
fn is_declared_tiny(img: &ElementRef<'_>) -> bool {
    let dimension = |name: &str| {
        img.value()
            .attr(name)
            .and_then(|v| v.trim().trim_end_matches("px").parse::<u32>().ok())
    };

    matches!(
        (dimension("width"), dimension("height")),
        (Some(w), Some(h)) if w < MIN_DECLARED_DIMENSION && h < MIN_DECLARED_DIMENSION
    )
}

fn collect_img_tags(document: &Html, collector: &mut CandidateCollector<'_>) {
    let Ok(selector) = Selector::parse("img") else {
        return;
    };

    for img in document.select(&selector) {
        if is_declared_tiny(&img) {
            continue;
        }

        if let Some(src) = img.value().attr("src") {
            collector.push(src);
        }

        let mut data_sources: Vec<(&str, &str)> = img
            .value()
            .attrs()
            .filter(|(name, _)| {
                name.starts_with("data-") && (name.contains("src") || name.contains("image"))
            })
            .collect();
        data_sources.sort_by_key(|(name, _)| *name);
        for (_, value) in data_sources {
            collector.push(value);
        }

        if let Some(srcset) = img.value().attr("srcset") {
            for entry in srcset.split(',') {
                if let Some(url) = entry.split_whitespace().next() {
                    collector.push(url);
                }
            }
        }
    }
}

fn collect_css(css: &str, collector: &mut CandidateCollector<'_>) {
    for re in [&*BACKGROUND_IMAGE_RE, &*BACKGROUND_RE] {
        for caps in re.captures_iter(css) {
            if let Some(m) = caps.get(1) {
                collector.push(m.as_str());
            }
        }
    }
}

fn collect_styles(document: &Html, collector: &mut CandidateCollector<'_>) {
    if let Ok(selector) = Selector::parse("style") {
        for style in document.select(&selector) {
            let css: String = style.text().collect();
            collect_css(&css, collector);
        }
    }

    if let Ok(selector) = Selector::parse("[style]") {
        for element in document.select(&selector) {
            if let Some(css) = element.value().attr("style") {
                collect_css(css, collector);
            }
        }
    }
}

fn collect_scripts(document: &Html, collector: &mut CandidateCollector<'_>) {
    let Ok(selector) = Selector::parse("script") else {
        return;
    };

    for script in document.select(&selector) {
        let body: String = script.text().collect();
        for m in SCRIPT_IMAGE_RE.find_iter(&body) {
            collector.push(m.as_str());
        }
    }
}

fn collect_gallery_links(document: &Html, collector: &mut CandidateCollector<'_>) {
    let (Ok(containers), Ok(links)) = (Selector::parse("[class]"), Selector::parse("a[href]")) else {
        return;
    };

    for container in document.select(&containers) {
        let class = container.value().attr("class").unwrap_or("").to_lowercase();
        if !GALLERY_TERMS.iter().any(|term| class.contains(term)) {
            continue;
        }

        for link in container.select(&links) {
            if let Some(href) = link.value().attr("href") {
                if IMAGE_FILE_RE.is_match(href.trim()) {
                    collector.push(href);
                }
            }
        }
    }
}
