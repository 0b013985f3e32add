//! HTML parser for extracting classified links
//!
//! This module handles parsing HTML content to extract:
//! - Links to follow (from <a> tags), each classified by the link rules
//! - Page text and image candidates, bundled per page
//! - The navigation containers used to recognise menu links

use crate::crawler::classifier::{AnchorContext, LinkClass, LinkClassifier};
use crate::crawler::markdown::html_to_markdown;
use crate::images::{extract_image_urls, ImageCandidate};
use ego_tree::NodeId;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Terms that mark an element as a navigation container by id or class
const NAVIGATION_TERMS: &[&str] = &["nav", "menu", "header", "topbar"];

/// A link found on a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedLink {
    /// Absolute URL
    pub url: Url,
    pub class: LinkClass,
    /// Anchor text, whitespace collapsed
    pub text: String,
}

/// Result of processing one fetched page
#[derive(Debug, Clone)]
pub struct PageResult {
    pub url: String,
    /// Page text as markdown
    pub text_content: String,
    pub links: Vec<ExtractedLink>,
    pub images: Vec<ImageCandidate>,
}

/// Converts a fetched page and extracts its classified links and image candidates
pub fn parse_page(html: &str, page_url: &Url, classifier: &LinkClassifier) -> PageResult {
    let document = Html::parse_document(html);

    PageResult {
        url: page_url.to_string(),
        text_content: html_to_markdown(html),
        links: extract_links_from(&document, page_url, classifier),
        images: extract_image_urls(html, page_url),
    }
}

/// Extracts all links from an HTML page with the default rule list
///
/// # Link Extraction Rules
///
/// **Exclude:**
/// - empty and fragment-only hrefs
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs
/// - hrefs that fail to resolve against the base
///
/// Links are returned in document order. Malformed hrefs are skipped
/// individually; the page as a whole never fails.
///
/// # Example
///
/// ```
/// use hotel_scout::crawler::{extract_links, LinkClass};
/// use url::Url;
///
/// let html = r#"<nav><a href="/rooms">Rooms</a></nav><a href="/about">About</a>"#;
/// let base = Url::parse("https://hotel.com/").unwrap();
/// let links = extract_links(html, &base);
/// assert_eq!(links.len(), 2);
/// assert_eq!(links[0].class, LinkClass::Menu);
/// assert_eq!(links[1].class, LinkClass::Normal);
/// ```
pub fn extract_links(html: &str, base_url: &Url) -> Vec<ExtractedLink> {
    let document = Html::parse_document(html);
    extract_links_from(&document, base_url, &LinkClassifier::default())
}

/// Extracts links from an already parsed document with a given classifier
pub fn extract_links_from(
    document: &Html,
    base_url: &Url,
    classifier: &LinkClassifier,
) -> Vec<ExtractedLink> {
    let Ok(a_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };
    let img_selector = Selector::parse("img[src]").ok();
    let containers = navigation_containers(document);

    let mut links = Vec::new();
    for element in document.select(&a_selector) {
        let Some(url) = element.value().attr("href").and_then(|href| resolve_link(href, base_url))
        else {
            continue;
        };

        let ctx = anchor_context(element, url, &containers, img_selector.as_ref());
        let class = classifier.classify(&ctx);

        links.push(ExtractedLink {
            url: ctx.url,
            class,
            text: ctx.text,
        });
    }

    links
}

/// Returns only the links found inside navigation containers
pub fn extract_menu_links(html: &str, base_url: &Url) -> Vec<ExtractedLink> {
    let document = Html::parse_document(html);
    let Ok(a_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };
    let containers = navigation_containers(&document);

    document
        .select(&a_selector)
        .filter(|element| is_inside(element, &containers))
        .filter_map(|element| {
            let url = element
                .value()
                .attr("href")
                .and_then(|href| resolve_link(href, base_url))?;
            Some(ExtractedLink {
                url,
                class: LinkClass::Menu,
                text: collapse_text(element),
            })
        })
        .collect()
}

/// Finds navigation containers
///
/// Tag based containers (`nav`, `header`, `[role=navigation]`) win. Only when
/// the page has none are elements with a navigation-like id or class used.
fn navigation_containers(document: &Html) -> HashSet<NodeId> {
    let mut ids = HashSet::new();

    if let Ok(by_tag) = Selector::parse("nav, header, [role=navigation]") {
        ids.extend(document.select(&by_tag).map(|e| e.id()));
    }

    if ids.is_empty() {
        if let Ok(by_attr) = Selector::parse("[id], [class]") {
            for element in document.select(&by_attr) {
                let id = element.value().id().unwrap_or("").to_lowercase();
                let class = element.value().attr("class").unwrap_or("").to_lowercase();
                if NAVIGATION_TERMS
                    .iter()
                    .any(|term| id.contains(term) || class.contains(term))
                {
                    ids.insert(element.id());
                }
            }
        }
    }

    ids
}

fn is_inside(element: &ElementRef<'_>, containers: &HashSet<NodeId>) -> bool {
    !containers.is_empty() && element.ancestors().any(|node| containers.contains(&node.id()))
}

fn anchor_context(
    element: ElementRef<'_>,
    url: Url,
    containers: &HashSet<NodeId>,
    img_selector: Option<&Selector>,
) -> AnchorContext {
    let class = element
        .value()
        .attr("class")
        .unwrap_or("")
        .to_lowercase();

    let ancestor_classes = element
        .ancestors()
        .filter_map(|node| node.value().as_element())
        .filter_map(|el| el.attr("class"))
        .map(str::to_lowercase)
        .collect();

    let image_sources = img_selector
        .map(|sel| {
            element
                .select(sel)
                .filter_map(|img| img.value().attr("src"))
                .map(str::to_lowercase)
                .collect()
        })
        .unwrap_or_default();

    AnchorContext {
        url,
        text: collapse_text(element).to_lowercase(),
        class,
        ancestor_classes,
        image_sources,
        in_navigation: is_inside(&element, containers),
    }
}

fn collapse_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
pub(crate) fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    // Skip empty hrefs
    if href.is_empty() {
        return None;
    }

    let lower = href.to_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    // Skip fragment-only links (same page anchors)
    if href.starts_with('#') {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" => {
            Some(absolute_url)
        }
        _ => None,
    }
}
