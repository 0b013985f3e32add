//! Link classification rules
//!
//! Every extracted anchor is classified by one ordered rule list. The first
//! rule whose predicate matches decides the class; anchors no rule claims are
//! `Normal`.

use crate::url::{is_booking_url, language_subdomain};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use url::Url;

static LANGUAGE_PATH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/[a-z]{2}(?:[-_][a-z]{2})?(?:/|$)").expect("language path pattern"));

static LANGUAGE_QUERY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|&)(?:lang|language|hl)=[a-z]{2}").expect("language query pattern"));

/// Native language names that mark a language switcher anchor
const LANGUAGE_NAMES: &[&str] = &[
    "english",
    "français",
    "deutsch",
    "español",
    "italiano",
    "nederlands",
    "português",
    "русский",
    "中文",
    "日本語",
];

/// Language codes accepted as the whole anchor text
const LANGUAGE_CODES: &[&str] = &["en", "fr", "de", "es", "it", "nl", "pt", "ru", "zh", "ja", "ko"];

const BOOKING_TEXT_TERMS: &[&str] = &[
    "book",
    "reserve",
    "booking",
    "reservation",
    "check availability",
];

/// Class of an extracted link, used for frontier ranking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkClass {
    LanguageVariant,
    Menu,
    Booking,
    Normal,
}

impl fmt::Display for LinkClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::LanguageVariant => "language-variant",
            Self::Menu => "menu",
            Self::Booking => "booking",
            Self::Normal => "normal",
        };
        write!(f, "{}", name)
    }
}

/// Everything a rule may inspect about one anchor
///
/// Text and attribute values are lowercased when the context is built.
#[derive(Debug, Clone)]
pub struct AnchorContext {
    /// Resolved absolute URL of the anchor
    pub url: Url,
    /// Visible text, whitespace collapsed
    pub text: String,
    /// The anchor's own `class` attribute
    pub class: String,
    /// `class` attributes of the anchor's ancestors, innermost first
    pub ancestor_classes: Vec<String>,
    /// `src` attributes of images nested in the anchor
    pub image_sources: Vec<String>,
    /// Whether the anchor sits inside a navigation container
    pub in_navigation: bool,
}

impl AnchorContext {
    /// Creates a bare context for a URL with no surrounding markup
    pub fn for_url(url: Url) -> Self {
        Self {
            url,
            text: String::new(),
            class: String::new(),
            ancestor_classes: Vec::new(),
            image_sources: Vec::new(),
            in_navigation: false,
        }
    }
}

/// A named classification rule
#[derive(Clone)]
pub struct LinkRule {
    pub name: &'static str,
    pub class: LinkClass,
    pub predicate: fn(&AnchorContext) -> bool,
}

impl fmt::Debug for LinkRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkRule")
            .field("name", &self.name)
            .field("class", &self.class)
            .finish()
    }
}

/// Ordered rule list; first match wins
#[derive(Debug, Clone)]
pub struct LinkClassifier {
    rules: Vec<LinkRule>,
}

impl LinkClassifier {
    pub fn new(rules: Vec<LinkRule>) -> Self {
        Self { rules }
    }

    /// Appends a rule after the existing ones
    pub fn with_rule(mut self, rule: LinkRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(&self) -> &[LinkRule] {
        &self.rules
    }

    pub fn classify(&self, ctx: &AnchorContext) -> LinkClass {
        self.rules
            .iter()
            .find(|rule| (rule.predicate)(ctx))
            .map(|rule| rule.class)
            .unwrap_or(LinkClass::Normal)
    }
}

impl Default for LinkClassifier {
    fn default() -> Self {
        Self::new(vec![
            LinkRule {
                name: "language-variant",
                class: LinkClass::LanguageVariant,
                predicate: is_language_link,
            },
            LinkRule {
                name: "booking",
                class: LinkClass::Booking,
                predicate: is_booking_link,
            },
            LinkRule {
                name: "menu",
                class: LinkClass::Menu,
                predicate: is_menu_link,
            },
        ])
    }
}

/// Language switcher detection
pub fn is_language_link(ctx: &AnchorContext) -> bool {
    let path = ctx.url.path().to_lowercase();
    if LANGUAGE_PATH_RE.is_match(&path) {
        return true;
    }

    if let Some(query) = ctx.url.query() {
        if LANGUAGE_QUERY_RE.is_match(&query.to_lowercase()) {
            return true;
        }
    }

    if ctx
        .url
        .host_str()
        .and_then(language_subdomain)
        .is_some()
    {
        return true;
    }

    if LANGUAGE_NAMES.iter().any(|name| ctx.text.contains(name))
        || LANGUAGE_CODES.contains(&ctx.text.as_str())
    {
        return true;
    }

    if ctx
        .image_sources
        .iter()
        .any(|src| src.contains("flag") || src.contains("lang"))
    {
        return true;
    }

    ctx.class.contains("lang") || ctx.ancestor_classes.iter().any(|c| c.contains("lang"))
}

/// Booking link detection by URL, anchor text or anchor class
pub fn is_booking_link(ctx: &AnchorContext) -> bool {
    is_booking_url(&ctx.url)
        || BOOKING_TEXT_TERMS.iter().any(|term| ctx.text.contains(term))
        || ctx.class.contains("book")
}

pub fn is_menu_link(ctx: &AnchorContext) -> bool {
    ctx.in_navigation
}
