//! HTML to markdown conversion for page text

use once_cell::sync::Lazy;
use regex::Regex;

static SCRIPT_STYLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>")
        .expect("script/style pattern")
});

/// Converts a fetched page to markdown, dropping scripts and styles first
pub fn html_to_markdown(html: &str) -> String {
    let cleaned = SCRIPT_STYLE_RE.replace_all(html, "");
    html2md::parse_html(&cleaned).trim().to_string()
}
