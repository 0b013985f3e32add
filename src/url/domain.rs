use std::net::IpAddr;
use url::Url;

/// Language prefixes recognised as language subdomains (`en.hotel.com`)
pub(crate) const LANGUAGE_PREFIXES: &[&str] =
    &["en", "fr", "de", "es", "it", "nl", "pt", "ru", "zh", "ja", "ko"];

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use hotel_scout::url::extract_domain;
///
/// let url = Url::parse("https://EN.Hotel.com/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("en.hotel.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns the registrable (root) domain of a host
///
/// Suffixes come from the Public Suffix List, so `www.hotel.com` and
/// `en.hotel.com` map to `hotel.com` while `rooms.hotel.co.uk` maps to
/// `hotel.co.uk`. IP literals and hosts without a registrable part are their
/// own root.
///
/// # Examples
///
/// ```
/// use hotel_scout::url::root_domain;
///
/// assert_eq!(root_domain("en.chouchouhotel.com"), "chouchouhotel.com");
/// assert_eq!(root_domain("www.hotel.co.uk"), "hotel.co.uk");
/// assert_eq!(root_domain("127.0.0.1"), "127.0.0.1");
/// ```
pub fn root_domain(host: &str) -> String {
    let host = host.trim_end_matches('.').to_lowercase();

    if host.starts_with('[') || host.parse::<IpAddr>().is_ok() {
        return host;
    }

    match psl::domain_str(&host) {
        Some(domain) => domain.to_string(),
        None => host,
    }
}

/// Returns the subdomain part of a host (`en` for `en.hotel.com`)
pub fn subdomain(host: &str) -> Option<String> {
    let host = host.trim_end_matches('.').to_lowercase();
    let root = root_domain(&host);
    host.strip_suffix(&root)
        .and_then(|rest| rest.strip_suffix('.'))
        .filter(|rest| !rest.is_empty())
        .map(str::to_string)
}

/// Returns the language code when the host is a language subdomain
pub fn language_subdomain(host: &str) -> Option<&'static str> {
    let sub = subdomain(host)?;
    LANGUAGE_PREFIXES.iter().copied().find(|code| *code == sub)
}
