use crate::UrlError;
use url::Url;

/// Query parameters that only switch UI language, currency or session on
/// booking engines. They are dropped so variants of one booking page share a key.
const VOLATILE_BOOKING_PARAMS: &[&str] = &["lang", "language", "currency", "nsid", "sessionid"];

/// Terms that mark a host, path or query as booking related
pub(crate) const BOOKING_TERMS: &[&str] = &["booking", "reserve", "reservation", "book"];

/// Normalizes a URL into the crawl's deduplication key
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed or not HTTP(S)
/// 2. Lowercase scheme and host (done by the parser), keep an explicit port
/// 3. Remove trailing slashes from the path (`https://h.com/` becomes `https://h.com`)
/// 4. Remove fragment (everything after #)
/// 5. Booking URLs: drop language/currency/session parameters, keep the rest in order
/// 6. Other URLs: keep the query string verbatim
///
/// # Examples
///
/// ```
/// use hotel_scout::url::normalize_url;
///
/// let key = normalize_url("https://Hotel.example.com/rooms/#deluxe").unwrap();
/// assert_eq!(key, "https://hotel.example.com/rooms");
/// ```
pub fn normalize_url(url_str: &str) -> Result<String, UrlError> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;
    normalize_parsed(&url)
}

/// Same as [`normalize_url`] for an already parsed URL
pub fn normalize_parsed(url: &Url) -> Result<String, UrlError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    let host = url.host_str().ok_or(UrlError::MissingDomain)?;

    let mut normalized = format!("{}://{}", url.scheme(), host.to_lowercase());
    if let Some(port) = url.port() {
        normalized.push(':');
        normalized.push_str(&port.to_string());
    }
    normalized.push_str(url.path().trim_end_matches('/'));

    if let Some(query) = url.query().filter(|q| !q.is_empty()) {
        if is_booking_url(url) {
            let kept = strip_volatile_params(query);
            if !kept.is_empty() {
                normalized.push('?');
                normalized.push_str(&kept);
            }
        } else {
            normalized.push('?');
            normalized.push_str(query);
        }
    }

    Ok(normalized)
}

/// Checks whether a URL is likely a booking page
///
/// The host, the path and the query string are each searched for booking
/// vocabulary.
pub fn is_booking_url(url: &Url) -> bool {
    let host = url.host_str().unwrap_or("").to_lowercase();
    if BOOKING_TERMS.iter().any(|term| host.contains(term)) {
        return true;
    }

    let path = url.path().to_lowercase();
    if ["book", "reserve", "reservation"]
        .iter()
        .any(|term| path.contains(term))
    {
        return true;
    }

    url.query()
        .map(|q| q.to_lowercase())
        .map(|q| {
            ["book", "reserve", "reservation"]
                .iter()
                .any(|term| q.contains(term))
        })
        .unwrap_or(false)
}

/// Removes volatile booking parameters, keeping the remaining ones verbatim
fn strip_volatile_params(query: &str) -> String {
    query
        .split('&')
        .filter(|param| !param.is_empty())
        .filter(|param| {
            let key = param.split('=').next().unwrap_or("").to_lowercase();
            !VOLATILE_BOOKING_PARAMS.contains(&key.as_str())
        })
        .collect::<Vec<_>>()
        .join("&")
}
