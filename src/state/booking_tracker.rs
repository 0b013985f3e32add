use std::collections::HashSet;

/// Tracks booking-engine pages for one crawl session
///
/// Booking engines tend to expose thousands of near-identical pages, so the
/// session only fetches a bounded number of them. Each new booking host is
/// still admitted to the frontier once so that every engine gets sampled.
///
/// Invariant: `crawled() <= max()`.
#[derive(Debug, Clone)]
pub struct BookingTracker {
    /// Booking hosts that have had at least one URL admitted
    domains_seen: HashSet<String>,

    /// Booking pages handed out for fetching
    count_crawled: u32,

    /// Maximum booking pages per session
    max: u32,
}

impl BookingTracker {
    /// Creates a new tracker with the given cap
    pub fn new(max: u32) -> Self {
        Self {
            domains_seen: HashSet::new(),
            count_crawled: 0,
            max,
        }
    }

    /// Decides whether a booking URL on `host` may enter the frontier
    ///
    /// A host seen for the first time is always admitted and recorded.
    /// Known hosts are admitted only while the cap has not been reached.
    pub fn admit(&mut self, host: &str) -> bool {
        let host = host.to_lowercase();
        if self.domains_seen.insert(host) {
            return true;
        }
        !self.is_exhausted()
    }

    /// Claims a fetch slot for a booking page
    ///
    /// Returns false (and counts nothing) when the cap is already reached.
    pub fn try_claim(&mut self) -> bool {
        if self.is_exhausted() {
            return false;
        }
        self.count_crawled += 1;
        true
    }

    /// Returns true once the session has fetched `max` booking pages
    pub fn is_exhausted(&self) -> bool {
        self.count_crawled >= self.max
    }

    pub fn crawled(&self) -> u32 {
        self.count_crawled
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn remaining(&self) -> u32 {
        self.max.saturating_sub(self.count_crawled)
    }

    /// Returns true if a URL on this host was already admitted
    pub fn has_seen(&self, host: &str) -> bool {
        self.domains_seen.contains(&host.to_lowercase())
    }

    pub fn domains_seen(&self) -> usize {
        self.domains_seen.len()
    }
}
