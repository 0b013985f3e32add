//! Crawl frontier
//!
//! This module handles:
//! - Priority queue management for URLs to crawl
//! - At-most-once admission keyed by the normalized URL
//! - Throttling of booking-engine pages
//! - Enforcing the session page cap

use crate::crawler::classifier::LinkClass;
use crate::state::{BookingTracker, VisitedSet};
use crate::url::{is_booking_url, normalize_parsed, Scope, SiteScope};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use url::Url;

/// Path fragments of pages every hotel site is expected to have
const KEY_PAGE_PATHS: &[&str] = &[
    "/rooms", "/suites", "/accommodations", "/lodging", "/facilities", "/amenities", "/services",
    "/photos", "/gallery", "/images", "/spa", "/restaurant", "/dining", "/chambres", "/zimmer",
    "/habitaciones", "/camere", "/room-types", "/our-rooms", "/guest-rooms", "/our-suites",
    "/hotel-facilities", "/hotel-amenities", "/photo-gallery",
];

/// A URL that may be fetched in this session
///
/// Out-of-scope URLs never become targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTarget {
    pub raw_url: Url,
    /// Deduplication key
    pub normalized_url: String,
    pub scope: Scope,
    pub class: LinkClass,
    /// Main-page link, key hotel page or language-subdomain URL
    pub promoted: bool,
}

impl CrawlTarget {
    /// Builds a target, returning None for out-of-scope or unnormalizable URLs
    pub fn new(raw_url: Url, class: LinkClass, promoted: bool, scope: &SiteScope) -> Option<Self> {
        let link_scope = scope.classify_url(&raw_url);
        if !link_scope.is_crawlable() {
            return None;
        }

        let normalized_url = normalize_parsed(&raw_url).ok()?;

        Some(Self {
            raw_url,
            normalized_url,
            scope: link_scope,
            class,
            promoted,
        })
    }

    /// Booking targets count against the booking throttle
    pub fn is_booking(&self) -> bool {
        self.class == LinkClass::Booking || is_booking_url(&self.raw_url)
    }

    pub fn host(&self) -> &str {
        self.raw_url.host_str().unwrap_or("")
    }
}

/// Returns true if the URL path looks like a key hotel page
pub fn is_key_page(url: &Url) -> bool {
    let path = url.path().to_lowercase();
    KEY_PAGE_PATHS.iter().any(|key| path.contains(key))
}

/// Outcome of offering a target to the frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offer {
    Admitted,
    AlreadySeen,
    Throttled,
}

/// Queue ranks (lower is fetched first)
const RANK_SEED: u8 = 0;

fn rank_of(class: LinkClass, promoted: bool) -> u8 {
    match class {
        LinkClass::LanguageVariant => 1,
        LinkClass::Menu => 2,
        LinkClass::Booking => 3,
        LinkClass::Normal if promoted => 4,
        LinkClass::Normal => 5,
    }
}

/// A target waiting in the queue
#[derive(Debug, Clone)]
struct QueuedTarget {
    target: CrawlTarget,

    /// Rank value (lower is higher priority)
    rank: u8,

    /// Insertion order, for FIFO within a rank
    seq: u64,
}

// Lower rank values have higher priority (are popped first from BinaryHeap)
impl Ord for QueuedTarget {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .rank
            .cmp(&self.rank)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for QueuedTarget {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for QueuedTarget {
    fn eq(&self, other: &Self) -> bool {
        self.rank == other.rank && self.seq == other.seq
    }
}

impl Eq for QueuedTarget {}

/// The crawl frontier for one session
///
/// Every normalized URL is handed out by `next()` at most once, and never
/// more than `page_cap` URLs are handed out in total. Booking targets dropped
/// by the throttle stay visited but do not count against the cap.
#[derive(Debug)]
pub struct Frontier {
    queue: BinaryHeap<QueuedTarget>,

    /// Normalized URLs currently waiting in `queue`
    queued: HashSet<String>,

    visited: VisitedSet,
    booking: BookingTracker,
    page_cap: usize,

    /// Targets returned by `next()`
    handed_out: usize,
    seq: u64,
}

impl Frontier {
    pub fn new(page_cap: usize, max_booking_visits: u32) -> Self {
        Self {
            queue: BinaryHeap::new(),
            queued: HashSet::new(),
            visited: VisitedSet::new(),
            booking: BookingTracker::new(max_booking_visits),
            page_cap,
            handed_out: 0,
            seq: 0,
        }
    }

    /// Enqueues a target ahead of every link class
    ///
    /// Seeds bypass the booking throttle but are still deduplicated.
    pub fn seed(&mut self, target: CrawlTarget) -> Offer {
        if self.is_known(&target.normalized_url) {
            return Offer::AlreadySeen;
        }
        self.push(target, RANK_SEED);
        Offer::Admitted
    }

    /// Offers a discovered target
    pub fn offer(&mut self, target: CrawlTarget) -> Offer {
        if self.is_known(&target.normalized_url) {
            return Offer::AlreadySeen;
        }

        if target.is_booking() && !self.booking.admit(target.host()) {
            tracing::debug!(
                "Skipping booking URL (reached limit of {}): {}",
                self.booking.max(),
                target.raw_url
            );
            return Offer::Throttled;
        }

        let rank = rank_of(target.class, target.promoted);
        self.push(target, rank);
        Offer::Admitted
    }

    /// Pops the best target and marks it visited
    ///
    /// Returns None once the page cap is reached or the queue is empty.
    /// Booking targets popped after the booking cap is spent are dropped.
    pub fn next(&mut self) -> Option<CrawlTarget> {
        loop {
            if self.handed_out >= self.page_cap {
                return None;
            }

            let entry = self.queue.pop()?;
            self.queued.remove(&entry.target.normalized_url);

            if !self.visited.insert(entry.target.normalized_url.clone()) {
                continue;
            }

            if entry.rank != RANK_SEED && entry.target.is_booking() && !self.booking.try_claim() {
                tracing::debug!(
                    "Dropping booking URL (reached limit of {}): {}",
                    self.booking.max(),
                    entry.target.raw_url
                );
                continue;
            }

            self.handed_out += 1;
            return Some(entry.target);
        }
    }

    /// Marks a normalized URL as visited without going through the queue
    pub fn mark_visited(&mut self, normalized: &str) -> bool {
        self.queued.remove(normalized);
        self.visited.insert(normalized)
    }

    pub fn is_visited(&self, normalized: &str) -> bool {
        self.visited.contains(normalized)
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Number of targets handed out so far
    pub fn handed_out(&self) -> usize {
        self.handed_out
    }

    pub fn queued_count(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn page_cap(&self) -> usize {
        self.page_cap
    }

    pub fn booking(&self) -> &BookingTracker {
        &self.booking
    }

    fn is_known(&self, normalized: &str) -> bool {
        self.visited.contains(normalized) || self.queued.contains(normalized)
    }

    fn push(&mut self, target: CrawlTarget, rank: u8) {
        tracing::trace!("Queued {} ({}, rank {})", target.normalized_url, target.class, rank);
        self.queued.insert(target.normalized_url.clone());
        self.queue.push(QueuedTarget {
            target,
            rank,
            seq: self.seq,
        });
        self.seq += 1;
    }
}
