//! State module for tracking crawl progress
//!
//! This module provides the session-scoped state a crawl carries around.
//!
//! # Components
//!
//! - `CrawlPhase`: Lifecycle of one crawl session (idle, seeding, draining, completed)
//! - `BookingTracker`: Caps how many booking-engine pages are fetched per session
//! - `VisitedSet`: Append-only set of normalized URLs already claimed for fetching

mod booking_tracker;
mod crawl_phase;
mod visited;

// Re-export main types
pub use booking_tracker::BookingTracker;
pub use crawl_phase::CrawlPhase;
pub use visited::VisitedSet;
