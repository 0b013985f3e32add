/// Crawl phase definitions for tracking session progress
///
/// A session moves strictly forward through the phases; any other move is an error.
use crate::HarvestError;
use std::fmt;

/// Represents the current phase of a crawl session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CrawlPhase {
    /// Session created, nothing fetched yet
    #[default]
    Idle,

    /// Landing page is being fetched and its links offered
    Seeding,

    /// Frontier is being drained page by page
    Draining,

    /// Frontier exhausted or page cap reached
    Completed,
}

impl CrawlPhase {
    /// Returns true if the session has finished
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Returns true if moving from `self` to `next` is allowed
    ///
    /// Seeding may jump straight to Completed when the landing page is the
    /// only page the cap allows.
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Seeding)
                | (Self::Seeding, Self::Draining)
                | (Self::Seeding, Self::Completed)
                | (Self::Draining, Self::Completed)
        )
    }

    /// Moves to the next phase, rejecting invalid transitions
    pub fn transition(&mut self, next: CrawlPhase) -> Result<(), HarvestError> {
        if !self.can_transition_to(next) {
            return Err(HarvestError::InvalidTransition {
                from: *self,
                to: next,
            });
        }
        tracing::debug!("Crawl phase {} -> {}", self, next);
        *self = next;
        Ok(())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Seeding => "seeding",
            Self::Draining => "draining",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
