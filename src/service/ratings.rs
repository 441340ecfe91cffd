//! External review-platform rating lookups.
//!
//! Ratings never come from scraping the audited site itself. A lookup is
//! infallible by contract: any failure is reported as `fetched: false` so a
//! flaky platform can never fail the audit.

use crate::domain::models::{PlatformLink, PlatformRating, RatingOutcome};
use async_trait::async_trait;

#[async_trait]
pub trait RatingLookup: Send + Sync {
    async fn lookup(&self, link: &PlatformLink) -> RatingOutcome;
}

/// Lookup used when no platform integration is configured. Everything comes
/// back unfetched, which scoring treats as "ratings check not applicable".
pub struct NullRatingLookup;

#[async_trait]
impl RatingLookup for NullRatingLookup {
    async fn lookup(&self, link: &PlatformLink) -> RatingOutcome {
        log::debug!("[RATINGS] No lookup configured for {}", link.platform);
        RatingOutcome::default()
    }
}

/// Resolve ratings for each distinct platform linked from the site.
pub async fn resolve_ratings(
    lookup: &dyn RatingLookup,
    links: &[PlatformLink],
) -> Vec<PlatformRating> {
    let mut seen = std::collections::HashSet::new();
    let mut ratings = Vec::new();

    for link in links {
        if !seen.insert(link.platform.clone()) {
            continue;
        }
        let outcome = lookup.lookup(link).await;
        if outcome.fetched {
            log::debug!(
                "[RATINGS] {}: {:?} from {} reviews",
                link.platform,
                outcome.rating,
                outcome.review_count.unwrap_or(0)
            );
        }
        ratings.push(PlatformRating {
            platform: link.platform.clone(),
            outcome,
        });
    }

    ratings
}
