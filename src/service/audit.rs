//! Audit orchestration: discovery, probing, fetching, aggregation, scoring,
//! recommendations and trend, in that order.

use crate::domain::models::{
    domain_key, AuditResult, AuditTarget, PageSignals, PlatformLink, PlatformRating,
};
use crate::error::{AuditError, Result};
use crate::service::aggregator::aggregate;
use crate::service::discovery::{PageDiscovery, SiteProbe};
use crate::service::fetcher::PageFetcher;
use crate::service::history::HistoryStore;
use crate::service::ratings::{resolve_ratings, NullRatingLookup, RatingLookup};
use crate::service::recommend::generate;
use crate::service::scoring::{score, AuditView};
use crate::service::trend::compare;
use chrono::Utc;
use tokio::time::Instant;

pub struct SiteAuditor {
    target: AuditTarget,
    discovery: PageDiscovery,
    probe: SiteProbe,
    fetcher: PageFetcher,
    rating_lookup: Box<dyn RatingLookup>,
    history: Option<Box<dyn HistoryStore>>,
}

impl SiteAuditor {
    pub fn new(target: AuditTarget) -> Result<Self> {
        Ok(Self {
            discovery: PageDiscovery::new(target.request_timeout)?,
            probe: SiteProbe::new(target.request_timeout)?,
            fetcher: PageFetcher::new(target.concurrency, target.request_timeout)?,
            rating_lookup: Box::new(NullRatingLookup),
            history: None,
            target,
        })
    }

    pub fn with_rating_lookup(mut self, lookup: Box<dyn RatingLookup>) -> Self {
        self.rating_lookup = lookup;
        self
    }

    pub fn with_history(mut self, history: Box<dyn HistoryStore>) -> Self {
        self.history = Some(history);
        self
    }

    /// Run the full pipeline. Per-page failures are tolerated; the only
    /// fatal runtime condition is that not a single page could be analyzed.
    pub async fn run(&self) -> Result<AuditResult> {
        let domain = domain_key(&self.target.base_url);
        log::info!("[AUDIT] Starting audit of {}", domain);

        let pages = self.discovery.discover(&self.target).await;
        let site_files = self.probe.probe(&self.target.base_url).await;

        let deadline = self.target.overall_deadline.map(|d| Instant::now() + d);
        let outcomes = self.fetcher.run(&pages, deadline).await;

        let signals: Vec<&PageSignals> = outcomes.iter().filter_map(|o| o.signals()).collect();
        if signals.is_empty() {
            return Err(AuditError::NoPagesAnalyzable {
                discovered: pages.len(),
            });
        }
        let pages_failed = outcomes.len() - signals.len();

        let metrics = aggregate(&signals);
        let ratings = self.lookup_ratings(&signals).await;

        let view = AuditView {
            pages: &signals,
            metrics: &metrics,
            site: &site_files,
            ratings: &ratings,
        };
        let (category_scores, overall_score) = score(&view);
        let recommendations = generate(&view);

        let mut result = AuditResult {
            site: domain.clone(),
            generated_at: Utc::now(),
            pages_discovered: pages.len(),
            pages_succeeded: signals.len(),
            pages_failed,
            site_files,
            outcomes,
            ratings,
            metrics,
            category_scores,
            overall_score,
            recommendations,
            trend: None,
        };

        // History problems degrade to "no trend"; the audit itself stands.
        if let Some(history) = &self.history {
            match history.last(&domain) {
                Ok(prior) => {
                    result.trend = Some(compare(&result, prior.as_ref()));
                    if let Err(e) = history.append(&domain, &result.to_record()) {
                        log::warn!("[AUDIT] Could not persist audit record: {e}");
                    }
                }
                Err(e) => {
                    log::warn!("[AUDIT] Could not read audit history: {e}");
                }
            }
        }

        log::info!(
            "[AUDIT] {} complete - overall {} from {}/{} pages",
            domain,
            result.overall_score,
            result.pages_succeeded,
            result.pages_discovered
        );
        Ok(result)
    }

    async fn lookup_ratings(&self, signals: &[&PageSignals]) -> Vec<PlatformRating> {
        let links: Vec<PlatformLink> = signals
            .iter()
            .filter_map(|p| p.reputation.as_ref())
            .flat_map(|r| r.platform_links.iter().cloned())
            .collect();
        resolve_ratings(self.rating_lookup.as_ref(), &links).await
    }
}
