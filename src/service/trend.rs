//! Score movement against the previous persisted audit.

use crate::domain::models::{AuditRecord, AuditResult, CategoryDelta, Trend};

/// Compare the current result against the last stored record. With no prior
/// record the trend is an explicit first-audit marker; a genuine zero delta
/// only ever comes from two comparable runs.
pub fn compare(current: &AuditResult, prior: Option<&AuditRecord>) -> Trend {
    let Some(prior) = prior else {
        log::debug!("[TREND] No prior audit for {}", current.site);
        return Trend::FirstAudit;
    };

    let overall = current.overall_score as i16 - prior.overall_score as i16;

    // Categories present in both runs get a delta; categories that appeared
    // or disappeared between runs are not comparable and are skipped.
    let categories: Vec<CategoryDelta> = current
        .category_scores
        .iter()
        .filter_map(|cur| {
            prior
                .category_scores
                .iter()
                .find(|prev| prev.category == cur.category)
                .map(|prev| CategoryDelta {
                    category: cur.category,
                    delta: cur.score as i16 - prev.score as i16,
                })
        })
        .collect();

    log::debug!(
        "[TREND] {} overall {:+}, {} comparable categories",
        current.site,
        overall,
        categories.len()
    );
    Trend::Delta {
        overall,
        categories,
    }
}
