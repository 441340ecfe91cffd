//! Weighted category scoring.
//!
//! Each category declares a fixed weight table whose weights sum to 100.
//! Checks backed by an aggregated percent metric contribute fractionally;
//! a check whose metric had no applicable pages drops out and the remaining
//! weights are renormalized. A category where every check dropped out is
//! omitted entirely, never scored as zero. All arithmetic stays in `f64`
//! and is rounded exactly once, when a score is materialised.

use crate::domain::models::{
    AggregatedMetric, Category, CategoryScore, PageSignals, PlatformRating, SiteFiles,
};
use crate::service::aggregator::metric;
use std::collections::HashSet;

/// Immutable snapshot handed to scoring and recommendation generation.
pub struct AuditView<'a> {
    pub pages: &'a [&'a PageSignals],
    pub metrics: &'a [AggregatedMetric],
    pub site: &'a SiteFiles,
    pub ratings: &'a [PlatformRating],
}

impl<'a> AuditView<'a> {
    pub fn metric(&self, name: &str) -> Option<&AggregatedMetric> {
        self.metrics.iter().find(|m| m.name == name)
    }

    /// Metric value as a 0.0-1.0 fraction; `None` when the metric had no
    /// applicable pages.
    pub fn metric_fraction(&self, name: &str) -> Option<f64> {
        self.metric(name)
            .filter(|m| !m.is_inapplicable())
            .map(|m| m.percent as f64 / 100.0)
    }

    /// Metric percent, or `None` when inapplicable.
    pub fn metric_percent(&self, name: &str) -> Option<u8> {
        self.metric(name)
            .filter(|m| !m.is_inapplicable())
            .map(|m| m.percent)
    }
}

/// One weighted check: `value` is `None` when the check did not apply.
struct Check {
    weight: f64,
    value: Option<f64>,
}

fn check(weight: f64, value: Option<f64>) -> Check {
    Check { weight, value }
}

fn flag(weight: f64, value: bool) -> Check {
    Check {
        weight,
        value: Some(if value { 1.0 } else { 0.0 }),
    }
}

/// Compute all category scores plus the rounded overall mean.
pub fn score(view: &AuditView) -> (Vec<CategoryScore>, u8) {
    let mut scores = Vec::new();

    for category in Category::ALL {
        let checks = category_checks(category, view);
        if let Some(score) = weighted_score(category, &checks) {
            scores.push(score);
        }
    }

    let overall = if scores.is_empty() {
        0
    } else {
        let sum: f64 = scores.iter().map(|s| s.score as f64).sum();
        (sum / scores.len() as f64).round() as u8
    };

    log::info!(
        "[SCORING] {} categories scored, overall {}",
        scores.len(),
        overall
    );
    (scores, overall)
}

fn weighted_score(category: Category, checks: &[Check]) -> Option<CategoryScore> {
    let applied: Vec<&Check> = checks.iter().filter(|c| c.value.is_some()).collect();
    if applied.is_empty() {
        log::debug!("[SCORING] {:?} omitted: no applicable signals", category);
        return None;
    }

    let weight_sum: f64 = applied.iter().map(|c| c.weight).sum();
    let value_sum: f64 = applied
        .iter()
        .map(|c| c.weight * c.value.unwrap_or(0.0))
        .sum();

    Some(CategoryScore {
        category,
        score: (value_sum / weight_sum * 100.0).round() as u8,
        applied_signals: applied.len(),
    })
}

fn category_checks(category: Category, view: &AuditView) -> Vec<Check> {
    match category {
        Category::Compliance => vec![
            flag(40.0, view.site.https),
            check(30.0, view.metric_fraction(metric::MOBILE_FRIENDLY_COVERAGE)),
            flag(15.0, view.site.robots_txt_found),
            flag(15.0, view.site.sitemap_found),
        ],
        Category::Authorship => vec![
            check(50.0, view.metric_fraction(metric::AUTHOR_COVERAGE)),
            check(30.0, view.metric_fraction(metric::CREDENTIAL_COVERAGE)),
            check(20.0, view.metric_fraction(metric::AUTHOR_PROFILE_COVERAGE)),
        ],
        Category::Trust => trust_checks(view),
        Category::Authority => authority_checks(view),
        Category::Reputation => reputation_checks(view),
        Category::Experience => {
            let has_cases = view.pages.iter().any(|p| p.experience.is_some());
            if !has_cases {
                return Vec::new();
            }
            vec![
                check(40.0, Some(1.0)), // case studies exist at all
                check(40.0, view.metric_fraction(metric::CASE_STUDY_COMPLETENESS)),
                check(20.0, view.metric_fraction(metric::PII_COMPLIANCE)),
            ]
        }
        Category::Metadata => vec![
            check(30.0, view.metric_fraction(metric::TITLE_QUALITY)),
            check(30.0, view.metric_fraction(metric::DESCRIPTION_QUALITY)),
            check(25.0, view.metric_fraction(metric::CANONICAL_COVERAGE)),
            check(15.0, view.metric_fraction(metric::NOINDEX_FREE_COVERAGE)),
        ],
        Category::StructuredData => {
            if view.pages.iter().all(|p| p.structured_data.is_none()) {
                return Vec::new();
            }
            vec![check(
                100.0,
                view.metric_fraction(metric::STRUCTURED_DATA_COVERAGE),
            )]
        }
        Category::Links => {
            let any_links = view.pages.iter().any(|p| p.links.is_some());
            if !any_links {
                return Vec::new();
            }
            let any_external = view
                .pages
                .iter()
                .filter_map(|p| p.links.as_ref())
                .any(|l| l.external_total > 0);
            vec![
                check(40.0, view.metric_fraction(metric::ALT_TEXT_COVERAGE)),
                flag(30.0, any_external),
                check(30.0, view.metric_fraction(metric::DOFOLLOW_HYGIENE)),
            ]
        }
        Category::Performance => {
            let speeds: Vec<f64> = view
                .pages
                .iter()
                .filter_map(|p| p.speed.as_ref())
                .map(|s| s.sub_score())
                .collect();
            if speeds.is_empty() {
                return Vec::new();
            }
            let mean = speeds.iter().sum::<f64>() / speeds.len() as f64;
            vec![check(100.0, Some(mean))]
        }
    }
}

fn trust_checks(view: &AuditView) -> Vec<Check> {
    let trust: Vec<_> = view
        .pages
        .iter()
        .filter_map(|p| p.trust.as_ref())
        .collect();
    if trust.is_empty() {
        return Vec::new();
    }

    let contact_parts = [
        trust.iter().any(|t| t.has_contact_email),
        trust.iter().any(|t| t.has_booking_form),
        trust.iter().any(|t| t.has_embedded_map),
    ];
    let contact = contact_parts.iter().filter(|b| **b).count() as f64 / 3.0;

    let about = trust.iter().find(|t| t.is_about_page).map(|t| {
        let subchecks = [t.about_has_history, t.about_has_mission, t.about_has_team];
        0.4 + 0.2 * subchecks.iter().filter(|b| **b).count() as f64
    });

    vec![
        check(25.0, view.metric_fraction(metric::PRIVACY_POLICY_COVERAGE)),
        flag(
            20.0,
            trust
                .iter()
                .any(|t| t.has_legal_entity || t.has_registration_number),
        ),
        check(20.0, Some(contact)),
        flag(15.0, trust.iter().any(|t| t.nap.is_some())),
        check(20.0, Some(about.unwrap_or(0.0))),
    ]
}

fn authority_checks(view: &AuditView) -> Vec<Check> {
    let authority: Vec<_> = view
        .pages
        .iter()
        .filter_map(|p| p.authority.as_ref())
        .collect();
    if authority.is_empty() {
        return Vec::new();
    }

    let distinct_domains: HashSet<&str> = authority
        .iter()
        .flat_map(|a| a.scientific_domains.iter().map(String::as_str))
        .collect();
    // Three distinct scientific domains is treated as full marks.
    let scientific = (distinct_domains.len() as f64 / 3.0).min(1.0);

    let associations = if authority.iter().any(|a| !a.associations.is_empty()) {
        1.0
    } else if authority.iter().any(|a| a.has_generic_association) {
        0.5
    } else {
        0.0
    };

    vec![
        check(35.0, Some(scientific)),
        flag(
            25.0,
            authority.iter().any(|a| a.authoritative_media_links > 0),
        ),
        flag(
            20.0,
            authority
                .iter()
                .any(|a| a.has_doi_reference || a.has_publication_links),
        ),
        check(20.0, Some(associations)),
    ]
}

fn reputation_checks(view: &AuditView) -> Vec<Check> {
    let reputation: Vec<_> = view
        .pages
        .iter()
        .filter_map(|p| p.reputation.as_ref())
        .collect();
    if reputation.is_empty() {
        return Vec::new();
    }

    let distinct: HashSet<&str> = reputation
        .iter()
        .flat_map(|r| r.platform_links.iter().map(|p| p.platform.as_str()))
        .collect();
    let platforms = (distinct.len() as f64 / 3.0).min(1.0);

    let fetched: Vec<f64> = view
        .ratings
        .iter()
        .filter(|r| r.outcome.fetched)
        .filter_map(|r| r.outcome.rating)
        .map(|r| (r as f64 / 5.0).clamp(0.0, 1.0))
        .collect();
    let ratings = if fetched.is_empty() {
        None // no lookup configured or every lookup failed
    } else {
        Some(fetched.iter().sum::<f64>() / fetched.len() as f64)
    };

    vec![check(60.0, Some(platforms)), check(40.0, ratings)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{MetadataSignals, PageSignals, PageType, SpeedSignals};
    use crate::service::aggregator::aggregate;
    use url::Url;

    fn page(path: &str) -> PageSignals {
        PageSignals {
            url: Url::parse(&format!("https://clinic.example{path}")).unwrap(),
            page_type: PageType::Other,
            authorship: None,
            trust: None,
            authority: None,
            reputation: None,
            experience: None,
            metadata: None,
            structured_data: None,
            links: None,
            speed: None,
        }
    }

    fn score_of(scores: &[CategoryScore], category: Category) -> Option<u8> {
        scores
            .iter()
            .find(|s| s.category == category)
            .map(|s| s.score)
    }

    #[test]
    fn compliance_weights_match_declared_table() {
        // https=false, mobile=true, robots=true, sitemap=true with weights
        // 40/30/15/15 must come out at exactly 60.
        let mut p = page("/");
        p.metadata = Some(MetadataSignals {
            mobile_viewport: true,
            ..Default::default()
        });
        let pages = vec![p];
        let refs: Vec<&PageSignals> = pages.iter().collect();
        let metrics = aggregate(&refs);
        let site = SiteFiles {
            https: false,
            robots_txt_found: true,
            sitemap_found: true,
            llms_txt_found: false,
            redirects_consistent: None,
        };
        let view = AuditView {
            pages: &refs,
            metrics: &metrics,
            site: &site,
            ratings: &[],
        };

        let (scores, _) = score(&view);
        assert_eq!(score_of(&scores, Category::Compliance), Some(60));
    }

    #[test]
    fn inapplicable_category_omitted_from_overall() {
        // No article, profile or case-study pages: authorship and experience
        // must be absent, not zero.
        let mut p = page("/");
        p.metadata = Some(MetadataSignals::default());
        p.speed = Some(SpeedSignals {
            load_time_ms: 500,
            body_bytes: 1000,
        });
        let pages = vec![p];
        let refs: Vec<&PageSignals> = pages.iter().collect();
        let metrics = aggregate(&refs);
        let site = SiteFiles::default();
        let view = AuditView {
            pages: &refs,
            metrics: &metrics,
            site: &site,
            ratings: &[],
        };

        let (scores, overall) = score(&view);
        assert!(score_of(&scores, Category::Authorship).is_none());
        assert!(score_of(&scores, Category::Experience).is_none());
        assert!(score_of(&scores, Category::Performance).is_some());

        // Overall is the mean of present categories only.
        let mean = scores.iter().map(|s| s.score as f64).sum::<f64>() / scores.len() as f64;
        assert_eq!(overall, mean.round() as u8);
    }

    #[test]
    fn scoring_is_idempotent() {
        let mut p = page("/");
        p.metadata = Some(MetadataSignals {
            title_quality: 75,
            mobile_viewport: true,
            ..Default::default()
        });
        let pages = vec![p];
        let refs: Vec<&PageSignals> = pages.iter().collect();
        let metrics = aggregate(&refs);
        let site = SiteFiles::default();
        let view = AuditView {
            pages: &refs,
            metrics: &metrics,
            site: &site,
            ratings: &[],
        };

        let first = score(&view);
        let second = score(&view);
        assert_eq!(first, second);
    }

    #[test]
    fn dropped_check_renormalizes_weights() {
        // Ratings lookup not configured: reputation should be scored from
        // platform presence alone, not dragged down by the missing 40%.
        let mut p = page("/");
        p.reputation = Some(crate::domain::models::ReputationSignals {
            platform_links: vec![
                crate::domain::models::PlatformLink {
                    platform: "google".into(),
                    url: "https://google.com/maps/x".into(),
                },
                crate::domain::models::PlatformLink {
                    platform: "yandex".into(),
                    url: "https://yandex.ru/maps/x".into(),
                },
                crate::domain::models::PlatformLink {
                    platform: "vk".into(),
                    url: "https://vk.com/x".into(),
                },
            ],
        });
        let pages = vec![p];
        let refs: Vec<&PageSignals> = pages.iter().collect();
        let metrics = aggregate(&refs);
        let site = SiteFiles::default();
        let view = AuditView {
            pages: &refs,
            metrics: &metrics,
            site: &site,
            ratings: &[],
        };

        let (scores, _) = score(&view);
        assert_eq!(score_of(&scores, Category::Reputation), Some(100));
    }
}
