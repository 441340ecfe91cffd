//! Rule-driven recommendation generation.
//!
//! Every recommendation comes from a fixed rule: message, severity, category
//! and priority are baked into the table, only the trigger predicate looks at
//! audit data. Rules fire independently except where a coarse finding makes a
//! finer one redundant (a missing canonical already implies bad canonical
//! quality), in which case the finer trigger checks that the coarse one did
//! not fire.

use crate::domain::models::{Category, Recommendation, Severity};
use crate::service::aggregator::metric;
use crate::service::scoring::AuditView;
use std::collections::HashSet;

struct Rule {
    category: Category,
    severity: Severity,
    priority: u8,
    message: &'static str,
    trigger: fn(&AuditView) -> bool,
}

/// True when the metric applied to at least one page and its percent is
/// strictly below `threshold`.
fn below(view: &AuditView, name: &str, threshold: u8) -> bool {
    view.metric_percent(name).is_some_and(|p| p < threshold)
}

fn any_title_missing(view: &AuditView) -> bool {
    view.pages
        .iter()
        .filter_map(|p| p.metadata.as_ref())
        .any(|m| m.title.is_none())
}

fn canonical_missing(view: &AuditView) -> bool {
    below(view, metric::CANONICAL_COVERAGE, 100)
}

static RULES: &[Rule] = &[
    Rule {
        category: Category::Compliance,
        severity: Severity::Critical,
        priority: 10,
        message: "The site is not served over HTTPS. Migrate to HTTPS with a valid certificate.",
        trigger: |v| !v.site.https,
    },
    Rule {
        category: Category::Experience,
        severity: Severity::Critical,
        priority: 10,
        message: "Case studies appear to contain non-anonymized patient data. Remove or anonymize names, addresses and phone numbers.",
        trigger: |v| {
            v.pages
                .iter()
                .filter_map(|p| p.experience.as_ref())
                .any(|e| !e.pii_flags.is_empty())
        },
    },
    Rule {
        category: Category::Metadata,
        severity: Severity::Critical,
        priority: 9,
        message: "Some pages carry a noindex directive and are invisible to search engines. Remove it from pages that should rank.",
        trigger: |v| below(v, metric::NOINDEX_FREE_COVERAGE, 100),
    },
    Rule {
        category: Category::Compliance,
        severity: Severity::Warning,
        priority: 8,
        message: "No mobile viewport meta tag was found. Add one so pages render correctly on phones.",
        trigger: |v| below(v, metric::MOBILE_FRIENDLY_COVERAGE, 100),
    },
    Rule {
        category: Category::Authorship,
        severity: Severity::Warning,
        priority: 8,
        message: "Most articles have no visible author. Attribute articles to a named specialist.",
        trigger: |v| below(v, metric::AUTHOR_COVERAGE, 50),
    },
    Rule {
        category: Category::Trust,
        severity: Severity::Warning,
        priority: 8,
        message: "No privacy policy link was found. Publish one and link it from every page footer.",
        trigger: |v| {
            v.metric_percent(metric::PRIVACY_POLICY_COVERAGE)
                .is_some_and(|p| p == 0)
        },
    },
    Rule {
        category: Category::Compliance,
        severity: Severity::Warning,
        priority: 7,
        message: "robots.txt is missing. Add one to control crawler access.",
        trigger: |v| !v.site.robots_txt_found,
    },
    Rule {
        category: Category::Compliance,
        severity: Severity::Warning,
        priority: 7,
        message: "No XML sitemap was found. Publish sitemap.xml and reference it from robots.txt.",
        trigger: |v| !v.site.sitemap_found,
    },
    Rule {
        category: Category::Metadata,
        severity: Severity::Warning,
        priority: 7,
        message: "Some pages have no canonical URL. Add a canonical link element to every indexable page.",
        trigger: canonical_missing,
    },
    Rule {
        category: Category::Metadata,
        severity: Severity::Warning,
        priority: 6,
        message: "Canonical URLs are present but point away from the page itself. Verify they are self-referencing where intended.",
        trigger: |v| {
            !canonical_missing(v)
                && v.pages
                    .iter()
                    .filter_map(|p| p.metadata.as_ref())
                    .any(|m| m.has_canonical && !m.canonical_is_self)
        },
    },
    Rule {
        category: Category::Metadata,
        severity: Severity::Warning,
        priority: 7,
        message: "Some pages have no title element at all. Every page needs a unique, descriptive title.",
        trigger: any_title_missing,
    },
    Rule {
        category: Category::Metadata,
        severity: Severity::Warning,
        priority: 6,
        message: "Page titles are weak: wrong length, generic wording or no locality. Rewrite them around the service and city.",
        trigger: |v| !any_title_missing(v) && below(v, metric::TITLE_QUALITY, 60),
    },
    Rule {
        category: Category::Trust,
        severity: Severity::Warning,
        priority: 7,
        message: "No contact channel was detected: no email, booking form or embedded map. Make it easy to reach the clinic.",
        trigger: |v| {
            let trust: Vec<_> = v.pages.iter().filter_map(|p| p.trust.as_ref()).collect();
            !trust.is_empty()
                && !trust
                    .iter()
                    .any(|t| t.has_contact_email || t.has_booking_form || t.has_embedded_map)
        },
    },
    Rule {
        category: Category::Compliance,
        severity: Severity::Warning,
        priority: 6,
        message: "The HTTP version of the site does not redirect to HTTPS. Add a permanent redirect to avoid duplicate content.",
        trigger: |v| v.site.redirects_consistent == Some(false),
    },
    Rule {
        category: Category::Trust,
        severity: Severity::Warning,
        priority: 6,
        message: "No legal entity or registration number is published. State the operating company and its registration details.",
        trigger: |v| {
            let trust: Vec<_> = v.pages.iter().filter_map(|p| p.trust.as_ref()).collect();
            !trust.is_empty()
                && !trust
                    .iter()
                    .any(|t| t.has_legal_entity || t.has_registration_number)
        },
    },
    Rule {
        category: Category::Authority,
        severity: Severity::Warning,
        priority: 6,
        message: "Articles cite no recognized scientific or medical sources. Reference primary literature where claims are made.",
        trigger: |v| {
            v.metric_percent(metric::SCIENTIFIC_SOURCE_COVERAGE)
                .is_some_and(|p| p == 0)
        },
    },
    Rule {
        category: Category::Authorship,
        severity: Severity::Warning,
        priority: 6,
        message: "Specialist profiles show no diplomas, certificates or licenses. Publish scanned credentials on profile pages.",
        trigger: |v| below(v, metric::CREDENTIAL_COVERAGE, 50),
    },
    Rule {
        category: Category::Performance,
        severity: Severity::Warning,
        priority: 6,
        message: "Some pages take more than 2.5 seconds to load. Reduce page weight or move to faster hosting.",
        trigger: |v| {
            v.pages
                .iter()
                .filter_map(|p| p.speed.as_ref())
                .any(|s| s.load_time_ms > 2500)
        },
    },
    Rule {
        category: Category::Reputation,
        severity: Severity::Warning,
        priority: 5,
        message: "Links to fewer than two review platforms were found. Link your Google, Yandex or ProDoctorov profiles.",
        trigger: |v| {
            let platforms: HashSet<&str> = v
                .pages
                .iter()
                .filter_map(|p| p.reputation.as_ref())
                .flat_map(|r| r.platform_links.iter().map(|p| p.platform.as_str()))
                .collect();
            v.pages.iter().any(|p| p.reputation.is_some()) && platforms.len() < 2
        },
    },
    Rule {
        category: Category::Links,
        severity: Severity::Warning,
        priority: 5,
        message: "Many images are missing alt text. Describe images so they are accessible and indexable.",
        trigger: |v| below(v, metric::ALT_TEXT_COVERAGE, 80),
    },
    Rule {
        category: Category::StructuredData,
        severity: Severity::Info,
        priority: 5,
        message: "Little structured data was found. Add Organization, LocalBusiness and FAQ markup where relevant.",
        trigger: |v| {
            v.pages.iter().any(|p| p.structured_data.is_some())
                && below(v, metric::STRUCTURED_DATA_COVERAGE, 50)
        },
    },
    Rule {
        category: Category::Experience,
        severity: Severity::Info,
        priority: 4,
        message: "Case studies skip most of the expected sections. Cover complaint, diagnosis, treatment, result and timeline.",
        trigger: |v| below(v, metric::CASE_STUDY_COMPLETENESS, 60),
    },
    Rule {
        category: Category::Metadata,
        severity: Severity::Info,
        priority: 4,
        message: "Meta descriptions are weak or missing. Write 70-160 character summaries that mention the locality.",
        trigger: |v| below(v, metric::DESCRIPTION_QUALITY, 60),
    },
    Rule {
        category: Category::Links,
        severity: Severity::Info,
        priority: 4,
        message: "Every external link passes link equity. Add rel=\"nofollow\" to untrusted or commercial outbound links.",
        trigger: |v| below(v, metric::DOFOLLOW_HYGIENE, 100),
    },
    Rule {
        category: Category::Compliance,
        severity: Severity::Info,
        priority: 2,
        message: "No llms.txt file was found. Publishing one helps AI crawlers understand the site.",
        trigger: |v| !v.site.llms_txt_found,
    },
];

/// Evaluate every rule against the view. Output is sorted by priority,
/// highest first; ties keep table order, so repeated runs on the same view
/// produce the identical list.
pub fn generate(view: &AuditView) -> Vec<Recommendation> {
    let mut recommendations: Vec<Recommendation> = RULES
        .iter()
        .filter(|rule| (rule.trigger)(view))
        .map(|rule| Recommendation {
            message: rule.message.to_string(),
            severity: rule.severity,
            category: rule.category,
            priority: rule.priority,
        })
        .collect();

    recommendations.sort_by(|a, b| b.priority.cmp(&a.priority));
    log::info!("[RECOMMEND] {} rules fired", recommendations.len());
    recommendations
}

/// Subset of recommendations for one category, original order preserved.
pub fn filter_by_category(
    recommendations: &[Recommendation],
    category: Category,
) -> Vec<Recommendation> {
    recommendations
        .iter()
        .filter(|r| r.category == category)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{
        AggregatedMetric, MetadataSignals, PageSignals, PageType, SiteFiles,
    };
    use crate::service::aggregator::aggregate;
    use url::Url;

    fn page_with_metadata(path: &str, metadata: MetadataSignals) -> PageSignals {
        PageSignals {
            url: Url::parse(&format!("https://clinic.example{path}")).unwrap(),
            page_type: PageType::Other,
            authorship: None,
            trust: None,
            authority: None,
            reputation: None,
            experience: None,
            metadata: Some(metadata),
            structured_data: None,
            links: None,
            speed: None,
        }
    }

    fn view_over<'a>(
        pages: &'a [&'a PageSignals],
        metrics: &'a [AggregatedMetric],
        site: &'a SiteFiles,
    ) -> AuditView<'a> {
        AuditView {
            pages,
            metrics,
            site,
            ratings: &[],
        }
    }

    #[test]
    fn output_priorities_are_non_increasing() {
        let pages = vec![page_with_metadata("/", MetadataSignals::default())];
        let refs: Vec<&PageSignals> = pages.iter().collect();
        let metrics = aggregate(&refs);
        let site = SiteFiles::default();
        let recs = generate(&view_over(&refs, &metrics, &site));

        assert!(!recs.is_empty());
        for pair in recs.windows(2) {
            assert!(pair[0].priority >= pair[1].priority);
        }
    }

    #[test]
    fn generation_is_deterministic() {
        let pages = vec![page_with_metadata("/", MetadataSignals::default())];
        let refs: Vec<&PageSignals> = pages.iter().collect();
        let metrics = aggregate(&refs);
        let site = SiteFiles::default();
        let view = view_over(&refs, &metrics, &site);

        assert_eq!(generate(&view), generate(&view));
    }

    #[test]
    fn missing_https_fires_critical() {
        let pages = vec![page_with_metadata("/", MetadataSignals::default())];
        let refs: Vec<&PageSignals> = pages.iter().collect();
        let metrics = aggregate(&refs);
        let site = SiteFiles {
            https: false,
            ..Default::default()
        };
        let recs = generate(&view_over(&refs, &metrics, &site));

        let https = recs
            .iter()
            .find(|r| r.message.contains("HTTPS") && r.severity == Severity::Critical)
            .expect("https rule should fire");
        assert_eq!(https.priority, 10);
    }

    #[test]
    fn missing_canonical_suppresses_quality_finding() {
        // One page without a canonical, one with a non-self canonical: only
        // the coarse "missing" rule may fire.
        let pages = vec![
            page_with_metadata("/a", MetadataSignals::default()),
            page_with_metadata(
                "/b",
                MetadataSignals {
                    has_canonical: true,
                    canonical_is_self: false,
                    ..Default::default()
                },
            ),
        ];
        let refs: Vec<&PageSignals> = pages.iter().collect();
        let metrics = aggregate(&refs);
        let site = SiteFiles::default();
        let recs = generate(&view_over(&refs, &metrics, &site));

        assert!(recs.iter().any(|r| r.message.contains("no canonical URL")));
        assert!(!recs.iter().any(|r| r.message.contains("point away")));
    }

    #[test]
    fn filter_by_category_preserves_order() {
        let pages = vec![page_with_metadata("/", MetadataSignals::default())];
        let refs: Vec<&PageSignals> = pages.iter().collect();
        let metrics = aggregate(&refs);
        let site = SiteFiles::default();
        let recs = generate(&view_over(&refs, &metrics, &site));

        let compliance = filter_by_category(&recs, Category::Compliance);
        let expected: Vec<&Recommendation> = recs
            .iter()
            .filter(|r| r.category == Category::Compliance)
            .collect();
        assert_eq!(compliance.len(), expected.len());
        for (got, want) in compliance.iter().zip(expected) {
            assert_eq!(got, want);
        }
    }
}
