//! Cross-page metric aggregation.
//!
//! Each named metric counts only the pages it applies to: the authorship
//! ratios run over article-like pages, credential coverage over profile
//! pages, and so on. A metric whose applicable-page set is empty comes back
//! as `{0, 0, 0}` rather than being dropped, so scoring can tell "not
//! applicable" from "applicable and failing".

use crate::domain::models::{AggregatedMetric, PageSignals, SchemaType};
use std::collections::HashSet;

/// Metric names shared between aggregation, scoring and recommendations.
pub mod metric {
    pub const AUTHOR_COVERAGE: &str = "author_coverage";
    pub const AUTHOR_PROFILE_COVERAGE: &str = "author_profile_coverage";
    pub const CREDENTIAL_COVERAGE: &str = "credential_coverage";
    pub const SCIENTIFIC_SOURCE_COVERAGE: &str = "scientific_source_coverage";
    pub const PRIVACY_POLICY_COVERAGE: &str = "privacy_policy_coverage";
    pub const CASE_STUDY_COMPLETENESS: &str = "case_study_completeness";
    pub const PII_COMPLIANCE: &str = "pii_compliance";
    pub const ALT_TEXT_COVERAGE: &str = "alt_text_coverage";
    pub const STRUCTURED_DATA_COVERAGE: &str = "structured_data_coverage";
    pub const CANONICAL_COVERAGE: &str = "canonical_coverage";
    pub const TITLE_QUALITY: &str = "title_quality";
    pub const DESCRIPTION_QUALITY: &str = "description_quality";
    pub const MOBILE_FRIENDLY_COVERAGE: &str = "mobile_friendly_coverage";
    pub const NOINDEX_FREE_COVERAGE: &str = "noindex_free_coverage";
    pub const DOFOLLOW_HYGIENE: &str = "dofollow_hygiene";
}

pub fn aggregate(pages: &[&PageSignals]) -> Vec<AggregatedMetric> {
    let mut metrics = Vec::new();

    // --- authorship, over article-like pages ---
    let articles: Vec<_> = pages
        .iter()
        .filter_map(|p| p.authorship.as_ref().filter(|a| a.is_article))
        .collect();
    metrics.push(AggregatedMetric::ratio(
        metric::AUTHOR_COVERAGE,
        articles.iter().filter(|a| a.has_author_block).count() as u32,
        articles.len() as u32,
    ));
    let authored: Vec<_> = articles.iter().filter(|a| a.has_author_block).collect();
    metrics.push(AggregatedMetric::ratio(
        metric::AUTHOR_PROFILE_COVERAGE,
        authored
            .iter()
            .filter(|a| a.author_profile_url.is_some())
            .count() as u32,
        authored.len() as u32,
    ));

    // --- credentials, over profile pages ---
    let profiles: Vec<_> = pages
        .iter()
        .filter_map(|p| p.authorship.as_ref().filter(|a| a.is_profile))
        .collect();
    metrics.push(AggregatedMetric::ratio(
        metric::CREDENTIAL_COVERAGE,
        profiles
            .iter()
            .filter(|a| !a.credential_documents.is_empty())
            .count() as u32,
        profiles.len() as u32,
    ));

    // --- scientific sources, over article-like pages ---
    let article_authority: Vec<_> = pages
        .iter()
        .filter(|p| p.page_type.is_article_like())
        .filter_map(|p| p.authority.as_ref())
        .collect();
    metrics.push(AggregatedMetric::ratio(
        metric::SCIENTIFIC_SOURCE_COVERAGE,
        article_authority
            .iter()
            .filter(|a| !a.scientific_domains.is_empty())
            .count() as u32,
        article_authority.len() as u32,
    ));

    // --- trust, over every page with a trust record ---
    let trust: Vec<_> = pages.iter().filter_map(|p| p.trust.as_ref()).collect();
    metrics.push(AggregatedMetric::ratio(
        metric::PRIVACY_POLICY_COVERAGE,
        trust.iter().filter(|t| t.has_privacy_policy).count() as u32,
        trust.len() as u32,
    ));

    // --- case studies ---
    let cases: Vec<_> = pages.iter().filter_map(|p| p.experience.as_ref()).collect();
    metrics.push(AggregatedMetric::mean_percent(
        metric::CASE_STUDY_COMPLETENESS,
        cases.iter().map(|c| c.completeness_percent),
    ));
    metrics.push(AggregatedMetric::ratio(
        metric::PII_COMPLIANCE,
        cases.iter().filter(|c| c.pii_compliant()).count() as u32,
        cases.len() as u32,
    ));

    // --- links: image-level ratio, not page-level ---
    let (images_with_alt, images_total) = pages
        .iter()
        .filter_map(|p| p.links.as_ref())
        .fold((0u32, 0u32), |(with_alt, total), l| {
            (with_alt + l.images_with_alt, total + l.images_total)
        });
    metrics.push(AggregatedMetric::ratio(
        metric::ALT_TEXT_COVERAGE,
        images_with_alt,
        images_total,
    ));

    let with_external: Vec<_> = pages
        .iter()
        .filter_map(|p| p.links.as_ref())
        .filter(|l| l.external_total > 0)
        .collect();
    metrics.push(AggregatedMetric::ratio(
        metric::DOFOLLOW_HYGIENE,
        with_external
            .iter()
            .filter(|l| l.dofollow_percent() <= 90)
            .count() as u32,
        with_external.len() as u32,
    ));

    // --- structured data: distinct types across the whole site ---
    let distinct_types: HashSet<SchemaType> = pages
        .iter()
        .filter_map(|p| p.structured_data.as_ref())
        .flat_map(|s| s.types_present.iter().copied())
        .collect();
    metrics.push(AggregatedMetric::ratio(
        metric::STRUCTURED_DATA_COVERAGE,
        distinct_types.len() as u32,
        SchemaType::KNOWN_TYPE_COUNT as u32,
    ));

    // --- metadata ---
    let meta: Vec<_> = pages.iter().filter_map(|p| p.metadata.as_ref()).collect();
    metrics.push(AggregatedMetric::ratio(
        metric::CANONICAL_COVERAGE,
        meta.iter().filter(|m| m.has_canonical).count() as u32,
        meta.len() as u32,
    ));
    metrics.push(AggregatedMetric::mean_percent(
        metric::TITLE_QUALITY,
        meta.iter().map(|m| m.title_quality),
    ));
    metrics.push(AggregatedMetric::mean_percent(
        metric::DESCRIPTION_QUALITY,
        meta.iter().map(|m| m.description_quality),
    ));
    metrics.push(AggregatedMetric::ratio(
        metric::MOBILE_FRIENDLY_COVERAGE,
        meta.iter().filter(|m| m.mobile_viewport).count() as u32,
        meta.len() as u32,
    ));
    metrics.push(AggregatedMetric::ratio(
        metric::NOINDEX_FREE_COVERAGE,
        meta.iter().filter(|m| !m.noindex).count() as u32,
        meta.len() as u32,
    ));

    metrics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{AuthorshipSignals, MetadataSignals, PageType};
    use url::Url;

    fn blank_page(path: &str, page_type: PageType) -> PageSignals {
        PageSignals {
            url: Url::parse(&format!("https://clinic.example{path}")).unwrap(),
            page_type,
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

    fn article(path: &str, has_author: bool) -> PageSignals {
        let mut p = blank_page(path, PageType::Blog);
        p.authorship = Some(AuthorshipSignals {
            is_article: true,
            has_author_block: has_author,
            ..Default::default()
        });
        p
    }

    fn find<'a>(metrics: &'a [AggregatedMetric], name: &str) -> &'a AggregatedMetric {
        metrics.iter().find(|m| m.name == name).unwrap()
    }

    #[test]
    fn author_coverage_counts_only_articles() {
        let pages = vec![
            article("/blog/a", true),
            article("/blog/b", false),
            article("/blog/c", true),
            blank_page("/prices", PageType::Other),
        ];
        let refs: Vec<&PageSignals> = pages.iter().collect();
        let metrics = aggregate(&refs);

        let m = find(&metrics, metric::AUTHOR_COVERAGE);
        assert_eq!((m.numerator, m.denominator, m.percent), (2, 3, 67));
    }

    #[test]
    fn zero_applicable_pages_yield_zero_not_nan() {
        // No article-like pages at all.
        let pages = vec![blank_page("/prices", PageType::Other)];
        let refs: Vec<&PageSignals> = pages.iter().collect();
        let metrics = aggregate(&refs);

        let m = find(&metrics, metric::AUTHOR_COVERAGE);
        assert_eq!((m.numerator, m.denominator, m.percent), (0, 0, 0));
        assert!(m.is_inapplicable());
    }

    #[test]
    fn all_percents_in_range() {
        let pages = vec![article("/blog/a", true), blank_page("/x", PageType::Other)];
        let refs: Vec<&PageSignals> = pages.iter().collect();
        for m in aggregate(&refs) {
            assert!(m.percent <= 100, "{} out of range", m.name);
        }
    }

    #[test]
    fn title_quality_is_mean_of_page_scores() {
        let mut a = blank_page("/a", PageType::Other);
        a.metadata = Some(MetadataSignals {
            title_quality: 100,
            ..Default::default()
        });
        let mut b = blank_page("/b", PageType::Other);
        b.metadata = Some(MetadataSignals {
            title_quality: 50,
            ..Default::default()
        });

        let pages = vec![a, b];
        let refs: Vec<&PageSignals> = pages.iter().collect();
        let metrics = aggregate(&refs);
        assert_eq!(find(&metrics, metric::TITLE_QUALITY).percent, 75);
    }
}
