//! Core data model for the audit pipeline.
//!
//! Everything downstream of the fetch stage is a pure function of these
//! records: per-page signal bags, cross-page metrics, category scores and
//! the final `AuditResult` snapshot. Signal records use `Option` at the
//! container level so "not applicable" stays distinguishable from "false".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

// ============================================================================
// AUDIT TARGET & DISCOVERY
// ============================================================================

/// Coarse page classification used for extractor applicability and
/// discovery filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageType {
    Blog,
    Article,
    Profile,
    Other,
}

impl PageType {
    /// Classify a URL by path substrings. Heuristic by design; pages that
    /// match nothing fall through to `Other` and still get the
    /// always-applicable extractors.
    pub fn classify(url: &Url) -> Self {
        let path = url.path().to_lowercase();

        const PROFILE: &[&str] = &[
            "/doctor", "/vrach", "/specialist", "/physician", "/team/", "/staff/",
        ];
        const BLOG: &[&str] = &["/blog"];
        const ARTICLE: &[&str] = &["/article", "/news", "/post", "/stati", "/statya"];

        if PROFILE.iter().any(|p| path.contains(p)) {
            PageType::Profile
        } else if BLOG.iter().any(|p| path.contains(p)) {
            PageType::Blog
        } else if ARTICLE.iter().any(|p| path.contains(p)) {
            PageType::Article
        } else {
            PageType::Other
        }
    }

    /// Blog and article pages share the article-oriented extractors.
    pub fn is_article_like(&self) -> bool {
        matches!(self, PageType::Blog | PageType::Article)
    }
}

/// Page-type filter applied after discovery. `All` is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageFilter {
    All,
    Only(PageType),
}

impl PageFilter {
    pub fn matches(&self, page_type: PageType) -> bool {
        match self {
            PageFilter::All => true,
            PageFilter::Only(t) => *t == page_type,
        }
    }
}

/// Immutable configuration for one audit invocation.
#[derive(Debug, Clone)]
pub struct AuditTarget {
    pub base_url: Url,
    pub use_sitemap: bool,
    pub use_robots: bool,
    pub crawl_internal_links: bool,
    pub max_pages: usize,
    pub page_filter: PageFilter,
    pub concurrency: usize,
    pub request_timeout: Duration,
    /// Optional wall-clock bound for the whole fetch phase. When it elapses
    /// mid-run the audit completes with the outcomes gathered so far.
    pub overall_deadline: Option<Duration>,
}

impl AuditTarget {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            use_sitemap: true,
            use_robots: true,
            crawl_internal_links: false,
            max_pages: 20,
            page_filter: PageFilter::All,
            concurrency: 4,
            request_timeout: Duration::from_secs(15),
            overall_deadline: None,
        }
    }
}

/// A candidate page produced by discovery. Read-only afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveredPage {
    pub url: Url,
    pub page_type: PageType,
}

/// Normalized domain key used by the history store (host, lowercased,
/// leading `www.` stripped).
pub fn domain_key(url: &Url) -> String {
    url.host_str()
        .unwrap_or("unknown")
        .to_lowercase()
        .trim_start_matches("www.")
        .to_string()
}

// ============================================================================
// PER-PAGE SIGNAL RECORDS
// ============================================================================

/// Authorship and professional-credential signals. Article fields apply to
/// article-like pages, credential fields to profile pages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthorshipSignals {
    pub is_article: bool,
    pub has_author_block: bool,
    pub author_name: Option<String>,
    pub author_profile_url: Option<String>,
    pub is_profile: bool,
    pub has_qualifications: bool,
    pub has_position: bool,
    pub has_experience_duration: bool,
    pub credential_documents: Vec<String>,
}

/// Name / address / phone tuple for local-business consistency checks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NapData {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
}

impl NapData {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.address.is_none() && self.phone.is_none()
    }
}

/// Transparency signals: legal identity, policies, contact surface.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrustSignals {
    pub has_privacy_policy: bool,
    pub has_license_mention: bool,
    pub has_legal_entity: bool,
    pub has_registration_number: bool,
    pub is_about_page: bool,
    pub about_has_history: bool,
    pub about_has_mission: bool,
    pub about_has_team: bool,
    pub has_contact_email: bool,
    pub has_booking_form: bool,
    pub has_embedded_map: bool,
    pub nap: Option<NapData>,
}

/// Outbound-authority signals: scientific sources, media, publications,
/// professional associations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthoritySignals {
    /// Distinct allowlisted scientific/government domains linked from the page.
    pub scientific_domains: Vec<String>,
    pub authoritative_media_links: u32,
    pub total_media_links: u32,
    pub has_doi_reference: bool,
    pub has_publication_links: bool,
    pub associations: Vec<String>,
    pub has_generic_association: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformLink {
    pub platform: String,
    pub url: String,
}

/// Reputation surface: links out to review platforms and social profiles.
/// Rating values come from external lookups, never from page scraping.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReputationSignals {
    pub platform_links: Vec<PlatformLink>,
}

/// Case-study structure and PII-compliance signals.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExperienceSignals {
    pub is_case_study: bool,
    /// How many of the seven expected sections are present.
    pub sections_present: u8,
    /// round(sections_present / 7 * 100)
    pub completeness_percent: u8,
    /// Human-readable descriptions of suspected non-anonymized patient data.
    pub pii_flags: Vec<String>,
}

impl ExperienceSignals {
    pub fn pii_compliant(&self) -> bool {
        self.pii_flags.is_empty()
    }
}

/// Metadata quality signals, including the mobile viewport check that feeds
/// the compliance category.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetadataSignals {
    pub title: Option<String>,
    /// 0-100, fixed checklist of equal-share sub-conditions.
    pub title_quality: u8,
    pub description: Option<String>,
    pub description_quality: u8,
    pub has_canonical: bool,
    pub canonical_is_self: bool,
    pub hreflang_count: u32,
    pub noindex: bool,
    pub mobile_viewport: bool,
}

/// The schema.org types the structured-data extractor recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchemaType {
    Organization,
    LocalBusiness,
    Person,
    Article,
    FaqPage,
    BreadcrumbList,
    Review,
    MedicalProcedure,
}

impl SchemaType {
    pub const KNOWN_TYPE_COUNT: usize = 8;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StructuredDataSignals {
    pub types_present: Vec<SchemaType>,
}

/// External-link health and image alt-text coverage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinkSignals {
    pub external_total: u32,
    pub external_dofollow: u32,
    pub images_total: u32,
    pub images_with_alt: u32,
}

impl LinkSignals {
    /// Share of external links without rel=nofollow, as a percent.
    pub fn dofollow_percent(&self) -> u8 {
        if self.external_total == 0 {
            return 0;
        }
        ((self.external_dofollow as f64 / self.external_total as f64) * 100.0).round() as u8
    }
}

/// Load measurements taken at fetch time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpeedSignals {
    pub load_time_ms: u64,
    pub body_bytes: usize,
}

impl SpeedSignals {
    /// Bucketed 0.0-1.0 sub-score from wall-clock load time.
    pub fn sub_score(&self) -> f64 {
        match self.load_time_ms {
            0..=1000 => 1.0,
            1001..=2500 => 0.75,
            2501..=4000 => 0.5,
            _ => 0.25,
        }
    }
}

/// The full per-page signal bag. `None` in a slot means the category was not
/// applicable to this page, which is distinct from an all-false record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSignals {
    pub url: Url,
    pub page_type: PageType,
    pub authorship: Option<AuthorshipSignals>,
    pub trust: Option<TrustSignals>,
    pub authority: Option<AuthoritySignals>,
    pub reputation: Option<ReputationSignals>,
    pub experience: Option<ExperienceSignals>,
    pub metadata: Option<MetadataSignals>,
    pub structured_data: Option<StructuredDataSignals>,
    pub links: Option<LinkSignals>,
    pub speed: Option<SpeedSignals>,
}

// ============================================================================
// FETCH OUTCOMES
// ============================================================================

/// Why a page failed to produce signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FetchErrorKind {
    #[serde(rename = "fetch_timeout")]
    Timeout,
    #[serde(rename = "fetch_error")]
    Http,
    #[serde(rename = "parse_error")]
    Parse,
}

impl std::fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FetchErrorKind::Timeout => "fetch_timeout",
            FetchErrorKind::Http => "fetch_error",
            FetchErrorKind::Parse => "parse_error",
        };
        write!(f, "{s}")
    }
}

/// Exactly one per discovered page. Completion order across a batch is
/// unordered; downstream code only relies on every page being present once.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FetchOutcome {
    Analyzed { url: Url, signals: PageSignals },
    Failed { url: Url, error: FetchErrorKind },
}

impl FetchOutcome {
    pub fn url(&self) -> &Url {
        match self {
            FetchOutcome::Analyzed { url, .. } | FetchOutcome::Failed { url, .. } => url,
        }
    }

    pub fn signals(&self) -> Option<&PageSignals> {
        match self {
            FetchOutcome::Analyzed { signals, .. } => Some(signals),
            FetchOutcome::Failed { .. } => None,
        }
    }
}

// ============================================================================
// SITE-LEVEL PROBES
// ============================================================================

/// Results of the once-per-audit site probes (well-known files, HTTPS,
/// duplicate-content redirects). `None` means the probe could not run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteFiles {
    pub https: bool,
    pub robots_txt_found: bool,
    pub sitemap_found: bool,
    pub llms_txt_found: bool,
    pub redirects_consistent: Option<bool>,
}

// ============================================================================
// METRICS, SCORES, RECOMMENDATIONS
// ============================================================================

/// A named cross-page ratio. The denominator counts only the pages the
/// metric applies to, never the whole page set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedMetric {
    pub name: String,
    pub numerator: u32,
    pub denominator: u32,
    pub percent: u8,
}

impl AggregatedMetric {
    pub fn ratio(name: &str, numerator: u32, denominator: u32) -> Self {
        let percent = if denominator > 0 {
            ((numerator as f64 / denominator as f64) * 100.0).round() as u8
        } else {
            0
        };
        Self {
            name: name.to_string(),
            numerator,
            denominator,
            percent,
        }
    }

    /// Mean of per-page percent values. The numerator carries the percent
    /// sum so the stored fields still reproduce the percent exactly.
    pub fn mean_percent(name: &str, values: impl IntoIterator<Item = u8>) -> Self {
        let mut sum = 0u32;
        let mut count = 0u32;
        for v in values {
            sum += v as u32;
            count += 1;
        }
        let percent = if count > 0 {
            (sum as f64 / count as f64).round() as u8
        } else {
            0
        };
        Self {
            name: name.to_string(),
            numerator: sum,
            denominator: count,
            percent,
        }
    }

    /// True when no page was applicable to this metric.
    pub fn is_inapplicable(&self) -> bool {
        self.denominator == 0
    }
}

/// The scored audit categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Authorship,
    Trust,
    Authority,
    Reputation,
    Experience,
    Compliance,
    Metadata,
    StructuredData,
    Links,
    Performance,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::Authorship,
        Category::Trust,
        Category::Authority,
        Category::Reputation,
        Category::Experience,
        Category::Compliance,
        Category::Metadata,
        Category::StructuredData,
        Category::Links,
        Category::Performance,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub category: Category,
    pub score: u8,
    /// How many weighted checks actually applied. Categories with zero
    /// applied signals are omitted from the overall score entirely.
    pub applied_signals: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

/// One actionable finding. Severity and priority are intrinsic to the rule
/// that emitted it, never derived at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub message: String,
    pub severity: Severity,
    pub category: Category,
    pub priority: u8,
}

// ============================================================================
// RATINGS & TREND
// ============================================================================

/// Result shape for external rating lookups. Lookups never error; any
/// failure comes back as `fetched: false`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RatingOutcome {
    pub rating: Option<f32>,
    pub review_count: Option<u32>,
    pub fetched: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformRating {
    pub platform: String,
    pub outcome: RatingOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryDelta {
    pub category: Category,
    pub delta: i16,
}

/// Score movement against the previous persisted audit. A first audit is an
/// explicit marker so "no data" never collapses into a zero delta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Trend {
    FirstAudit,
    Delta {
        overall: i16,
        categories: Vec<CategoryDelta>,
    },
}

/// What the history store persists per run: just enough for trends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub recorded_at: DateTime<Utc>,
    pub overall_score: u8,
    pub category_scores: Vec<CategoryScore>,
}

// ============================================================================
// FINAL SNAPSHOT
// ============================================================================

/// Immutable result of one audit run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditResult {
    pub site: String,
    pub generated_at: DateTime<Utc>,
    pub pages_discovered: usize,
    pub pages_succeeded: usize,
    pub pages_failed: usize,
    pub site_files: SiteFiles,
    pub outcomes: Vec<FetchOutcome>,
    pub ratings: Vec<PlatformRating>,
    pub metrics: Vec<AggregatedMetric>,
    pub category_scores: Vec<CategoryScore>,
    pub overall_score: u8,
    pub recommendations: Vec<Recommendation>,
    pub trend: Option<Trend>,
}

impl AuditResult {
    pub fn to_record(&self) -> AuditRecord {
        AuditRecord {
            recorded_at: self.generated_at,
            overall_score: self.overall_score,
            category_scores: self.category_scores.clone(),
        }
    }
}
