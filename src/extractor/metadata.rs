//! Metadata signals: title/description quality checklists, canonical,
//! hreflang, robots-meta noindex and the mobile viewport check.
//!
//! Quality is a fixed checklist of equal-share sub-conditions; each met
//! condition is worth 25 points.

use crate::domain::models::MetadataSignals;
use scraper::{Html, Selector};
use std::sync::OnceLock;
use url::Url;

const LOCALITY_KEYWORDS: &[&str] = &[
    "москв", "санкт-петербург", "спб", "екатеринбург", "новосибирск", "казан",
    "in moscow", "clinic in",
];

const GENERIC_TITLES: &[&str] = &["home", "главная", "untitled", "new page", "index", "default"];

const GENERIC_LEADS: &[&str] = &["добро пожаловать", "welcome to", "главная страница", "homepage"];

pub fn extract(html: &Html, url: &Url) -> MetadataSignals {
    let title = select_text(html, "title");
    let description = select_attr(html, "meta[name='description']", "content");
    let canonical = select_attr(html, "link[rel='canonical']", "href");

    let (has_canonical, canonical_is_self) = match canonical.as_deref() {
        Some(href) if !href.is_empty() => {
            let is_self = url
                .join(href)
                .map(|resolved| resolved.as_str() == url.as_str())
                .unwrap_or(false);
            (true, is_self)
        }
        _ => (false, false),
    };

    static HREFLANG: OnceLock<Selector> = OnceLock::new();
    let hreflang = HREFLANG.get_or_init(|| Selector::parse("link[rel='alternate'][hreflang]").unwrap());
    let hreflang_count = html.select(hreflang).count() as u32;

    let robots_meta = select_attr(html, "meta[name='robots']", "content")
        .map(|c| c.to_lowercase())
        .unwrap_or_default();

    let viewport = select_attr(html, "meta[name='viewport']", "content").unwrap_or_default();

    MetadataSignals {
        title_quality: title
            .as_deref()
            .map(|t| quality_score(t, 30..=60))
            .unwrap_or(0),
        title,
        description_quality: description
            .as_deref()
            .map(|d| quality_score(d, 70..=160))
            .unwrap_or(0),
        description,
        has_canonical,
        canonical_is_self,
        hreflang_count,
        noindex: robots_meta.contains("noindex"),
        mobile_viewport: viewport.contains("width=device-width"),
    }
}

/// Four equal-share conditions: length in range, locality keyword present,
/// not a generic placeholder, and a meaningful (non-generic) lead.
fn quality_score(text: &str, length_range: std::ops::RangeInclusive<usize>) -> u8 {
    let lower = text.to_lowercase();
    let mut met = 0u8;

    if length_range.contains(&text.chars().count()) {
        met += 1;
    }
    if LOCALITY_KEYWORDS.iter().any(|k| lower.contains(k)) {
        met += 1;
    }
    if !GENERIC_TITLES.contains(&lower.trim()) {
        met += 1;
    }
    if !GENERIC_LEADS.iter().any(|lead| lower.starts_with(lead)) {
        met += 1;
    }
    met * 25
}

fn select_text(html: &Html, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    html.select(&sel)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn select_attr(html: &Html, selector: &str, attr: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    html.select(&sel)
        .next()
        .and_then(|el| el.value().attr(attr))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(head: &str) -> Html {
        Html::parse_document(&format!("<html><head>{head}</head><body></body></html>"))
    }

    fn url() -> Url {
        Url::parse("https://clinic.example/services/mrt").unwrap()
    }

    #[test]
    fn missing_title_scores_zero() {
        let s = extract(&page(""), &url());
        assert!(s.title.is_none());
        assert_eq!(s.title_quality, 0);
    }

    #[test]
    fn good_title_hits_all_conditions() {
        let s = extract(
            &page("<title>МРТ диагностика в Москве — цены и запись</title>"),
            &url(),
        );
        assert_eq!(s.title_quality, 100);
    }

    #[test]
    fn generic_short_title_loses_shares() {
        let s = extract(&page("<title>Главная</title>"), &url());
        // Fails length, locality, and the generic-placeholder check;
        // keeps only the lead condition.
        assert_eq!(s.title_quality, 25);
    }

    #[test]
    fn canonical_self_match_resolves_relative_href() {
        let s = extract(
            &page(r#"<link rel="canonical" href="/services/mrt">"#),
            &url(),
        );
        assert!(s.has_canonical);
        assert!(s.canonical_is_self);

        let other = extract(
            &page(r#"<link rel="canonical" href="https://clinic.example/other">"#),
            &url(),
        );
        assert!(other.has_canonical);
        assert!(!other.canonical_is_self);
    }

    #[test]
    fn noindex_and_viewport() {
        let s = extract(
            &page(
                r#"<meta name="robots" content="NOINDEX, nofollow">
                   <meta name="viewport" content="width=device-width, initial-scale=1">"#,
            ),
            &url(),
        );
        assert!(s.noindex);
        assert!(s.mobile_viewport);
    }

    #[test]
    fn hreflang_counted() {
        let s = extract(
            &page(
                r#"<link rel="alternate" hreflang="en" href="/en/">
                   <link rel="alternate" hreflang="de" href="/de/">"#,
            ),
            &url(),
        );
        assert_eq!(s.hreflang_count, 2);
    }
}
