//! Per-category signal extractors.
//!
//! Every extractor is a pure, total function `(document, url) -> record`:
//! missing markup produces the field's absent value, never an error. The
//! container built here keeps a slot `None` when the category does not apply
//! to the page, which downstream scoring treats differently from "false".

pub mod authority;
pub mod authorship;
pub mod experience;
pub mod links;
pub mod metadata;
pub mod reputation;
pub mod sitemap;
pub mod structured;
pub mod trust;

use crate::domain::models::{PageSignals, PageType, SpeedSignals};
use scraper::{Html, Selector};
use std::sync::OnceLock;
use url::Url;

/// Run every applicable extractor against a parsed document.
///
/// Applicability: authorship runs on article-like and profile pages (or when
/// the markup itself looks like an article); experience only on recognised
/// case-study pages; everything else on every page.
pub fn extract_page(
    html: &Html,
    url: &Url,
    page_type: PageType,
    speed: SpeedSignals,
) -> PageSignals {
    let authorship = {
        let record = authorship::extract(html, url, page_type);
        if page_type.is_article_like() || page_type == PageType::Profile || record.is_article {
            Some(record)
        } else {
            None
        }
    };

    let experience = {
        let record = experience::extract(html, url);
        if record.is_case_study {
            Some(record)
        } else {
            None
        }
    };

    PageSignals {
        url: url.clone(),
        page_type,
        authorship,
        trust: Some(trust::extract(html, url)),
        authority: Some(authority::extract(html, url)),
        reputation: Some(reputation::extract(html)),
        experience,
        metadata: Some(metadata::extract(html, url)),
        structured_data: Some(structured::extract(html)),
        links: Some(links::extract(html, url)),
        speed: Some(speed),
    }
}

/// Whole-document visible text, lowercased and whitespace-normalized.
/// Shared by the keyword-driven extractors.
pub(crate) fn page_text(html: &Html) -> String {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    let selector = SELECTOR.get_or_init(|| Selector::parse("body").unwrap());

    html.select(selector)
        .next()
        .map(|body| {
            body.text()
                .collect::<String>()
                .to_lowercase()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_page_skips_inapplicable_categories() {
        let html = Html::parse_document("<html><body><p>Plain landing page</p></body></html>");
        let url = Url::parse("https://clinic.example/pricing").unwrap();
        let signals = extract_page(&html, &url, PageType::Other, SpeedSignals::default());

        assert!(signals.authorship.is_none(), "not an article or profile");
        assert!(signals.experience.is_none(), "not a case study");
        assert!(signals.trust.is_some());
        assert!(signals.metadata.is_some());
        assert!(signals.links.is_some());
    }

    #[test]
    fn extract_page_keeps_authorship_for_articles() {
        let html = Html::parse_document("<html><body><article>text</article></body></html>");
        let url = Url::parse("https://clinic.example/blog/post").unwrap();
        let signals = extract_page(&html, &url, PageType::Blog, SpeedSignals::default());
        assert!(signals.authorship.is_some());
    }

    #[test]
    fn page_text_is_normalized() {
        let html = Html::parse_document("<html><body><p>Hello   WORLD\n\tfoo</p></body></html>");
        assert_eq!(page_text(&html), "hello world foo");
    }
}
