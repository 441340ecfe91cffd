//! Authorship and professional-credential signals.
//!
//! Articles: find an author block by trying a fixed, ordered selector list
//! and taking the first match. Profile pages: look for qualification and
//! position keywords, an experience-duration pattern, and links/images that
//! point at credential documents.

use crate::domain::models::{AuthorshipSignals, PageType};
use crate::extractor::page_text;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::OnceLock;
use url::Url;

/// Ordered author-block selectors; the first that matches wins.
const AUTHOR_SELECTORS: &[&str] = &[
    "[itemprop='author']",
    "[rel='author']",
    ".author",
    ".post-author",
    ".article-author",
    ".byline",
];

const ARTICLE_CLASS_HINTS: &[&str] = &["post", "article", "blog-entry", "entry-content"];

const QUALIFICATION_KEYWORDS: &[&str] = &[
    "образование",
    "квалификаци",
    "ординатура",
    "кандидат медицинских наук",
    "education",
    "residency",
    "board certified",
    "m.d.",
    "ph.d",
];

const POSITION_KEYWORDS: &[&str] = &[
    "главный врач",
    "заведующ",
    "врач-",
    "хирург",
    "терапевт",
    "chief physician",
    "head of department",
    "surgeon",
    "physician",
];

const CREDENTIAL_KEYWORDS: &[&str] = &[
    "диплом",
    "сертификат",
    "лицензия",
    "diploma",
    "certificate",
    "license",
];

pub fn extract(html: &Html, url: &Url, page_type: PageType) -> AuthorshipSignals {
    let is_article = detect_article(html, page_type);
    let is_profile = page_type == PageType::Profile;

    let (has_author_block, author_name, author_profile_url) = if is_article {
        find_author_block(html, url)
    } else {
        (false, None, None)
    };

    let (has_qualifications, has_position, has_experience_duration, credential_documents) =
        if is_profile {
            let text = page_text(html);
            (
                QUALIFICATION_KEYWORDS.iter().any(|k| text.contains(k)),
                POSITION_KEYWORDS.iter().any(|k| text.contains(k)),
                has_experience_pattern(&text),
                credential_documents(html, url),
            )
        } else {
            (false, false, false, Vec::new())
        };

    AuthorshipSignals {
        is_article,
        has_author_block,
        author_name,
        author_profile_url,
        is_profile,
        has_qualifications,
        has_position,
        has_experience_duration,
        credential_documents,
    }
}

fn detect_article(html: &Html, page_type: PageType) -> bool {
    if page_type.is_article_like() {
        return true;
    }

    static ARTICLE: OnceLock<Selector> = OnceLock::new();
    let article = ARTICLE.get_or_init(|| Selector::parse("article").unwrap());
    if html.select(article).next().is_some() {
        return true;
    }

    static CLASSED: OnceLock<Selector> = OnceLock::new();
    let classed = CLASSED.get_or_init(|| Selector::parse("[class]").unwrap());
    html.select(classed).any(|el| {
        el.value()
            .attr("class")
            .map(|c| {
                let c = c.to_lowercase();
                ARTICLE_CLASS_HINTS.iter().any(|hint| c.contains(hint))
            })
            .unwrap_or(false)
    })
}

fn find_author_block(html: &Html, base: &Url) -> (bool, Option<String>, Option<String>) {
    static LINK: OnceLock<Selector> = OnceLock::new();
    let link = LINK.get_or_init(|| Selector::parse("a[href]").unwrap());

    for raw in AUTHOR_SELECTORS {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        let Some(block) = html.select(&selector).next() else {
            continue;
        };

        let name = block
            .text()
            .collect::<String>()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        let name = (!name.is_empty()).then(|| truncate(&name, 120));

        let profile = block
            .select(link)
            .next()
            .and_then(|a| a.value().attr("href"))
            .and_then(|href| base.join(href).ok())
            .map(|u| u.to_string());

        return (true, name, profile);
    }
    (false, None, None)
}

fn has_experience_pattern(text: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(
            r"(?x)
            (опыт|стаж|experience)\D{0,30}\d{1,2}\s*(лет|год|years?)
            | \d{1,2}\+?\s*(лет|года?|years?)\s*(опыта|стажа|of\s+experience)",
        )
        .unwrap()
    });
    re.is_match(text)
}

/// Links and images that look like scanned credentials, deduplicated by
/// normalized URL.
fn credential_documents(html: &Html, base: &Url) -> Vec<String> {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    let selector = SELECTOR.get_or_init(|| Selector::parse("a[href], img[src]").unwrap());

    let mut seen = HashSet::new();
    let mut docs = Vec::new();

    for el in html.select(selector) {
        let target = el
            .value()
            .attr("href")
            .or_else(|| el.value().attr("src"))
            .unwrap_or("");
        let text = el.text().collect::<String>().to_lowercase();
        let alt = el.value().attr("alt").unwrap_or("").to_lowercase();
        let haystack = format!("{} {} {}", target.to_lowercase(), text, alt);

        if !CREDENTIAL_KEYWORDS.iter().any(|k| haystack.contains(k)) {
            continue;
        }
        let Ok(mut resolved) = base.join(target) else {
            continue;
        };
        resolved.set_fragment(None);
        let normalized = resolved.to_string();
        if seen.insert(normalized.clone()) {
            docs.push(normalized);
        }
    }
    docs
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}
