//! Outbound-authority signals: scientific sources, media mentions,
//! publications and professional-association membership.

use crate::domain::models::AuthoritySignals;
use crate::extractor::page_text;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::OnceLock;
use url::Url;

/// Fixed allowlist of scientific/government domains. Suffix match, so
/// `en.wikipedia.org` does not ride on `who.int`.
const SCIENTIFIC_DOMAINS: &[&str] = &[
    "pubmed.ncbi.nlm.nih.gov",
    "ncbi.nlm.nih.gov",
    "who.int",
    "nih.gov",
    "cochranelibrary.com",
    "thelancet.com",
    "nejm.org",
    "bmj.com",
    "rosminzdrav.ru",
    "cdc.gov",
];

const MEDIA_DOMAINS: &[&str] = &[
    "rbc.ru",
    "kommersant.ru",
    "forbes.ru",
    "forbes.com",
    "reuters.com",
    "bbc.com",
    "nytimes.com",
    "vedomosti.ru",
];

const MEDIA_TEXT_KEYWORDS: &[&str] = &["сми о нас", "press about", "в прессе", "media coverage"];

const PUBLICATION_DOMAINS: &[&str] = &[
    "doi.org",
    "elibrary.ru",
    "cyberleninka.ru",
    "scholar.google.com",
    "researchgate.net",
];

const KNOWN_ASSOCIATIONS: &[&str] = &[
    "национальная медицинская палата",
    "ассоциация стоматологов",
    "american medical association",
    "european society",
    "российское общество",
];

pub fn extract(html: &Html, _url: &Url) -> AuthoritySignals {
    static ANCHOR: OnceLock<Selector> = OnceLock::new();
    let anchor = ANCHOR.get_or_init(|| Selector::parse("a[href]").unwrap());

    let mut scientific: HashSet<String> = HashSet::new();
    let mut authoritative_media = 0u32;
    let mut total_media = 0u32;
    let mut has_doi = false;
    let mut has_publications = false;

    for a in html.select(anchor) {
        let Some(href) = a.value().attr("href") else {
            continue;
        };
        let Ok(link) = Url::parse(href) else {
            continue; // relative links cannot be outbound
        };
        let Some(host) = link.host_str() else {
            continue;
        };
        let host = host.to_lowercase();
        let text = a.text().collect::<String>().to_lowercase();

        if let Some(domain) = SCIENTIFIC_DOMAINS
            .iter()
            .find(|d| host == **d || host.ends_with(&format!(".{d}")))
        {
            scientific.insert((*domain).to_string());
        }

        let by_host = MEDIA_DOMAINS
            .iter()
            .any(|d| host == *d || host.ends_with(&format!(".{d}")));
        let by_text = MEDIA_TEXT_KEYWORDS.iter().any(|k| text.contains(k));
        if by_host || by_text {
            total_media += 1;
            // Allowlisted hostname OR media-keyword anchor text both count
            // as authoritative mentions.
            authoritative_media += 1;
        }

        if PUBLICATION_DOMAINS
            .iter()
            .any(|d| host == *d || host.ends_with(&format!(".{d}")))
        {
            has_publications = true;
        }
        if doi_regex().is_match(href) {
            has_doi = true;
        }
    }

    let text = page_text(html);
    if !has_doi {
        has_doi = doi_regex().is_match(&text);
    }

    let associations: Vec<String> = KNOWN_ASSOCIATIONS
        .iter()
        .filter(|k| text.contains(*k))
        .map(|k| k.to_string())
        .collect();

    let has_generic_association = associations.is_empty() && generic_association(&text);

    let mut scientific_domains: Vec<String> = scientific.into_iter().collect();
    scientific_domains.sort();

    AuthoritySignals {
        scientific_domains,
        authoritative_media_links: authoritative_media,
        total_media_links: total_media,
        has_doi_reference: has_doi,
        has_publication_links: has_publications,
        associations,
        has_generic_association,
    }
}

fn doi_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b10\.\d{4,9}/[-._;()/:a-zA-Z0-9]+").unwrap())
}

/// Fallback for associations not on the known list: "member of ..." phrasing.
fn generic_association(text: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"(член (ассоциации|общества)|member of the [a-z ]*(association|society))")
            .unwrap()
    });
    re.is_match(text)
}
