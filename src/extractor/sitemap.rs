//! Sitemap and robots.txt parsing for page discovery.
//!
//! Handles both XML sitemaps (`<urlset>` and one level of `<sitemapindex>`)
//! and plain-text URL lists. Parsing is total: malformed input yields an
//! empty or partial URL list, never an error.

use quick_xml::events::Event;
use url::Url;

pub const SITEMAP_PATH: &str = "sitemap.xml";
pub const ROBOTS_PATH: &str = "robots.txt";
pub const LLMS_PATH: &str = "llms.txt";

/// What a fetched sitemap body turned out to contain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SitemapContent {
    /// Page URLs from a `<urlset>` or a plain-text list.
    Pages(Vec<Url>),
    /// Child sitemap URLs from a `<sitemapindex>`. Callers follow these at
    /// most one level deep.
    Index(Vec<Url>),
}

/// Parse a sitemap body of unknown format.
pub fn parse_sitemap(text: &str) -> SitemapContent {
    if text.contains("<loc>") {
        let urls = extract_loc_entries(text);
        if text.contains("<sitemapindex") {
            SitemapContent::Index(urls)
        } else {
            SitemapContent::Pages(urls)
        }
    } else {
        SitemapContent::Pages(extract_plain_text_urls(text))
    }
}

fn extract_loc_entries(text: &str) -> Vec<Url> {
    let mut reader = quick_xml::Reader::from_str(text);
    let mut urls = Vec::new();
    let mut buf = Vec::new();
    let mut in_loc = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"loc" => {
                in_loc = true;
            }
            Ok(Event::Text(e)) if in_loc => {
                match e.decode() {
                    Ok(txt) => {
                        if let Ok(url) = Url::parse(txt.trim()) {
                            urls.push(url);
                        }
                    }
                    Err(err) => {
                        log::debug!(
                            "[SITEMAP] Undecodable <loc> at {}: {}",
                            reader.buffer_position(),
                            err
                        );
                    }
                }
                in_loc = false;
            }
            Ok(Event::Eof) => break,
            Err(err) => {
                // Malformed XML: keep whatever was extracted so far.
                log::debug!("[SITEMAP] XML error, stopping early: {}", err);
                break;
            }
            _ => {}
        }
        buf.clear();
    }
    urls
}

fn extract_plain_text_urls(text: &str) -> Vec<Url> {
    text.split_whitespace()
        .filter_map(|token| Url::parse(token).ok())
        .filter(|u| matches!(u.scheme(), "http" | "https"))
        .collect()
}

/// Pull `Sitemap:` directives out of a robots.txt body.
pub fn sitemap_directives(robots_body: &str) -> Vec<Url> {
    robots_body
        .lines()
        .filter_map(|line| {
            let (key, value) = line.split_once(':')?;
            if key.trim().eq_ignore_ascii_case("sitemap") {
                Url::parse(value.trim()).ok()
            } else {
                None
            }
        })
        .collect()
}
