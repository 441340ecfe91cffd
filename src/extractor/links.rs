//! External-link health and image alt-text coverage.

use crate::domain::models::LinkSignals;
use scraper::{Html, Selector};
use std::sync::OnceLock;
use url::Url;

pub fn extract(html: &Html, base: &Url) -> LinkSignals {
    static ANCHOR: OnceLock<Selector> = OnceLock::new();
    let anchor = ANCHOR.get_or_init(|| Selector::parse("a[href]").unwrap());

    let base_host = base.host_str().map(str::to_lowercase);

    let mut external_total = 0u32;
    let mut external_dofollow = 0u32;

    for a in html.select(anchor) {
        let href = a.value().attr("href").unwrap_or("").trim();
        if href.is_empty()
            || href.starts_with('#')
            || href.starts_with("javascript:")
            || href.starts_with("mailto:")
            || href.starts_with("tel:")
        {
            continue;
        }
        let Ok(resolved) = base.join(href) else {
            continue;
        };
        let is_external = resolved.host_str().map(str::to_lowercase) != base_host;
        if !is_external {
            continue;
        }

        external_total += 1;
        let rel = a.value().attr("rel").unwrap_or("").to_lowercase();
        if !rel.contains("nofollow") {
            external_dofollow += 1;
        }
    }

    static IMG: OnceLock<Selector> = OnceLock::new();
    let img = IMG.get_or_init(|| Selector::parse("img").unwrap());

    let mut images_total = 0u32;
    let mut images_with_alt = 0u32;
    for el in html.select(img) {
        images_total += 1;
        if el
            .value()
            .attr("alt")
            .map(|a| !a.trim().is_empty())
            .unwrap_or(false)
        {
            images_with_alt += 1;
        }
    }

    LinkSignals {
        external_total,
        external_dofollow,
        images_total,
        images_with_alt,
    }
}
