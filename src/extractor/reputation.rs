//! Reputation surface: outbound links to review platforms and social
//! profiles. Rating values are never scraped here; they come from the
//! external lookup collaborators.

use crate::domain::models::{PlatformLink, ReputationSignals};
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::OnceLock;

/// href substring → platform label.
const PLATFORM_HINTS: &[(&str, &str)] = &[
    ("google.com/maps", "google"),
    ("g.page", "google"),
    ("yandex.ru/maps", "yandex"),
    ("2gis.ru", "2gis"),
    ("prodoctorov.ru", "prodoctorov"),
    ("zoon.ru", "zoon"),
    ("vk.com", "vk"),
    ("t.me", "telegram"),
    ("wa.me", "whatsapp"),
    ("instagram.com", "instagram"),
    ("youtube.com", "youtube"),
];

pub fn extract(html: &Html) -> ReputationSignals {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    let selector = SELECTOR.get_or_init(|| Selector::parse("a[href]").unwrap());

    let mut seen = HashSet::new();
    let mut platform_links = Vec::new();

    for a in html.select(selector) {
        let href = a.value().attr("href").unwrap_or("");
        let href_lower = href.to_lowercase();
        for (hint, platform) in PLATFORM_HINTS {
            if href_lower.contains(hint) && seen.insert(*platform) {
                platform_links.push(PlatformLink {
                    platform: (*platform).to_string(),
                    url: href.to_string(),
                });
                break;
            }
        }
    }

    ReputationSignals { platform_links }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_hrefs_to_platform_labels() {
        let html = Html::parse_document(
            r#"<html><body>
                <a href="https://yandex.ru/maps/org/123">Яндекс Карты</a>
                <a href="https://prodoctorov.ru/moskva/lpu/456">отзывы</a>
                <a href="https://t.me/clinic">Telegram</a>
            </body></html>"#,
        );
        let s = extract(&html);
        let platforms: Vec<&str> = s.platform_links.iter().map(|p| p.platform.as_str()).collect();
        assert_eq!(platforms, vec!["yandex", "prodoctorov", "telegram"]);
    }

    #[test]
    fn one_entry_per_platform() {
        let html = Html::parse_document(
            r#"<html><body>
                <a href="https://vk.com/clinic">VK</a>
                <a href="https://vk.com/clinic?w=wall-1">VK post</a>
            </body></html>"#,
        );
        assert_eq!(extract(&html).platform_links.len(), 1);
    }

    #[test]
    fn empty_when_no_platforms() {
        let html = Html::parse_document("<html><body><a href='/inner'>x</a></body></html>");
        assert!(extract(&html).platform_links.is_empty());
    }
}
