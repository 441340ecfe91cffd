//! Transparency signals: policies, legal identity, contact surface, NAP.

use crate::domain::models::{NapData, TrustSignals};
use crate::extractor::page_text;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::OnceLock;
use url::Url;

const PRIVACY_HREF_HINTS: &[&str] = &["privacy", "politika", "personal-data", "confidential"];
const PRIVACY_TEXT_HINTS: &[&str] = &[
    "privacy policy",
    "политика конфиденциальности",
    "обработка персональных данных",
];

const LICENSE_KEYWORDS: &[&str] = &["лицензия", "license no", "лицензии", "medical license"];

const LEGAL_ENTITY_HINTS: &[&str] = &["ооо ", "ип ", "ао ", "llc", "ltd", "gmbh", "inc."];

const ABOUT_PATH_HINTS: &[&str] = &["/about", "/o-nas", "/o-klinike", "/about-us"];
const HISTORY_KEYWORDS: &[&str] = &["основан", "история", "founded", "since", "our history"];
const MISSION_KEYWORDS: &[&str] = &["миссия", "ценности", "mission", "values"];
const TEAM_KEYWORDS: &[&str] = &["команда", "наши врачи", "our team", "our doctors", "specialists"];

const BOOKING_HINTS: &[&str] = &[
    "запись на прием",
    "записаться",
    "book an appointment",
    "request appointment",
];

const MAP_EMBED_HINTS: &[&str] = &["google.com/maps", "yandex.ru/map", "2gis", "openstreetmap"];

pub fn extract(html: &Html, url: &Url) -> TrustSignals {
    let text = page_text(html);
    let is_about_page = {
        let path = url.path().to_lowercase();
        ABOUT_PATH_HINTS.iter().any(|h| path.contains(h))
    };

    TrustSignals {
        has_privacy_policy: has_privacy_policy(html),
        has_license_mention: LICENSE_KEYWORDS.iter().any(|k| text.contains(k)),
        has_legal_entity: LEGAL_ENTITY_HINTS.iter().any(|k| text.contains(k)),
        has_registration_number: has_registration_number(&text),
        is_about_page,
        // Sub-checks only make sense on the about page itself.
        about_has_history: is_about_page && HISTORY_KEYWORDS.iter().any(|k| text.contains(k)),
        about_has_mission: is_about_page && MISSION_KEYWORDS.iter().any(|k| text.contains(k)),
        about_has_team: is_about_page && TEAM_KEYWORDS.iter().any(|k| text.contains(k)),
        has_contact_email: has_contact_email(html, &text),
        has_booking_form: has_booking_form(html, &text),
        has_embedded_map: has_embedded_map(html),
        nap: extract_nap(html, &text),
    }
}

/// Privacy link is detected by href substring OR anchor text: union, so a
/// `/politika` link with a generic label still counts.
fn has_privacy_policy(html: &Html) -> bool {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    let selector = SELECTOR.get_or_init(|| Selector::parse("a[href]").unwrap());

    html.select(selector).any(|a| {
        let href = a.value().attr("href").unwrap_or("").to_lowercase();
        let text = a.text().collect::<String>().to_lowercase();
        PRIVACY_HREF_HINTS.iter().any(|h| href.contains(h))
            || PRIVACY_TEXT_HINTS.iter().any(|h| text.contains(h))
    })
}

/// Russian OGRN/INN style registration numbers, or an explicit "reg. no".
fn has_registration_number(text: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"(?x)(огрн|инн|ogrn|inn)\s*:?\s*\d{10,15} | (registration|reg\.)\s*(no|number)")
            .unwrap()
    });
    re.is_match(text)
}

fn has_contact_email(html: &Html, text: &str) -> bool {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    let selector = SELECTOR.get_or_init(|| Selector::parse("a[href^='mailto:']").unwrap());
    if html.select(selector).next().is_some() {
        return true;
    }

    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}").unwrap()
    });
    re.is_match(text)
}

fn has_booking_form(html: &Html, text: &str) -> bool {
    static FORM: OnceLock<Selector> = OnceLock::new();
    let form = FORM.get_or_init(|| Selector::parse("form").unwrap());

    let has_form = html.select(form).next().is_some();
    let has_booking_words = BOOKING_HINTS.iter().any(|k| text.contains(k));
    has_form && has_booking_words
}

fn has_embedded_map(html: &Html) -> bool {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    let selector = SELECTOR.get_or_init(|| Selector::parse("iframe[src], script[src]").unwrap());

    html.select(selector).any(|el| {
        let src = el.value().attr("src").unwrap_or("").to_lowercase();
        MAP_EMBED_HINTS.iter().any(|h| src.contains(h))
    })
}

/// NAP via structured-data/microdata selectors first, text regex fallback
/// for the phone.
fn extract_nap(html: &Html, text: &str) -> Option<NapData> {
    static NAME: OnceLock<Selector> = OnceLock::new();
    static ADDRESS: OnceLock<Selector> = OnceLock::new();
    static PHONE: OnceLock<Selector> = OnceLock::new();

    let name_sel = NAME.get_or_init(|| Selector::parse("[itemprop='name']").unwrap());
    let addr_sel =
        ADDRESS.get_or_init(|| Selector::parse("[itemprop='address'], address").unwrap());
    let phone_sel =
        PHONE.get_or_init(|| Selector::parse("[itemprop='telephone'], a[href^='tel:']").unwrap());

    let grab = |sel: &Selector| -> Option<String> {
        html.select(sel)
            .next()
            .map(|el| {
                el.text()
                    .collect::<String>()
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .filter(|s| !s.is_empty())
    };

    let name = grab(name_sel);
    let address = grab(addr_sel);
    let phone = grab(phone_sel).or_else(|| phone_from_text(text));

    let nap = NapData {
        name,
        address,
        phone,
    };
    (!nap.is_empty()).then_some(nap)
}

fn phone_from_text(text: &str) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"(\+?\d[\d\s\-\(\)]{8,16}\d)").unwrap()
    });
    re.find(text).map(|m| m.as_str().trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(body: &str) -> Html {
        Html::parse_document(&format!("<html><body>{body}</body></html>"))
    }

    fn url(path: &str) -> Url {
        Url::parse(&format!("https://clinic.example{path}")).unwrap()
    }

    #[test]
    fn privacy_detected_by_href_or_text() {
        let by_href = doc(r#"<a href="/politika">Документы</a>"#);
        assert!(extract(&by_href, &url("/")).has_privacy_policy);

        let by_text = doc(r#"<a href="/docs/7">Политика конфиденциальности</a>"#);
        assert!(extract(&by_text, &url("/")).has_privacy_policy);

        let neither = doc(r#"<a href="/docs/7">Документы</a>"#);
        assert!(!extract(&neither, &url("/")).has_privacy_policy);
    }

    #[test]
    fn about_subchecks_only_on_about_page() {
        let body = "<p>Клиника основана в 2005. Наша миссия — помощь. Команда из 30 врачей.</p>";
        let on_about = extract(&doc(body), &url("/about"));
        assert!(on_about.is_about_page);
        assert!(on_about.about_has_history);
        assert!(on_about.about_has_mission);
        assert!(on_about.about_has_team);

        let elsewhere = extract(&doc(body), &url("/services"));
        assert!(!elsewhere.is_about_page);
        assert!(!elsewhere.about_has_history, "sub-checks gated to the about page");
    }

    #[test]
    fn contact_email_mailto_or_regex() {
        let mailto = doc(r#"<a href="mailto:info@clinic.example">почта</a>"#);
        assert!(extract(&mailto, &url("/")).has_contact_email);

        let plain = doc("<p>Пишите: info@clinic.example</p>");
        assert!(extract(&plain, &url("/")).has_contact_email);

        let none = doc("<p>Звоните нам</p>");
        assert!(!extract(&none, &url("/")).has_contact_email);
    }

    #[test]
    fn booking_needs_form_and_keywords() {
        let both = doc("<form><input></form><p>Запись на прием онлайн</p>");
        assert!(extract(&both, &url("/")).has_booking_form);

        let form_only = doc("<form><input></form>");
        assert!(!extract(&form_only, &url("/")).has_booking_form);
    }

    #[test]
    fn nap_from_microdata_with_phone_fallback() {
        let html = doc(
            r#"<span itemprop="name">Clinic One</span>
               <div itemprop="address">Москва, ул. Ленина 1</div>
               <p>Телефон: +7 (495) 123-45-67</p>"#,
        );
        let nap = extract(&html, &url("/contacts")).nap.expect("nap present");
        assert_eq!(nap.name.as_deref(), Some("Clinic One"));
        assert!(nap.address.as_deref().unwrap().contains("Ленина"));
        assert!(nap.phone.as_deref().unwrap().contains("495"));
    }

    #[test]
    fn nap_absent_when_nothing_found() {
        let html = doc("<p>ничего</p>");
        assert!(extract(&html, &url("/")).nap.is_none());
    }

    #[test]
    fn legal_entity_and_registration() {
        let html = doc("<footer>ООО «Клиника», ОГРН 1157746000000</footer>");
        let s = extract(&html, &url("/"));
        assert!(s.has_legal_entity);
        assert!(s.has_registration_number);
    }
}
