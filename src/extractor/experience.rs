//! Case-study signals: structural completeness over seven expected sections
//! and a conservative PII-compliance check.
//!
//! The PII heuristics only flag a match when patient-context keywords appear
//! near it, so staff names and clinic contact data do not count against
//! compliance.

use crate::domain::models::ExperienceSignals;
use crate::extractor::page_text;
use regex::Regex;
use scraper::Html;
use std::sync::OnceLock;
use url::Url;

const CASE_PATH_HINTS: &[&str] = &["/case", "/cases", "/klinicheskie-sluchai", "/results/"];
const CASE_TEXT_HINTS: &[&str] = &["клинический случай", "история пациента", "case study", "patient story"];

/// The seven expected sections, each recognised by any of its keywords.
const SECTIONS: [(&str, &[&str]); 7] = [
    ("complaint", &["жалоб", "обратил", "complaint", "presented with"]),
    ("diagnosis", &["диагноз", "обследовани", "diagnosis"]),
    ("treatment", &["лечени", "операци", "терапи", "treatment", "procedure"]),
    ("result", &["результат", "выздоров", "result", "outcome"]),
    ("timeline", &["через", "недел", "месяц", "after", "weeks", "months"]),
    ("metrics", &["показател", "анализ", "мм рт", "metrics", "measurements"]),
    ("doctor_commentary", &["комментарий врача", "мнение врача", "врач отмечает", "doctor's comment", "physician notes"]),
];

const PATIENT_CONTEXT: &[&str] = &["пациент", "пациентк", "болел", "обратилась", "обратился", "patient"];

pub fn extract(html: &Html, url: &Url) -> ExperienceSignals {
    let text = page_text(html);
    let path = url.path().to_lowercase();

    let is_case_study = CASE_PATH_HINTS.iter().any(|h| path.contains(h))
        || CASE_TEXT_HINTS.iter().any(|h| text.contains(h));

    if !is_case_study {
        return ExperienceSignals::default();
    }

    let sections_present = SECTIONS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|k| text.contains(k)))
        .count() as u8;
    let completeness_percent = ((sections_present as f64 / 7.0) * 100.0).round() as u8;

    ExperienceSignals {
        is_case_study: true,
        sections_present,
        completeness_percent,
        pii_flags: pii_flags(&text),
    }
}

fn pii_flags(text: &str) -> Vec<String> {
    let mut flags = Vec::new();

    // Full name: two capitalised words is too noisy on lowercased text, so
    // match the Russian "Имя Отчествовна/вич" patronymic shape and explicit
    // first+last with a trailing patronymic suffix.
    static NAME_RE: OnceLock<Regex> = OnceLock::new();
    let name_re = NAME_RE.get_or_init(|| {
        Regex::new(r"[а-яё]+\s[а-яё]+(вич|вна|чна)\b").unwrap()
    });

    static ADDRESS_RE: OnceLock<Regex> = OnceLock::new();
    let address_re = ADDRESS_RE.get_or_init(|| {
        Regex::new(r"(ул\.|улица|просп|пер\.)\s*[а-яё]+[^,]{0,20},?\s*д(ом)?\.?\s*\d+").unwrap()
    });

    static PHONE_RE: OnceLock<Regex> = OnceLock::new();
    let phone_re = PHONE_RE.get_or_init(|| {
        Regex::new(r"\+?\d[\d\s\-\(\)]{8,16}\d").unwrap()
    });

    for (label, re) in [
        ("patient full name", name_re),
        ("patient address", address_re),
        ("patient phone number", phone_re),
    ] {
        for m in re.find_iter(text) {
            if has_patient_context(text, m.start()) {
                flags.push(format!("{label}: {}", m.as_str().trim()));
                break; // one flag per kind is enough
            }
        }
    }
    flags
}

/// A match only counts when a patient-context keyword appears within a
/// window around it.
fn has_patient_context(text: &str, pos: usize) -> bool {
    const WINDOW: usize = 120;
    let start = pos.saturating_sub(WINDOW);
    let end = (pos + WINDOW).min(text.len());
    // Clamp to char boundaries.
    let start = (start..=pos).find(|i| text.is_char_boundary(*i)).unwrap_or(pos);
    let end = (end..text.len())
        .find(|i| text.is_char_boundary(*i))
        .unwrap_or(text.len());
    let window = &text[start..end];
    PATIENT_CONTEXT.iter().any(|k| window.contains(k))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(body: &str) -> Html {
        Html::parse_document(&format!("<html><body>{body}</body></html>"))
    }

    fn case_url() -> Url {
        Url::parse("https://clinic.example/cases/42").unwrap()
    }

    #[test]
    fn non_case_page_is_default() {
        let s = extract(
            &doc("<p>Прайс-лист на услуги</p>"),
            &Url::parse("https://clinic.example/prices").unwrap(),
        );
        assert!(!s.is_case_study);
        assert_eq!(s.completeness_percent, 0);
    }

    #[test]
    fn detected_by_text_hint_on_other_path() {
        let s = extract(
            &doc("<h1>Клинический случай: лечение</h1>"),
            &Url::parse("https://clinic.example/blog/story").unwrap(),
        );
        assert!(s.is_case_study);
    }

    #[test]
    fn completeness_counts_sections() {
        let s = extract(
            &doc(
                "<p>Пациент обратился с жалобами на боль. Диагноз: артроз. \
                 Лечение: операция. Результат: выздоровление через 3 месяца.</p>",
            ),
            &case_url(),
        );
        assert!(s.is_case_study);
        // complaint, diagnosis, treatment, result, timeline = 5 of 7
        assert_eq!(s.sections_present, 5);
        assert_eq!(s.completeness_percent, 71);
    }

    #[test]
    fn pii_name_flagged_only_with_patient_context() {
        let with_context = extract(
            &doc("<p>Пациентка Иванова Анна Сергеевна обратилась с жалобами.</p>"),
            &case_url(),
        );
        assert!(!with_context.pii_compliant());

        let staff_only = extract(
            &doc("<p>Оперировал Петров Иван Сергеевич, главный врач.</p>"),
            &case_url(),
        );
        assert!(staff_only.pii_compliant(), "staff names are not patient PII");
    }

    #[test]
    fn pii_phone_in_patient_context() {
        let s = extract(
            &doc("<p>Пациент оставил телефон +7 926 123-45-67 для связи.</p>"),
            &case_url(),
        );
        assert!(s.pii_flags.iter().any(|f| f.starts_with("patient phone")));
    }
}
