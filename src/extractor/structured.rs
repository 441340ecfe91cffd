//! Structured-data detection across the eight schema.org types the audit
//! recognises. JSON-LD blocks first, microdata `itemtype` as fallback.

use crate::domain::models::{SchemaType, StructuredDataSignals};
use scraper::{Html, Selector};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::OnceLock;

pub fn extract(html: &Html) -> StructuredDataSignals {
    let mut found: HashSet<SchemaType> = HashSet::new();

    static LD: OnceLock<Selector> = OnceLock::new();
    let ld = LD.get_or_init(|| Selector::parse("script[type='application/ld+json']").unwrap());

    for script in html.select(ld) {
        let raw = script.text().collect::<String>();
        // Malformed JSON-LD is common; skip the block, keep the page.
        if let Ok(value) = serde_json::from_str::<Value>(&raw) {
            collect_types(&value, &mut found);
        }
    }

    static MICRO: OnceLock<Selector> = OnceLock::new();
    let micro = MICRO.get_or_init(|| Selector::parse("[itemtype]").unwrap());
    for el in html.select(micro) {
        if let Some(itemtype) = el.value().attr("itemtype") {
            if let Some(t) = map_type(itemtype) {
                found.insert(t);
            }
        }
    }

    let mut types_present: Vec<SchemaType> = found.into_iter().collect();
    types_present.sort_by_key(|t| format!("{t:?}"));
    StructuredDataSignals { types_present }
}

/// Walk a JSON-LD value: handle top-level arrays, `@graph`, and `@type`
/// given as either a string or an array.
fn collect_types(value: &Value, found: &mut HashSet<SchemaType>) {
    match value {
        Value::Array(items) => {
            for item in items {
                collect_types(item, found);
            }
        }
        Value::Object(map) => {
            if let Some(t) = map.get("@type") {
                match t {
                    Value::String(s) => {
                        if let Some(mapped) = map_type(s) {
                            found.insert(mapped);
                        }
                    }
                    Value::Array(names) => {
                        for name in names.iter().filter_map(|v| v.as_str()) {
                            if let Some(mapped) = map_type(name) {
                                found.insert(mapped);
                            }
                        }
                    }
                    _ => {}
                }
            }
            if let Some(graph) = map.get("@graph") {
                collect_types(graph, found);
            }
        }
        _ => {}
    }
}

fn map_type(name: &str) -> Option<SchemaType> {
    // Microdata itemtype comes as a full schema.org URL.
    let name = name.rsplit('/').next().unwrap_or(name);
    let t = match name {
        "Organization" => SchemaType::Organization,
        "LocalBusiness" | "MedicalClinic" | "MedicalOrganization" => SchemaType::LocalBusiness,
        "Person" | "Physician" => SchemaType::Person,
        "Article" | "BlogPosting" | "NewsArticle" | "MedicalWebPage" => SchemaType::Article,
        "FAQPage" => SchemaType::FaqPage,
        "BreadcrumbList" => SchemaType::BreadcrumbList,
        "Review" | "AggregateRating" => SchemaType::Review,
        "MedicalProcedure" | "Service" => SchemaType::MedicalProcedure,
        _ => return None,
    };
    Some(t)
}
