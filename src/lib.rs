//! Website trust and technical SEO auditing.
//!
//! The pipeline discovers a bounded set of pages for a site, fetches and
//! analyzes them with bounded concurrency, aggregates per-page signals into
//! site-level metrics, scores ten weighted categories, derives actionable
//! recommendations and, when a history store is configured, reports score
//! movement against the previous audit.

pub mod domain;
pub mod error;
pub mod extractor;
pub mod service;

pub use domain::models::{AuditResult, AuditTarget};
pub use error::{AuditError, Result};
pub use service::SiteAuditor;
