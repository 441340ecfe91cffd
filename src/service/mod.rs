//! Pipeline services: discovery, fetching, aggregation, scoring and the
//! orchestrator that ties them together.

pub mod aggregator;
pub mod audit;
pub mod discovery;
pub mod fetcher;
pub mod history;
pub mod http;
pub mod ratings;
pub mod recommend;
pub mod scoring;
pub mod trend;

pub use audit::SiteAuditor;
