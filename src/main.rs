//! Command-line entry point: run one audit and print the result as JSON.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tillit::domain::models::{AuditTarget, PageFilter, PageType};
use tillit::error::AuditError;
use tillit::service::history::JsonFileHistory;
use tillit::SiteAuditor;
use tracing_subscriber::EnvFilter;
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "tillit", version, about = "Website trust and technical SEO audit")]
struct Cli {
    /// Base URL of the site to audit
    url: Url,

    /// Maximum number of pages to analyze
    #[arg(long, default_value_t = 20)]
    max_pages: usize,

    /// Pages fetched concurrently within a batch
    #[arg(long, default_value_t = 4)]
    concurrency: usize,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 15)]
    timeout_secs: u64,

    /// Wall-clock bound for the whole fetch phase, in seconds
    #[arg(long)]
    deadline_secs: Option<u64>,

    /// Skip sitemap.xml during page discovery
    #[arg(long)]
    no_sitemap: bool,

    /// Skip robots.txt Sitemap: directives during page discovery
    #[arg(long)]
    no_robots: bool,

    /// Also collect internal links from the base page
    #[arg(long)]
    crawl_links: bool,

    /// Audit only pages of one type (blog, article, profile, other)
    #[arg(long, value_parser = parse_page_type)]
    page_type: Option<PageType>,

    /// Directory for audit history; enables trend reporting
    #[arg(long)]
    history_dir: Option<PathBuf>,
}

fn parse_page_type(s: &str) -> Result<PageType, String> {
    match s {
        "blog" => Ok(PageType::Blog),
        "article" => Ok(PageType::Article),
        "profile" => Ok(PageType::Profile),
        "other" => Ok(PageType::Other),
        _ => Err(format!(
            "unknown page type '{s}' (expected blog, article, profile or other)"
        )),
    }
}

impl Cli {
    fn into_target(self) -> (AuditTarget, Option<PathBuf>) {
        let mut target = AuditTarget::new(self.url);
        target.max_pages = self.max_pages;
        target.concurrency = self.concurrency;
        target.request_timeout = Duration::from_secs(self.timeout_secs);
        target.overall_deadline = self.deadline_secs.map(Duration::from_secs);
        target.use_sitemap = !self.no_sitemap;
        target.use_robots = !self.no_robots;
        target.crawl_internal_links = self.crawl_links;
        if let Some(page_type) = self.page_type {
            target.page_filter = PageFilter::Only(page_type);
        }
        (target, self.history_dir)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let (target, history_dir) = Cli::parse().into_target();

    let auditor = match SiteAuditor::new(target) {
        Ok(auditor) => auditor,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(1);
        }
    };
    let auditor = match history_dir {
        Some(dir) => auditor.with_history(Box::new(JsonFileHistory::new(dir))),
        None => auditor,
    };

    match auditor.run().await {
        Ok(result) => match serde_json::to_string_pretty(&result) {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("error: could not serialize result: {e}");
                ExitCode::from(1)
            }
        },
        Err(e @ AuditError::NoPagesAnalyzable { .. }) => {
            eprintln!("error: {e}");
            ExitCode::from(2)
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(1)
        }
    }
}
