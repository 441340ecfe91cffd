//! Page discovery and site-level resource probing.
//!
//! Discovery unions the base URL, sitemap entries, robots.txt `Sitemap:`
//! directives and (optionally) internal links from the base page, then
//! dedups, filters by page type and truncates to `max_pages` preserving
//! discovery order. Every source failure is non-fatal: the source simply
//! contributes nothing.

use crate::domain::models::{AuditTarget, DiscoveredPage, PageType, SiteFiles};
use crate::error::Result;
use crate::extractor::sitemap::{self, parse_sitemap, SitemapContent};
use crate::service::http::{create_client, create_probe_client};
use reqwest::Client;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::OnceLock;
use std::time::Duration;
use url::Url;

/// Cap on internal links collected from the base page.
const INTERNAL_LINK_CAP: usize = 100;

pub struct PageDiscovery {
    client: Client,
}

impl PageDiscovery {
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: create_client(timeout)?,
        })
    }

    /// Resolve the audit target into a bounded, deduplicated page list.
    /// Base URL always comes first.
    pub async fn discover(&self, target: &AuditTarget) -> Vec<DiscoveredPage> {
        log::info!("[DISCOVERY] Starting discovery for {}", target.base_url);

        let mut seen: HashSet<String> = HashSet::new();
        let mut ordered: Vec<Url> = Vec::new();
        let mut push = |url: Url, seen: &mut HashSet<String>, ordered: &mut Vec<Url>| {
            let mut url = url;
            url.set_fragment(None);
            if seen.insert(url.as_str().to_string()) {
                ordered.push(url);
            }
        };

        push(target.base_url.clone(), &mut seen, &mut ordered);

        if target.use_sitemap {
            if let Ok(sitemap_url) = target.base_url.join(sitemap::SITEMAP_PATH) {
                for url in self.sitemap_pages(sitemap_url, true).await {
                    push(url, &mut seen, &mut ordered);
                }
            }
        }

        if target.use_robots {
            for sitemap_url in self.robots_sitemaps(&target.base_url).await {
                // Directives already point at sitemaps; do not recurse past
                // one index level from here either.
                for url in self.sitemap_pages(sitemap_url, true).await {
                    push(url, &mut seen, &mut ordered);
                }
            }
        }

        if target.crawl_internal_links {
            for url in self.internal_links(&target.base_url).await {
                push(url, &mut seen, &mut ordered);
            }
        }

        let pages: Vec<DiscoveredPage> = ordered
            .into_iter()
            .map(|url| {
                let page_type = PageType::classify(&url);
                DiscoveredPage { url, page_type }
            })
            .filter(|p| p.url == target.base_url || target.page_filter.matches(p.page_type))
            .take(target.max_pages)
            .collect();

        log::info!(
            "[DISCOVERY] Complete - {} pages (cap {})",
            pages.len(),
            target.max_pages
        );
        pages
    }

    /// Fetch and parse one sitemap. `follow_index` allows exactly one level
    /// of `<sitemapindex>` recursion.
    async fn sitemap_pages(&self, sitemap_url: Url, follow_index: bool) -> Vec<Url> {
        let Some(body) = self.fetch_text(&sitemap_url).await else {
            return Vec::new();
        };

        match parse_sitemap(&body) {
            SitemapContent::Pages(urls) => urls,
            SitemapContent::Index(children) if follow_index => {
                let mut pages = Vec::new();
                for child in children {
                    let Some(child_body) = self.fetch_text(&child).await else {
                        continue;
                    };
                    match parse_sitemap(&child_body) {
                        SitemapContent::Pages(urls) => pages.extend(urls),
                        // One level only: a nested index contributes nothing.
                        SitemapContent::Index(_) => {
                            log::debug!("[DISCOVERY] Nested sitemap index at {}, not following", child);
                        }
                    }
                }
                pages
            }
            SitemapContent::Index(_) => {
                log::debug!("[DISCOVERY] Nested sitemap index at {}, not following", sitemap_url);
                Vec::new()
            }
        }
    }

    async fn robots_sitemaps(&self, base: &Url) -> Vec<Url> {
        let Ok(robots_url) = base.join(sitemap::ROBOTS_PATH) else {
            return Vec::new();
        };
        match self.fetch_text(&robots_url).await {
            Some(body) => sitemap::sitemap_directives(&body),
            None => Vec::new(),
        }
    }

    /// Same-host anchor targets from the base page, fragments stripped.
    async fn internal_links(&self, base: &Url) -> Vec<Url> {
        let Some(body) = self.fetch_text(base).await else {
            return Vec::new();
        };

        static SELECTOR: OnceLock<Selector> = OnceLock::new();
        let selector = SELECTOR.get_or_init(|| Selector::parse("a[href]").unwrap());

        let html = Html::parse_document(&body);
        html.select(selector)
            .filter_map(|a| a.value().attr("href"))
            .filter(|raw| !raw.starts_with('#'))
            .filter_map(|raw| base.join(raw).ok())
            .filter(|link| link.host_str() == base.host_str() && link.port() == base.port())
            .map(|mut link| {
                link.set_fragment(None);
                link
            })
            .take(INTERNAL_LINK_CAP)
            .collect()
    }

    /// Best-effort text fetch: any failure (network, non-2xx, body decode)
    /// degrades the source to "no contribution".
    async fn fetch_text(&self, url: &Url) -> Option<String> {
        let response = match self.client.get(url.as_str()).send().await {
            Ok(r) => r,
            Err(e) => {
                log::debug!("[DISCOVERY] Fetch failed for {}: {}", url, e);
                return None;
            }
        };
        if !response.status().is_success() {
            log::debug!("[DISCOVERY] {} returned {}", url, response.status());
            return None;
        }
        match response.text().await {
            Ok(body) => Some(body),
            Err(e) => {
                log::debug!("[DISCOVERY] Body read failed for {}: {}", url, e);
                None
            }
        }
    }
}

/// Once-per-audit probes for well-known files, HTTPS and duplicate-content
/// redirect consistency.
pub struct SiteProbe {
    client: Client,
    probe_client: Client,
}

impl SiteProbe {
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: create_client(timeout)?,
            probe_client: create_probe_client(timeout)?,
        })
    }

    pub async fn probe(&self, base: &Url) -> SiteFiles {
        SiteFiles {
            https: base.scheme() == "https",
            robots_txt_found: self.resource_exists(base, sitemap::ROBOTS_PATH).await,
            sitemap_found: self.resource_exists(base, sitemap::SITEMAP_PATH).await,
            llms_txt_found: self.resource_exists(base, sitemap::LLMS_PATH).await,
            redirects_consistent: self.check_redirects(base).await,
        }
    }

    /// 2xx means found; 401/403 counts as found-but-protected.
    async fn resource_exists(&self, base: &Url, path: &str) -> bool {
        let Ok(url) = base.join(path) else {
            return false;
        };
        match self.client.get(url.clone()).send().await {
            Ok(response) => {
                let status = response.status();
                let exists = status.is_success()
                    || status == reqwest::StatusCode::UNAUTHORIZED
                    || status == reqwest::StatusCode::FORBIDDEN;
                log::debug!("[PROBE] {} -> {} (found: {})", url, status, exists);
                exists
            }
            Err(e) => {
                log::debug!("[PROBE] {} unreachable: {}", url, e);
                false
            }
        }
    }

    /// The http:// and www variants of an https site should redirect to the
    /// canonical origin; serving content on several origins is a
    /// duplicate-content risk. `None` when no variant probe could run
    /// (http-only site, unreachable variants).
    async fn check_redirects(&self, base: &Url) -> Option<bool> {
        if base.scheme() != "https" {
            return None;
        }

        let mut variants = Vec::new();
        let mut http_variant = base.clone();
        if http_variant.set_scheme("http").is_ok() {
            variants.push(http_variant);
        }
        if let Some(host) = base.host_str() {
            if !host.starts_with("www.") {
                let mut www_variant = base.clone();
                if www_variant.set_host(Some(&format!("www.{host}"))).is_ok() {
                    variants.push(www_variant);
                }
            }
        }

        let mut probed = false;
        let mut consistent = true;
        for variant in variants {
            match self.probe_client.get(variant.as_str()).send().await {
                Ok(response) => {
                    let redirects = response.status().is_redirection();
                    log::debug!(
                        "[PROBE] {} -> {} (redirects: {})",
                        variant,
                        response.status(),
                        redirects
                    );
                    probed = true;
                    consistent &= redirects;
                }
                Err(e) => {
                    // A variant that does not resolve at all cannot serve
                    // duplicate content; skip it.
                    log::debug!("[PROBE] Redirect probe for {} failed: {}", variant, e);
                }
            }
        }
        probed.then_some(consistent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::PageFilter;

    fn target(base: &str) -> AuditTarget {
        AuditTarget::new(Url::parse(base).unwrap())
    }

    #[tokio::test]
    async fn base_url_always_first_even_when_everything_fails() {
        let mut server = mockito::Server::new_async().await;
        let _sitemap = server
            .mock("GET", "/sitemap.xml")
            .with_status(404)
            .create_async()
            .await;
        let _robots = server
            .mock("GET", "/robots.txt")
            .with_status(500)
            .create_async()
            .await;

        let discovery = PageDiscovery::new(Duration::from_secs(2)).unwrap();
        let pages = discovery.discover(&target(&server.url())).await;

        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].url.as_str(), format!("{}/", server.url()));
    }

    #[tokio::test]
    async fn sitemap_and_robots_union_deduplicated() {
        let mut server = mockito::Server::new_async().await;
        let base = server.url();

        let _sitemap = server
            .mock("GET", "/sitemap.xml")
            .with_status(200)
            .with_body(format!(
                "<urlset><url><loc>{base}/a</loc></url><url><loc>{base}/b</loc></url></urlset>"
            ))
            .create_async()
            .await;
        let _robots = server
            .mock("GET", "/robots.txt")
            .with_status(200)
            .with_body(format!("User-agent: *\nSitemap: {base}/sitemap-news.xml\n"))
            .create_async()
            .await;
        // robots-referenced sitemap repeats /a and adds /c
        let _news = server
            .mock("GET", "/sitemap-news.xml")
            .with_status(200)
            .with_body(format!(
                "<urlset><url><loc>{base}/a</loc></url><url><loc>{base}/c</loc></url></urlset>"
            ))
            .create_async()
            .await;

        let discovery = PageDiscovery::new(Duration::from_secs(2)).unwrap();
        let pages = discovery.discover(&target(&base)).await;

        let paths: Vec<&str> = pages.iter().map(|p| p.url.path()).collect();
        assert_eq!(paths, vec!["/", "/a", "/b", "/c"]);
    }

    #[tokio::test]
    async fn sitemap_index_followed_one_level() {
        let mut server = mockito::Server::new_async().await;
        let base = server.url();

        let _index = server
            .mock("GET", "/sitemap.xml")
            .with_status(200)
            .with_body(format!(
                "<sitemapindex><sitemap><loc>{base}/sm-1.xml</loc></sitemap></sitemapindex>"
            ))
            .create_async()
            .await;
        // Child is itself an index: must NOT be followed further.
        let _child = server
            .mock("GET", "/sm-1.xml")
            .with_status(200)
            .with_body(format!(
                "<sitemapindex><sitemap><loc>{base}/sm-2.xml</loc></sitemap></sitemapindex>"
            ))
            .create_async()
            .await;
        let _robots = server
            .mock("GET", "/robots.txt")
            .with_status(404)
            .create_async()
            .await;

        let discovery = PageDiscovery::new(Duration::from_secs(2)).unwrap();
        let pages = discovery.discover(&target(&base)).await;

        // Only the base URL: the nested index contributed nothing.
        assert_eq!(pages.len(), 1);
    }

    #[tokio::test]
    async fn max_pages_cap_and_no_duplicates() {
        let mut server = mockito::Server::new_async().await;
        let base = server.url();

        let body: String = (0..50)
            .map(|i| format!("<url><loc>{base}/p{i}</loc></url>"))
            .collect();
        let _sitemap = server
            .mock("GET", "/sitemap.xml")
            .with_status(200)
            .with_body(format!("<urlset>{body}</urlset>"))
            .create_async()
            .await;
        let _robots = server
            .mock("GET", "/robots.txt")
            .with_status(404)
            .create_async()
            .await;

        let mut t = target(&base);
        t.max_pages = 10;
        let discovery = PageDiscovery::new(Duration::from_secs(2)).unwrap();
        let pages = discovery.discover(&t).await;

        assert_eq!(pages.len(), 10);
        let unique: HashSet<&str> = pages.iter().map(|p| p.url.as_str()).collect();
        assert_eq!(unique.len(), pages.len());
    }

    #[tokio::test]
    async fn page_filter_keeps_base_url() {
        let mut server = mockito::Server::new_async().await;
        let base = server.url();

        let _sitemap = server
            .mock("GET", "/sitemap.xml")
            .with_status(200)
            .with_body(format!(
                "<urlset><url><loc>{base}/blog/a</loc></url><url><loc>{base}/prices</loc></url></urlset>"
            ))
            .create_async()
            .await;
        let _robots = server
            .mock("GET", "/robots.txt")
            .with_status(404)
            .create_async()
            .await;

        let mut t = target(&base);
        t.page_filter = PageFilter::Only(PageType::Blog);
        let discovery = PageDiscovery::new(Duration::from_secs(2)).unwrap();
        let pages = discovery.discover(&t).await;

        let paths: Vec<&str> = pages.iter().map(|p| p.url.path()).collect();
        assert_eq!(paths, vec!["/", "/blog/a"]);
    }

    #[tokio::test]
    async fn internal_links_from_base_page() {
        let mut server = mockito::Server::new_async().await;
        let base = server.url();

        let _home = server
            .mock("GET", "/")
            .with_status(200)
            .with_body(
                r#"<html><body>
                    <a href="/services">Services</a>
                    <a href="/services#prices">Prices anchor</a>
                    <a href="https://external.example/x">External</a>
                </body></html>"#,
            )
            .create_async()
            .await;
        let _sitemap = server
            .mock("GET", "/sitemap.xml")
            .with_status(404)
            .create_async()
            .await;
        let _robots = server
            .mock("GET", "/robots.txt")
            .with_status(404)
            .create_async()
            .await;

        let mut t = target(&base);
        t.crawl_internal_links = true;
        let discovery = PageDiscovery::new(Duration::from_secs(2)).unwrap();
        let pages = discovery.discover(&t).await;

        let paths: Vec<&str> = pages.iter().map(|p| p.url.path()).collect();
        // Fragment variant dedups with /services; external link dropped.
        assert_eq!(paths, vec!["/", "/services"]);
    }

    #[tokio::test]
    async fn probe_reports_found_and_missing_files() {
        let mut server = mockito::Server::new_async().await;
        let _robots = server
            .mock("GET", "/robots.txt")
            .with_status(200)
            .with_body("User-agent: *")
            .create_async()
            .await;
        let _sitemap = server
            .mock("GET", "/sitemap.xml")
            .with_status(401)
            .create_async()
            .await;
        let _llms = server
            .mock("GET", "/llms.txt")
            .with_status(404)
            .create_async()
            .await;

        let probe = SiteProbe::new(Duration::from_secs(2)).unwrap();
        let base = Url::parse(&server.url()).unwrap();
        let files = probe.probe(&base).await;

        assert!(files.robots_txt_found);
        assert!(files.sitemap_found, "401 still means the file exists");
        assert!(!files.llms_txt_found);
        assert!(!files.https, "mockito serves plain http");
        assert!(files.redirects_consistent.is_none(), "no probe for http sites");
    }
}
