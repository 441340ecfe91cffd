//! Bounded-concurrency fetch & extract.
//!
//! Pages are processed in sequential batches of at most `concurrency`;
//! within a batch all fetches run concurrently. Each fetch carries its own
//! deadline, and one page's failure never blocks siblings or later batches.
//! Extraction is synchronous and happens on the fetched body inside the
//! page's own task, so no parsed document ever crosses an await point.

use crate::domain::models::{DiscoveredPage, FetchErrorKind, FetchOutcome, SpeedSignals};
use crate::error::Result;
use crate::extractor::extract_page;
use crate::service::http::create_client;
use futures::future::join_all;
use reqwest::Client;
use scraper::Html;
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

pub struct PageFetcher {
    client: Client,
    concurrency: usize,
    timeout: Duration,
}

impl PageFetcher {
    pub fn new(concurrency: usize, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: create_client(timeout)?,
            concurrency: concurrency.max(1),
            timeout,
        })
    }

    /// Produce exactly one outcome per input page. If `deadline` elapses
    /// between batches, the remaining pages are recorded as timed out so the
    /// audit can complete on the partial work instead of discarding it.
    pub async fn run(
        &self,
        pages: &[DiscoveredPage],
        deadline: Option<Instant>,
    ) -> Vec<FetchOutcome> {
        let mut outcomes: Vec<FetchOutcome> = Vec::with_capacity(pages.len());
        let total_batches = pages.len().div_ceil(self.concurrency);

        for (batch_idx, batch) in pages.chunks(self.concurrency).enumerate() {
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    log::warn!(
                        "[FETCH] Overall deadline reached before batch {}/{}; marking {} pages as timed out",
                        batch_idx + 1,
                        total_batches,
                        pages.len() - outcomes.len()
                    );
                    for page in &pages[outcomes.len()..] {
                        outcomes.push(FetchOutcome::Failed {
                            url: page.url.clone(),
                            error: FetchErrorKind::Timeout,
                        });
                    }
                    break;
                }
            }

            log::debug!(
                "[FETCH] Batch {}/{} ({} pages)",
                batch_idx + 1,
                total_batches,
                batch.len()
            );
            let batch_outcomes = join_all(batch.iter().map(|page| self.fetch_one(page))).await;
            outcomes.extend(batch_outcomes);
        }

        let succeeded = outcomes.iter().filter(|o| o.signals().is_some()).count();
        log::info!(
            "[FETCH] Complete - {}/{} pages analyzed",
            succeeded,
            outcomes.len()
        );
        outcomes
    }

    async fn fetch_one(&self, page: &DiscoveredPage) -> FetchOutcome {
        let url = page.url.clone();
        let started = Instant::now();

        let response = match tokio::time::timeout(
            self.timeout,
            self.client.get(url.as_str()).send(),
        )
        .await
        {
            Err(_) => {
                log::debug!("[FETCH] Timeout: {}", url);
                return FetchOutcome::Failed {
                    url,
                    error: FetchErrorKind::Timeout,
                };
            }
            Ok(Err(e)) => {
                let error = if e.is_timeout() {
                    FetchErrorKind::Timeout
                } else {
                    FetchErrorKind::Http
                };
                log::debug!("[FETCH] Request failed for {}: {}", url, e);
                return FetchOutcome::Failed { url, error };
            }
            Ok(Ok(response)) => response,
        };

        if !response.status().is_success() {
            log::debug!("[FETCH] {} returned {}", url, response.status());
            return FetchOutcome::Failed {
                url,
                error: FetchErrorKind::Http,
            };
        }

        let body = match tokio::time::timeout(self.timeout, response.text()).await {
            Err(_) => {
                return FetchOutcome::Failed {
                    url,
                    error: FetchErrorKind::Timeout,
                }
            }
            Ok(Err(e)) => {
                log::debug!("[FETCH] Body read failed for {}: {}", url, e);
                return FetchOutcome::Failed {
                    url,
                    error: FetchErrorKind::Http,
                };
            }
            Ok(Ok(body)) => body,
        };

        let load_time_ms = started.elapsed().as_millis() as u64;

        if body.trim().is_empty() || !body.contains('<') {
            log::debug!("[FETCH] Body at {} does not look like markup", url);
            return FetchOutcome::Failed {
                url,
                error: FetchErrorKind::Parse,
            };
        }

        let speed = SpeedSignals {
            load_time_ms,
            body_bytes: body.len(),
        };
        let signals = build_signals(&body, &url, page, speed);
        FetchOutcome::Analyzed { url, signals }
    }
}

// Parsed documents are not Send; keep parsing and extraction in one sync
// scope so the surrounding future stays Send.
fn build_signals(
    body: &str,
    url: &Url,
    page: &DiscoveredPage,
    speed: SpeedSignals,
) -> crate::domain::models::PageSignals {
    let html = Html::parse_document(body);
    extract_page(&html, url, page.page_type, speed)
}
