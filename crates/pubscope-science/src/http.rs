use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::time::sleep;

use crate::error::{Result, ScienceError};

// ─── RateLimitedClient ────────────────────────────────────────────────────────

/// Longest pause between transport retries.
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Exponential pause before retry number `attempt + 1`, capped at [`MAX_BACKOFF`].
fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(2u64.saturating_pow(attempt)).min(MAX_BACKOFF)
}

/// `reqwest` client that spaces requests out by `min_interval` and retries
/// HTTP 429 and transport failures up to `max_retries` times.
pub struct RateLimitedClient {
    client: reqwest::Client,
    min_interval: Duration,
    last_request: Arc<Mutex<Option<Instant>>>,
    max_retries: u32,
}

impl RateLimitedClient {
    pub fn new(min_interval: Duration, max_retries: u32, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .gzip(true)
            .build()?;
        Ok(Self {
            client,
            min_interval,
            last_request: Arc::new(Mutex::new(None)),
            max_retries,
        })
    }

    async fn wait_for_rate_limit(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(t) = *last {
            let elapsed = t.elapsed();
            if elapsed < self.min_interval {
                sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    async fn send(&self, url: &str, build: impl Fn() -> RequestBuilder) -> Result<Response> {
        let mut attempt = 0u32;
        loop {
            self.wait_for_rate_limit().await;
            match build().send().await {
                Ok(r) if r.status() == StatusCode::TOO_MANY_REQUESTS => {
                    let wait = r
                        .headers()
                        .get(RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.parse::<u64>().ok())
                        .unwrap_or(60);
                    if attempt >= self.max_retries {
                        return Err(ScienceError::RateLimit(url.to_string(), wait));
                    }
                    sleep(Duration::from_secs(wait)).await;
                    attempt += 1;
                }
                Ok(r) if !r.status().is_success() => {
                    let status = r.status().as_u16();
                    let body = r.text().await.unwrap_or_default();
                    return Err(ScienceError::ApiError(
                        url.to_string(),
                        format!("HTTP {status}: {body}"),
                    ));
                }
                Ok(r) => return Ok(r),
                Err(e) => {
                    if attempt >= self.max_retries {
                        return Err(ScienceError::Http(e));
                    }
                    sleep(backoff_delay(attempt)).await;
                    attempt += 1;
                }
            }
        }
    }

    pub async fn get_with_headers(&self, url: &str, headers: HeaderMap) -> Result<String> {
        let resp = self
            .send(url, || self.client.get(url).headers(headers.clone()))
            .await?;
        resp.text().await.map_err(ScienceError::Http)
    }

    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let resp = self.send(url, || self.client.get(url)).await?;
        let bytes = resp.bytes().await?;
        Ok(bytes.to_vec())
    }

    /// POST `body` as JSON and return the raw response text.
    pub async fn post_json_with_headers<B: Serialize + Sync>(
        &self,
        url: &str,
        body: &B,
        headers: HeaderMap,
    ) -> Result<String> {
        let resp = self
            .send(url, || {
                self.client.post(url).headers(headers.clone()).json(body)
            })
            .await?;
        resp.text().await.map_err(ScienceError::Http)
    }
}
