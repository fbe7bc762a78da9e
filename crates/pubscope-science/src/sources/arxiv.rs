use std::time::Duration;

use async_trait::async_trait;

use crate::config::ScienceConfig;
use crate::error::{Provider, Result, ScienceError};
use crate::http::RateLimitedClient;
use crate::sources::PreprintSource;

/// arXiv export API (Atom feed).
pub struct ArxivSource {
    client: RateLimitedClient,
    base_url: String,
}

impl ArxivSource {
    pub fn from_config(config: &ScienceConfig) -> Result<Self> {
        let client =
            RateLimitedClient::new(config.min_interval(), config.max_retries, &config.user_agent)?;
        Ok(Self {
            client,
            base_url: config.arxiv_base_url.clone(),
        })
    }

    pub fn with_params(base_url: &str, min_interval: Duration) -> Result<Self> {
        Ok(Self {
            client: RateLimitedClient::new(min_interval, 0, "pubscope/0.1")?,
            base_url: base_url.to_string(),
        })
    }
}

#[async_trait]
impl PreprintSource for ArxivSource {
    async fn fetch_atom_entry(&self, arxiv_id: &str) -> Result<Vec<u8>> {
        let separator = if self.base_url.contains('?') { '&' } else { '?' };
        let url = format!(
            "{}{separator}id_list={}",
            self.base_url,
            urlencoding::encode(arxiv_id)
        );
        tracing::info!("parsing {url}");

        self.client
            .get_bytes(&url)
            .await
            .map_err(ScienceError::fetch_failed(Provider::Arxiv, arxiv_id))
    }
}
