use std::time::Duration;

use async_trait::async_trait;

use crate::config::ScienceConfig;
use crate::error::{Provider, Result, ScienceError};
use crate::http::RateLimitedClient;
use crate::sources::DoiRegistrySource;

/// Crossref OpenURL endpoint, asked for UnixRef XML.
pub struct CrossrefSource {
    client: RateLimitedClient,
    base_url: String,
    pid: Option<String>,
}

impl CrossrefSource {
    pub fn from_config(config: &ScienceConfig) -> Result<Self> {
        let client =
            RateLimitedClient::new(config.min_interval(), config.max_retries, &config.user_agent)?;
        Ok(Self {
            client,
            base_url: config.crossref_base_url.clone(),
            pid: config.crossref_pid.clone(),
        })
    }

    pub fn with_params(base_url: &str, min_interval: Duration, pid: Option<String>) -> Result<Self> {
        Ok(Self {
            client: RateLimitedClient::new(min_interval, 0, "pubscope/0.1")?,
            base_url: base_url.to_string(),
            pid,
        })
    }
}

#[async_trait]
impl DoiRegistrySource for CrossrefSource {
    async fn fetch_unixref_record(&self, doi: &str) -> Result<Vec<u8>> {
        let pid = self
            .pid
            .as_deref()
            .ok_or(ScienceError::MissingCredential {
                provider: Provider::Crossref,
                key: "crossref_pid",
            })?;

        let url = format!(
            "{}?id={}&noredirect=true&pid={}&format=unixref",
            self.base_url,
            urlencoding::encode(doi),
            urlencoding::encode(pid)
        );
        tracing::info!("parsing {url}");

        self.client
            .get_bytes(&url)
            .await
            .map_err(ScienceError::fetch_failed(Provider::Crossref, doi))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    #[tokio::test]
    async fn fetches_unixref_with_account_id() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/openurl")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("id".into(), "10.1000/xyz".into()),
                Matcher::UrlEncoded("noredirect".into(), "true".into()),
                Matcher::UrlEncoded("pid".into(), "me@example.org".into()),
                Matcher::UrlEncoded("format".into(), "unixref".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "text/xml")
            .with_body("<doi_records/>")
            .create_async()
            .await;

        let source = CrossrefSource::with_params(
            &format!("{}/openurl", server.url()),
            Duration::ZERO,
            Some("me@example.org".into()),
        )
        .unwrap();
        let bytes = source.fetch_unixref_record("10.1000/xyz").await.unwrap();
        assert_eq!(bytes, b"<doi_records/>");
    }

    #[tokio::test]
    async fn missing_pid_is_reported_before_fetching() {
        let source = CrossrefSource::with_params("http://127.0.0.1:9/openurl", Duration::ZERO, None)
            .unwrap();
        let err = source.fetch_unixref_record("10.1000/xyz").await.unwrap_err();
        assert!(matches!(
            err,
            ScienceError::MissingCredential { provider: Provider::Crossref, .. }
        ));
    }
}
