use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::json;

use crate::config::ScienceConfig;
use crate::error::{Provider, Result, ScienceError};
use crate::http::RateLimitedClient;
use crate::sources::{BibIndexSource, IndexQuery, SearchHit, SearchResults};

pub struct AdsSource {
    client: RateLimitedClient,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    response: Option<SearchDocs>,
}

#[derive(Debug, Deserialize)]
struct SearchDocs {
    #[serde(rename = "numFound")]
    num_found: Option<u64>,
    #[serde(default)]
    docs: Vec<SearchDoc>,
}

#[derive(Debug, Deserialize)]
struct SearchDoc {
    bibcode: Option<String>,
    #[serde(default)]
    title: Vec<String>,
    #[serde(default)]
    author: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ExportResponse {
    export: String,
}

impl AdsSource {
    pub fn from_config(config: &ScienceConfig) -> Result<Self> {
        let client =
            RateLimitedClient::new(config.min_interval(), config.max_retries, &config.user_agent)?;
        Ok(Self {
            client,
            base_url: config.ads_base_url.trim_end_matches('/').to_string(),
            api_key: config.ads_api_key.clone(),
        })
    }

    pub fn with_params(
        base_url: &str,
        min_interval: Duration,
        api_key: Option<String>,
    ) -> Result<Self> {
        Ok(Self {
            client: RateLimitedClient::new(min_interval, 0, "pubscope/0.1")?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn auth_headers(&self) -> Result<HeaderMap> {
        let key = self
            .api_key
            .as_deref()
            .ok_or(ScienceError::MissingCredential {
                provider: Provider::Ads,
                key: "ads_api_key",
            })?;

        let value = HeaderValue::from_str(&format!("Bearer {key}"))
            .map_err(|e| ScienceError::Config(format!("unusable ads_api_key: {e}")))?;
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, value);
        Ok(headers)
    }

    async fn run_search(&self, url: &str, target: &str) -> Result<SearchDocs> {
        let headers = self.auth_headers()?;
        tracing::debug!("searching {url}");

        let text = self
            .client
            .get_with_headers(url, headers)
            .await
            .map_err(ScienceError::fetch_failed(Provider::Ads, target))?;
        let parsed: SearchResponse = serde_json::from_str(&text)
            .map_err(|e| ScienceError::malformed(Provider::Ads, target, e.to_string()))?;
        parsed
            .response
            .ok_or_else(|| ScienceError::malformed(Provider::Ads, target, "no \"response\" in search result"))
    }
}

#[async_trait]
impl BibIndexSource for AdsSource {
    async fn search_by_doi(&self, doi: &str) -> Result<Vec<String>> {
        let query = format!("doi:\"{doi}\"");
        let url = format!(
            "{}/search/query?q={}&fl=bibcode&rows=50",
            self.base_url,
            urlencoding::encode(&query)
        );
        let docs = self.run_search(&url, doi).await?.docs;

        let mut bibcodes: Vec<String> = Vec::new();
        for bibcode in docs.into_iter().filter_map(|d| d.bibcode) {
            if !bibcodes.contains(&bibcode) {
                bibcodes.push(bibcode);
            }
        }
        Ok(bibcodes)
    }

    async fn fetch_tagged_export(&self, bibcode: &str) -> Result<Vec<String>> {
        let headers = self.auth_headers()?;
        let url = format!("{}/export/ads", self.base_url);
        tracing::info!("parsing {url}");

        let body = json!({ "bibcode": [bibcode] });
        let text = self
            .client
            .post_json_with_headers(&url, &body, headers)
            .await
            .map_err(ScienceError::fetch_failed(Provider::Ads, bibcode))?;
        let parsed: ExportResponse = serde_json::from_str(&text)
            .map_err(|e| ScienceError::malformed(Provider::Ads, bibcode, e.to_string()))?;

        Ok(parsed.export.lines().map(str::to_string).collect())
    }

    async fn search(&self, query: &IndexQuery) -> Result<SearchResults> {
        let mut url = format!(
            "{}/search/query?q={}",
            self.base_url,
            urlencoding::encode(&query.query)
        );
        for filter in &query.filters {
            url.push_str("&fq=");
            url.push_str(&urlencoding::encode(filter));
        }
        url.push_str(&format!("&fl=author,bibcode,title&rows={}", query.rows));

        let docs = self.run_search(&url, &query.query).await?;
        let hits = docs
            .docs
            .into_iter()
            .filter_map(|doc| {
                Some(SearchHit {
                    bibcode: doc.bibcode?,
                    title: doc.title.into_iter().next(),
                    authors: doc.author,
                })
            })
            .collect();

        Ok(SearchResults {
            hits,
            num_found: docs.num_found,
        })
    }
}
