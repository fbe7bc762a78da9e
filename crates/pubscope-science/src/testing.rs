//! In-process provider fakes shared by the dispatcher and resolver tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::autolearn::AutolearnDispatcher;
use crate::error::{Provider, Result, ScienceError};
use crate::sources::{
    BibIndexSource, DoiRegistrySource, IndexQuery, PreprintSource, SearchResults,
};

/// Every provider call, as `"<provider>:<argument>"`, in call order.
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn calls(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    fn push(&self, call: String) {
        self.0.lock().unwrap().push(call);
    }
}

/// Canned provider responses. `bibcodes: None` makes the DOI search fail.
#[derive(Clone, Default)]
pub struct FakeSources {
    pub bibcodes: Option<Vec<String>>,
    pub export: String,
    pub unixref: String,
    pub atom: String,
    pub search: SearchResults,
}

struct FakeIndex {
    log: CallLog,
    sources: FakeSources,
}

#[async_trait]
impl BibIndexSource for FakeIndex {
    async fn search_by_doi(&self, doi: &str) -> Result<Vec<String>> {
        self.log.push(format!("ads.search:{doi}"));
        self.sources
            .bibcodes
            .clone()
            .ok_or_else(|| ScienceError::ProviderFetchFailed {
                provider: Provider::Ads,
                target: doi.to_string(),
                message: "HTTP 503".to_string(),
            })
    }

    async fn fetch_tagged_export(&self, bibcode: &str) -> Result<Vec<String>> {
        self.log.push(format!("ads.export:{bibcode}"));
        Ok(self.sources.export.lines().map(String::from).collect())
    }

    async fn search(&self, query: &IndexQuery) -> Result<SearchResults> {
        self.log.push(format!(
            "ads.query:{} fq={} rows={}",
            query.query,
            query.filters.join(","),
            query.rows
        ));
        Ok(self.sources.search.clone())
    }
}

struct FakeRegistry {
    log: CallLog,
    xml: String,
}

#[async_trait]
impl DoiRegistrySource for FakeRegistry {
    async fn fetch_unixref_record(&self, doi: &str) -> Result<Vec<u8>> {
        self.log.push(format!("crossref:{doi}"));
        Ok(self.xml.clone().into_bytes())
    }
}

struct FakePreprints {
    log: CallLog,
    xml: String,
}

#[async_trait]
impl PreprintSource for FakePreprints {
    async fn fetch_atom_entry(&self, arxiv_id: &str) -> Result<Vec<u8>> {
        self.log.push(format!("arxiv:{arxiv_id}"));
        Ok(self.xml.clone().into_bytes())
    }
}

pub fn fake_dispatcher(log: &CallLog, sources: FakeSources) -> AutolearnDispatcher {
    AutolearnDispatcher::new(
        Box::new(FakeIndex {
            log: log.clone(),
            sources: sources.clone(),
        }),
        Box::new(FakeRegistry {
            log: log.clone(),
            xml: sources.unixref,
        }),
        Box::new(FakePreprints {
            log: log.clone(),
            xml: sources.atom,
        }),
    )
}
