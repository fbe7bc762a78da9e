//! Clients for the external metadata providers.
//!
//! Each provider sits behind a small trait so the autolearn dispatcher can
//! be driven by fakes in tests.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;

/// A query in the index's own syntax, e.g. `year:2014 author:"williams"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexQuery {
    pub query: String,
    /// Filter queries applied on top of `query`.
    pub filters: Vec<String>,
    /// Most results to ask for.
    pub rows: usize,
}

/// One record returned by an index search. Authors are as the index spells
/// them, `"Surname, Given"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub bibcode: String,
    pub title: Option<String>,
    pub authors: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchResults {
    pub hits: Vec<SearchHit>,
    /// Total matches the index reported, which may exceed `hits.len()`.
    pub num_found: Option<u64>,
}

/// The bibliographic index (ADS).
#[async_trait]
pub trait BibIndexSource: Send + Sync {
    /// Bibcodes of every record carrying `doi`, in the order returned.
    async fn search_by_doi(&self, doi: &str) -> Result<Vec<String>>;

    /// The tagged export of one bibcode, split into lines.
    async fn fetch_tagged_export(&self, bibcode: &str) -> Result<Vec<String>>;

    async fn search(&self, query: &IndexQuery) -> Result<SearchResults>;
}

/// The DOI registry (Crossref).
#[async_trait]
pub trait DoiRegistrySource: Send + Sync {
    async fn fetch_unixref_record(&self, doi: &str) -> Result<Vec<u8>>;
}

/// The preprint archive (arXiv).
#[async_trait]
pub trait PreprintSource: Send + Sync {
    async fn fetch_atom_entry(&self, arxiv_id: &str) -> Result<Vec<u8>>;
}

pub mod ads;
pub mod arxiv;
pub mod crossref;

pub use ads::AdsSource;
pub use arxiv::ArxivSource;
pub use crossref::CrossrefSource;
