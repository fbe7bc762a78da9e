pub mod database;
pub mod init;
pub mod repositories;

use crate::error::Result;
use crate::models::{PubRecord, Publication};

/// External identifier columns that support exact-match lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExactIdField {
    Doi,
    Bibcode,
    Arxiv,
}

impl ExactIdField {
    pub fn column(self) -> &'static str {
        match self {
            Self::Doi => "doi",
            Self::Bibcode => "bibcode",
            Self::Arxiv => "arxiv",
        }
    }
}

impl std::fmt::Display for ExactIdField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Doi => write!(f, "DOI"),
            Self::Bibcode => write!(f, "bibcode"),
            Self::Arxiv => write!(f, "arxiv"),
        }
    }
}

/// The query contract the resolver and autolearning code rely on.
///
/// Every lookup returns all matching rows; deciding what "too many" means is
/// the caller's business.
pub trait RecordStore {
    fn find_by_exact_id(&self, field: ExactIdField, value: &str) -> Result<Vec<Publication>>;

    fn find_by_nickname(&self, nickname: &str) -> Result<Vec<Publication>>;

    /// `year == None` matches every year.
    fn find_by_nfas(&self, nfas: &str, year: Option<i32>) -> Result<Vec<Publication>>;

    /// Publications in the reserved listing: the one at `position`
    /// (zero-based), or all of them in order when `position` is `None`.
    fn find_in_reserved_listing(&self, position: Option<usize>) -> Result<Vec<Publication>>;

    /// Every stored publication, oldest first.
    fn all_publications(&self) -> Result<Vec<Publication>>;

    /// Persist a new publication with its authors, editors and nicknames.
    fn create_publication(&self, record: PubRecord) -> Result<Publication>;

    /// Rewrite an existing publication from an edited record, keeping its
    /// curation flag.
    fn replace_authors_and_nicknames(&self, pub_id: i64, record: PubRecord)
    -> Result<Publication>;

    /// Replace the reserved listing with `pub_ids`, in order.
    fn set_reserved_listing(&self, pub_ids: &[i64]) -> Result<()>;

    /// Shortest nickname of a publication, if it has any.
    fn choose_nickname(&self, pub_id: i64) -> Result<Option<String>>;
}
