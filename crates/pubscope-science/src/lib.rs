//! Pubscope Science: reference resolution and autolearning from ADS,
//! Crossref and arXiv.

pub mod autolearn;
pub mod config;
pub mod context;
pub mod error;
pub mod http;
pub mod identifiers;
pub mod listing;
pub mod resolver;
pub mod search;
pub mod sources;

#[cfg(test)]
mod testing;

pub use autolearn::AutolearnDispatcher;
pub use config::ScienceConfig;
pub use context::BibContext;
pub use error::{Provider, Result, ScienceError};
pub use identifiers::{RefKind, classify};
pub use listing::{ListingRow, format_listing, record_listing};
pub use resolver::{PubLocator, Resolver};
pub use search::{GrepOptions, format_search_results, grep, search_index};
pub use sources::{SearchHit, SearchResults};
