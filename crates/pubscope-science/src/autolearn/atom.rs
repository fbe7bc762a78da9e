use pubscope_core::PubRecord;
use pubscope_core::names::squish_spaces;
use quick_xml::de::from_str;
use serde::Deserialize;

use crate::error::{Provider, Result, ScienceError};

#[derive(Debug, Default, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AtomEntry {
    id: Option<String>,
    title: Option<String>,
    summary: Option<String>,
    published: Option<String>,
    #[serde(rename = "author")]
    authors: Vec<AtomAuthor>,
    #[serde(rename = "arxiv:doi", alias = "doi")]
    doi: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AtomAuthor {
    name: Option<String>,
}

fn clean(value: Option<String>) -> Option<String> {
    value.map(|v| squish_spaces(&v)).filter(|v| !v.is_empty())
}

/// Parse the Atom feed returned for a single `id_list` query.
///
/// Every field is optional; a feed without an entry, or whose entry is the
/// API's error report, is malformed.
pub fn parse_atom_entry(xml: &[u8], arxiv_id: &str) -> Result<PubRecord> {
    let malformed = |message: String| ScienceError::malformed(Provider::Arxiv, arxiv_id, message);

    let text = std::str::from_utf8(xml).map_err(|e| malformed(format!("not UTF-8: {e}")))?;
    let feed: AtomFeed = from_str(text).map_err(|e| malformed(format!("invalid atom xml: {e}")))?;
    let entry = feed
        .entries
        .into_iter()
        .next()
        .ok_or_else(|| malformed("feed has no entry".to_string()))?;

    if entry.id.as_deref().is_some_and(|id| id.contains("/api/errors")) {
        let reason = clean(entry.summary).unwrap_or_else(|| "unknown error".to_string());
        return Err(malformed(format!("arXiv reported an error: {reason}")));
    }

    let mut record = PubRecord::pending();
    record.title = clean(entry.title);
    record.abstract_text = clean(entry.summary);
    record.doi = clean(entry.doi);
    record.authors = entry
        .authors
        .into_iter()
        .filter_map(|author| clean(author.name))
        .collect();
    record.year = entry
        .published
        .as_deref()
        .and_then(|p| p.trim().get(..4))
        .and_then(|y| y.parse().ok());

    Ok(record)
}
