//! Reference classification.
//!
//! A user-typed token is matched against a fixed list of patterns, first
//! match wins. Several patterns overlap ("10.1000/a.99" is both a DOI and a
//! surname-year shape), so the order of the checks in [`classify`] matters.

use once_cell::sync::Lazy;
use pubscope_core::names::normalize_surname;
use regex::Regex;

use super::url::sniff_url;

static DOI: Lazy<Regex> = Lazy::new(|| Regex::new(r"^10\.\d+/").unwrap());
static BIBCODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}[A-Za-z0-9&]+").unwrap());
static ARXIV_NEW: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d\d[01]\d\.\d+").unwrap());
static ARXIV_OLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z-]+/\d+").unwrap());
static SURNAME_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)^(.*)\.(\d+|\*)$").unwrap());

/// What a reference token denotes, with the value to look it up by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefKind {
    /// `%N` or `%*`; the value is what follows the `%`.
    LastListing(String),
    Doi(String),
    Bibcode(String),
    Arxiv(String),
    /// `"<nfas>.<year>"` or `"<nfas>.*"`.
    SurnameYear(String),
    Nickname(String),
}

impl RefKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::LastListing(_) => "lastlisting",
            Self::Doi(_) => "doi",
            Self::Bibcode(_) => "bibcode",
            Self::Arxiv(_) => "arxiv",
            Self::SurnameYear(_) => "nfasy",
            Self::Nickname(_) => "nickname",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Self::LastListing(v)
            | Self::Doi(v)
            | Self::Bibcode(v)
            | Self::Arxiv(v)
            | Self::SurnameYear(v)
            | Self::Nickname(v) => v,
        }
    }
}

impl std::fmt::Display for RefKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.name(), self.value())
    }
}

/// Classify a reference token. Total: anything unrecognized is a nickname.
pub fn classify(token: &str) -> RefKind {
    if let Some(rest) = token.strip_prefix('%') {
        return RefKind::LastListing(rest.to_string());
    }

    if (token.starts_with("http://") || token.starts_with("https://"))
        && let Some(kind) = sniff_url(token)
    {
        return kind;
    }

    if let Some(rest) = token.strip_prefix("doi:") {
        return RefKind::Doi(rest.to_string());
    }

    if DOI.is_match(token) {
        return RefKind::Doi(token.to_string());
    }

    if BIBCODE.is_match(token) {
        return RefKind::Bibcode(token.to_string());
    }

    if ARXIV_NEW.is_match(token) || ARXIV_OLD.is_match(token) {
        return RefKind::Arxiv(token.to_string());
    }

    if let Some(rest) = token.strip_prefix("arxiv:") {
        return RefKind::Arxiv(rest.to_string());
    }

    if let Some(caps) = SURNAME_YEAR.captures(token) {
        let surname = caps.get(1).map_or("", |m| m.as_str());
        let year = caps.get(2).map_or("", |m| m.as_str());
        return RefKind::SurnameYear(format!("{}.{year}", normalize_surname(surname)));
    }

    RefKind::Nickname(token.to_string())
}
