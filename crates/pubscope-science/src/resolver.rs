//! Turning user-typed references into stored publications.

use std::collections::VecDeque;

use pubscope_core::{ExactIdField, Publication, RecordStore};
use tracing::debug;

use crate::autolearn::AutolearnDispatcher;
use crate::error::{Result, ScienceError};
use crate::identifiers::{RefKind, classify};

pub struct Resolver<'a> {
    store: &'a dyn RecordStore,
    dispatcher: &'a AutolearnDispatcher,
}

impl<'a> Resolver<'a> {
    pub fn new(store: &'a dyn RecordStore, dispatcher: &'a AutolearnDispatcher) -> Self {
        Self { store, dispatcher }
    }

    /// Resolve each token in turn, yielding every match.
    ///
    /// Work happens as the returned locator is drained; tokens after a
    /// failing one are never looked at.
    pub fn locate_pubs<I, S>(&self, tokens: I, allow_empty: bool, autolearn: bool) -> PubLocator<'a>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PubLocator {
            store: self.store,
            dispatcher: self.dispatcher,
            tokens: tokens.into_iter().map(Into::into).collect(),
            pending: VecDeque::new(),
            allow_empty,
            autolearn,
            done: false,
        }
    }

    /// Resolve a single token to at most one publication.
    ///
    /// # Errors
    ///
    /// `AmbiguousMatch` carrying every match when more than one publication
    /// fits, `NoMatch` when none does and neither `allow_empty` nor
    /// `autolearn` is set, and whatever autolearning raises.
    pub async fn locate_one(
        &self,
        token: &str,
        allow_empty: bool,
        autolearn: bool,
    ) -> Result<Option<Publication>> {
        let mut locator = self.locate_pubs([token], true, false);

        let Some(first) = locator.next().await.transpose()? else {
            if autolearn {
                return self.dispatcher.autolearn(self.store, token).await.map(Some);
            }
            if allow_empty {
                return Ok(None);
            }
            return Err(ScienceError::NoMatch(token.to_string()));
        };

        let Some(second) = locator.next().await.transpose()? else {
            return Ok(Some(first));
        };

        let mut candidates = vec![first, second];
        while let Some(more) = locator.next().await {
            candidates.push(more?);
        }
        Err(ScienceError::AmbiguousMatch {
            token: token.to_string(),
            candidates,
        })
    }

    /// `locate_one` for callers that need a publication.
    pub async fn require_one(&self, token: &str, autolearn: bool) -> Result<Publication> {
        self.locate_one(token, false, autolearn)
            .await?
            .ok_or_else(|| ScienceError::NoMatch(token.to_string()))
    }

    /// The DOI `token` names: the token itself when it is a DOI, otherwise
    /// the DOI of the one publication it resolves to, learning it if needed.
    pub async fn require_doi(&self, token: &str) -> Result<String> {
        if let RefKind::Doi(doi) = classify(token) {
            return Ok(doi);
        }
        self.require_one(token, true)
            .await?
            .doi
            .ok_or_else(|| ScienceError::MissingDoi(token.to_string()))
    }
}

/// Lazy sequence of resolved publications.
pub struct PubLocator<'a> {
    store: &'a dyn RecordStore,
    dispatcher: &'a AutolearnDispatcher,
    tokens: VecDeque<String>,
    pending: VecDeque<Publication>,
    allow_empty: bool,
    autolearn: bool,
    done: bool,
}

impl PubLocator<'_> {
    /// The next match, or `None` once every token is exhausted or one has
    /// failed.
    pub async fn next(&mut self) -> Option<Result<Publication>> {
        loop {
            if let Some(publication) = self.pending.pop_front() {
                return Some(Ok(publication));
            }
            if self.done {
                return None;
            }

            let token = self.tokens.pop_front()?;
            match self.resolve(&token).await {
                Ok(found) => self.pending.extend(found),
                Err(err) => {
                    self.done = true;
                    self.tokens.clear();
                    return Some(Err(err));
                }
            }
        }
    }

    /// Drain the locator, stopping at the first error.
    pub async fn collect_all(mut self) -> Result<Vec<Publication>> {
        let mut found = Vec::new();
        while let Some(publication) = self.next().await {
            found.push(publication?);
        }
        Ok(found)
    }

    async fn resolve(&self, token: &str) -> Result<Vec<Publication>> {
        let kind = classify(token);
        let found = lookup(self.store, &kind)?;
        debug!("{kind} matched {} publication(s)", found.len());

        if !found.is_empty() {
            return Ok(found);
        }
        if self.autolearn {
            let learned = self.dispatcher.autolearn(self.store, token).await?;
            return Ok(vec![learned]);
        }
        if self.allow_empty {
            return Ok(Vec::new());
        }
        Err(ScienceError::NoMatch(token.to_string()))
    }
}

fn lookup(store: &dyn RecordStore, kind: &RefKind) -> Result<Vec<Publication>> {
    let found = match kind {
        RefKind::Doi(doi) => store.find_by_exact_id(ExactIdField::Doi, doi)?,
        RefKind::Bibcode(bibcode) => store.find_by_exact_id(ExactIdField::Bibcode, bibcode)?,
        RefKind::Arxiv(arxiv) => store.find_by_exact_id(ExactIdField::Arxiv, arxiv)?,
        RefKind::Nickname(nickname) => store.find_by_nickname(nickname)?,
        RefKind::LastListing(value) => {
            store.find_in_reserved_listing(listing_position(value)?)?
        }
        RefKind::SurnameYear(value) => {
            let (nfas, year) = value.rsplit_once('.').unwrap_or((value.as_str(), "*"));
            if year == "*" {
                store.find_by_nfas(nfas, None)?
            } else {
                // A year too large for the column cannot match anything.
                match year.parse::<i32>() {
                    Ok(year) => store.find_by_nfas(nfas, Some(year))?,
                    Err(_) => Vec::new(),
                }
            }
        }
    };
    Ok(found)
}

/// `"*"` selects the whole listing; `"N"` its zero-based entry `N - 1`.
fn listing_position(value: &str) -> Result<Option<usize>> {
    if value == "*" {
        return Ok(None);
    }
    match value.parse::<usize>() {
        Ok(n) if n > 0 => Ok(Some(n - 1)),
        _ => Err(ScienceError::InvalidListingRef(value.to_string())),
    }
}
