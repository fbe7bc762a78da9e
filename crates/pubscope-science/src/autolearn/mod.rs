//! Learning publications from external providers.
//!
//! The dispatcher picks a provider from the shape of the reference: DOIs go
//! to the bibliographic index first and only fall back to the DOI registry
//! when no bibcode is known for them, bibcodes go straight to the index and
//! arXiv identifiers go to the preprint archive.

mod atom;
mod tagged;
mod unixref;

pub use atom::parse_atom_entry;
pub use tagged::parse_tagged_record;
pub use unixref::parse_unixref;

pub(crate) use tagged::translate_name;

use pubscope_core::{PubRecord, Publication, RecordStore};
use tracing::{debug, info, warn};

use crate::config::ScienceConfig;
use crate::error::{Result, ScienceError};
use crate::identifiers::{RefKind, classify};
use crate::sources::{
    AdsSource, ArxivSource, BibIndexSource, CrossrefSource, DoiRegistrySource, PreprintSource,
};

pub struct AutolearnDispatcher {
    bib_index: Box<dyn BibIndexSource>,
    doi_registry: Box<dyn DoiRegistrySource>,
    preprints: Box<dyn PreprintSource>,
}

impl AutolearnDispatcher {
    pub fn new(
        bib_index: Box<dyn BibIndexSource>,
        doi_registry: Box<dyn DoiRegistrySource>,
        preprints: Box<dyn PreprintSource>,
    ) -> Self {
        Self {
            bib_index,
            doi_registry,
            preprints,
        }
    }

    /// Dispatcher backed by the real providers.
    pub fn from_config(config: &ScienceConfig) -> Result<Self> {
        Ok(Self::new(
            Box::new(AdsSource::from_config(config)?),
            Box::new(CrossrefSource::from_config(config)?),
            Box::new(ArxivSource::from_config(config)?),
        ))
    }

    pub fn bib_index(&self) -> &dyn BibIndexSource {
        self.bib_index.as_ref()
    }

    /// The registry's raw unixref XML for `doi`, unparsed.
    pub async fn registry_record(&self, doi: &str) -> Result<Vec<u8>> {
        self.doi_registry.fetch_unixref_record(doi).await
    }

    /// Fetch and parse the record for `token` without touching the store.
    ///
    /// # Errors
    ///
    /// `NoMatch` for listing references, `CannotAutolearn` for nicknames and
    /// surname/year references, and provider errors otherwise.
    pub async fn learn(&self, token: &str) -> Result<PubRecord> {
        let mut record = match classify(token) {
            RefKind::LastListing(_) => return Err(ScienceError::NoMatch(token.to_string())),
            RefKind::Doi(doi) => match self.doi_to_bibcode(&doi).await {
                Some(bibcode) => {
                    let mut record = self.learn_bibcode(&bibcode).await?;
                    record.doi.get_or_insert(doi);
                    record
                }
                None => self.learn_doi(&doi).await?,
            },
            RefKind::Bibcode(bibcode) => self.learn_bibcode(&bibcode).await?,
            RefKind::Arxiv(arxiv_id) => self.learn_arxiv(&arxiv_id).await?,
            RefKind::SurnameYear(_) | RefKind::Nickname(_) => {
                return Err(ScienceError::CannotAutolearn(token.to_string()));
            }
        };

        record.keep = false;
        Ok(record)
    }

    /// Learn `token` and persist the result as a new publication.
    pub async fn autolearn(&self, store: &dyn RecordStore, token: &str) -> Result<Publication> {
        let record = self.learn(token).await?;
        let publication = store.create_publication(record)?;
        debug!(id = publication.id, "stored autolearned publication for {token}");
        Ok(publication)
    }

    /// Ask the bibliographic index which bibcode carries `doi`.
    ///
    /// Lookup failures are logged and treated as "unknown" so callers can
    /// fall back to another provider.
    pub async fn doi_to_bibcode(&self, doi: &str) -> Option<String> {
        let bibcodes = match self.bib_index.search_by_doi(doi).await {
            Ok(bibcodes) => bibcodes,
            Err(err) => {
                warn!("could not look up a bibcode for {doi}: {err}");
                return None;
            }
        };

        if bibcodes.len() > 1 {
            warn!(
                "multiple bibcodes carry DOI {doi}: {}; using the first",
                bibcodes.join(", ")
            );
        }

        let bibcode = bibcodes.into_iter().next()?;
        info!("[Associated {doi} to {bibcode}]");
        Some(bibcode)
    }

    async fn learn_bibcode(&self, bibcode: &str) -> Result<PubRecord> {
        let lines = self.bib_index.fetch_tagged_export(bibcode).await?;
        let mut record = parse_tagged_record(lines, bibcode)?;
        record.bibcode = Some(bibcode.to_string());
        Ok(record)
    }

    async fn learn_doi(&self, doi: &str) -> Result<PubRecord> {
        let xml = self.doi_registry.fetch_unixref_record(doi).await?;
        let mut record = parse_unixref(&xml, doi)?;
        record.doi = Some(doi.to_string());
        Ok(record)
    }

    async fn learn_arxiv(&self, arxiv_id: &str) -> Result<PubRecord> {
        let xml = self.preprints.fetch_atom_entry(arxiv_id).await?;
        let mut record = parse_atom_entry(&xml, arxiv_id)?;
        record.arxiv = Some(arxiv_id.to_string());

        if record.bibcode.is_none()
            && let Some(doi) = record.doi.clone()
        {
            record.bibcode = self.doi_to_bibcode(&doi).await;
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CallLog, FakeSources, fake_dispatcher};
    use pubscope_core::{Database, ExactIdField};

    const EXPORT: &str = "%R 2020ApJ...900...10S\n%T Learned through the index\n%D 03/2020\n%A Smith, Jane; Doe, John\n";

    const UNIXREF: &str = r#"<doi_records><doi_record><crossref><journal>
        <journal_metadata><full_title>Journal of Tests</full_title></journal_metadata>
        <journal_article>
          <titles><title>Learned through the registry</title></titles>
          <contributors>
            <person_name contributor_role="author"><given_name>Ada</given_name><surname>Lovelace</surname></person_name>
          </contributors>
          <publication_date><year>2011</year></publication_date>
        </journal_article>
    </journal></crossref></doi_record></doi_records>"#;

    const ATOM: &str = r#"<feed xmlns="http://www.w3.org/2005/Atom" xmlns:arxiv="http://arxiv.org/schemas/atom">
  <entry>
    <id>http://arxiv.org/abs/2101.00001v1</id>
    <published>2021-01-01T00:00:00Z</published>
    <title>Learned through the archive</title>
    <summary>Body.</summary>
    <author><name>Grace Hopper</name></author>
    <arxiv:doi>10.1000/preprint</arxiv:doi>
  </entry>
</feed>"#;

    fn sources(bibcodes: Option<Vec<&str>>) -> FakeSources {
        FakeSources {
            bibcodes: bibcodes.map(|b| b.into_iter().map(String::from).collect()),
            export: EXPORT.to_string(),
            unixref: UNIXREF.to_string(),
            atom: ATOM.to_string(),
            ..FakeSources::default()
        }
    }

    #[tokio::test]
    async fn registry_record_is_returned_unparsed() {
        let log = CallLog::default();
        let dispatcher = fake_dispatcher(&log, sources(None));

        let xml = dispatcher.registry_record("10.1000/xyz").await.unwrap();
        assert_eq!(xml, UNIXREF.as_bytes());
        assert_eq!(log.calls(), vec!["crossref:10.1000/xyz"]);
    }

    #[tokio::test]
    async fn known_doi_is_learned_from_the_index() {
        let log = CallLog::default();
        let dispatcher = fake_dispatcher(&log, sources(Some(vec!["2020ApJ...900...10S"])));

        let record = dispatcher.learn("10.1000/xyz").await.unwrap();
        assert_eq!(record.title.as_deref(), Some("Learned through the index"));
        assert_eq!(record.bibcode.as_deref(), Some("2020ApJ...900...10S"));
        assert_eq!(record.doi.as_deref(), Some("10.1000/xyz"));
        assert_eq!(record.year, Some(2020));
        assert!(!record.keep);
        assert_eq!(
            log.calls(),
            vec!["ads.search:10.1000/xyz", "ads.export:2020ApJ...900...10S"]
        );
        assert_eq!(log.count("crossref"), 0);
    }

    #[tokio::test]
    async fn several_bibcodes_use_the_first() {
        let log = CallLog::default();
        let dispatcher = fake_dispatcher(&log, sources(Some(vec!["2020A", "2020B"])));

        let record = dispatcher.learn("doi:10.1000/xyz").await.unwrap();
        assert_eq!(record.bibcode.as_deref(), Some("2020A"));
    }

    #[tokio::test]
    async fn unknown_doi_falls_back_to_the_registry() {
        let log = CallLog::default();
        let dispatcher = fake_dispatcher(&log, sources(Some(vec![])));

        let record = dispatcher.learn("10.1000/xyz").await.unwrap();
        assert_eq!(record.title.as_deref(), Some("Learned through the registry"));
        assert_eq!(record.doi.as_deref(), Some("10.1000/xyz"));
        assert_eq!(record.bibcode, None);
        assert_eq!(record.authors, vec!["Ada Lovelace"]);
        assert_eq!(log.calls(), vec!["ads.search:10.1000/xyz", "crossref:10.1000/xyz"]);
    }

    #[tokio::test]
    async fn failed_index_search_falls_back_to_the_registry() {
        let log = CallLog::default();
        let dispatcher = fake_dispatcher(&log, sources(None));

        let record = dispatcher.learn("10.1000/xyz").await.unwrap();
        assert_eq!(record.title.as_deref(), Some("Learned through the registry"));
        assert_eq!(log.count("crossref"), 1);
    }

    #[tokio::test]
    async fn bibcode_skips_the_search() {
        let log = CallLog::default();
        let dispatcher = fake_dispatcher(&log, sources(Some(vec!["unused"])));

        let record = dispatcher.learn("2020ApJ...900...10S").await.unwrap();
        assert_eq!(record.bibcode.as_deref(), Some("2020ApJ...900...10S"));
        assert_eq!(record.doi, None);
        assert_eq!(log.calls(), vec!["ads.export:2020ApJ...900...10S"]);
    }

    #[tokio::test]
    async fn arxiv_record_gets_its_bibcode_backfilled() {
        let log = CallLog::default();
        let dispatcher = fake_dispatcher(&log, sources(Some(vec!["2021arXiv210100001H"])));

        let record = dispatcher.learn("arxiv:2101.00001").await.unwrap();
        assert_eq!(record.arxiv.as_deref(), Some("2101.00001"));
        assert_eq!(record.doi.as_deref(), Some("10.1000/preprint"));
        assert_eq!(record.bibcode.as_deref(), Some("2021arXiv210100001H"));
        assert_eq!(record.year, Some(2021));
        assert_eq!(
            log.calls(),
            vec!["arxiv:2101.00001", "ads.search:10.1000/preprint"]
        );
    }

    #[tokio::test]
    async fn references_without_a_provider_cannot_be_learned() {
        let log = CallLog::default();
        let dispatcher = fake_dispatcher(&log, sources(Some(vec![])));

        assert!(matches!(
            dispatcher.learn("vaswani2017").await,
            Err(ScienceError::CannotAutolearn(t)) if t == "vaswani2017"
        ));
        assert!(matches!(
            dispatcher.learn("smith.2019").await,
            Err(ScienceError::CannotAutolearn(_))
        ));
        assert!(matches!(
            dispatcher.learn("%3").await,
            Err(ScienceError::NoMatch(t)) if t == "%3"
        ));
        assert!(log.calls().is_empty());
    }

    #[tokio::test]
    async fn malformed_export_propagates() {
        let log = CallLog::default();
        let mut fakes = sources(Some(vec!["2020A"]));
        fakes.export = "Retrieved 2 abstracts, starting with number 1.  Total number selected: 2.\n".into();
        let dispatcher = fake_dispatcher(&log, fakes);

        assert!(matches!(
            dispatcher.learn("10.1000/xyz").await,
            Err(ScienceError::MalformedProviderPayload { .. })
        ));
    }

    #[tokio::test]
    async fn autolearn_stores_a_pending_record() {
        let log = CallLog::default();
        let dispatcher = fake_dispatcher(&log, sources(Some(vec!["2020ApJ...900...10S"])));
        let db = Database::open_in_memory().unwrap();

        let publication = dispatcher.autolearn(&db, "10.1000/xyz").await.unwrap();
        assert!(!publication.keep);
        assert_eq!(publication.nfas.as_deref(), Some("smith"));
        assert_eq!(publication.doi.as_deref(), Some("10.1000/xyz"));

        let found = db
            .find_by_exact_id(ExactIdField::Bibcode, "2020ApJ...900...10S")
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, publication.id);
    }
}
