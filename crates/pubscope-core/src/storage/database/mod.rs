mod connection;
mod migrations;
mod schema;

pub use connection::ConnectionPool;
pub use migrations::{Migration, get_applied_versions, run_migrations};
pub use schema::SCHEMA_VERSION;

use std::path::Path;

use rusqlite::Connection;
use serde_json::Value;

use crate::error::{CoreError, Result};
use crate::models::{
    AuthorRef, AuthorRole, HistoryAction, HistoryEntry, PubRecord, Publication,
    REFDATA_IDENT_KEY, RESERVED_LISTING, USER_LIST_PREFIX, user_list_name,
};
use crate::names::{nfas_of, squish_spaces};

use super::repositories::{
    AuthorRepository, HistoryRepository, NicknameRepository, PublicationRepository,
    PublistRepository, Repository, SqliteAuthorRepository, SqliteHistoryRepository,
    SqliteNicknameRepository, SqlitePublicationRepository, SqlitePublistRepository,
};
use super::{ExactIdField, RecordStore};

/// Journal name the bibliographic index uses for bare preprints.
const ARXIV_EPRINTS_JOURNAL: &str = "ArXiv e-prints";

pub fn open_database(path: &Path) -> Result<ConnectionPool> {
    let pool = ConnectionPool::open(path)?;
    {
        let conn = pool.get_connection();
        migrations::run_migrations(&conn)?;
    }
    Ok(pool)
}

pub fn open_in_memory() -> Result<ConnectionPool> {
    let pool = ConnectionPool::open_in_memory()?;
    {
        let conn = pool.get_connection();
        migrations::run_migrations(&conn)?;
    }
    Ok(pool)
}

/// The publication store. One per process; every write runs in its own
/// transaction and is committed before the call returns.
pub struct Database {
    pool: ConnectionPool,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let pool = open_database(path)?;
        Ok(Self { pool })
    }

    pub fn open_in_memory() -> Result<Self> {
        let pool = open_in_memory()?;
        Ok(Self { pool })
    }

    pub fn publication(&self, pub_id: i64) -> Result<Publication> {
        let conn = self.pool.get_connection();
        let repo = SqlitePublicationRepository::new(&conn);
        repo.find_by_id(&pub_id)?
            .ok_or(CoreError::PublicationNotFound(pub_id))
    }

    pub fn authors(&self, pub_id: i64, role: AuthorRole) -> Result<Vec<AuthorRef>> {
        let conn = self.pool.get_connection();
        SqliteAuthorRepository::new(&conn).authors(pub_id, role)
    }

    pub fn nicknames(&self, pub_id: i64) -> Result<Vec<String>> {
        let conn = self.pool.get_connection();
        SqliteNicknameRepository::new(&conn).list_for(pub_id)
    }

    pub fn add_nickname(&self, pub_id: i64, nickname: &str) -> Result<()> {
        let conn = self.pool.get_connection();
        if SqlitePublicationRepository::new(&conn)
            .find_by_id(&pub_id)?
            .is_none()
        {
            return Err(CoreError::PublicationNotFound(pub_id));
        }
        SqliteNicknameRepository::new(&conn).add(pub_id, nickname)
    }

    /// Turn a stored publication back into the record it was created from.
    pub fn export_record(&self, pub_id: i64) -> Result<PubRecord> {
        let publication = self.publication(pub_id)?;
        let conn = self.pool.get_connection();
        let authors = SqliteAuthorRepository::new(&conn);
        let names = |role: AuthorRole| -> Result<Vec<String>> {
            Ok(authors
                .authors(pub_id, role)?
                .into_iter()
                .map(|a| a.name)
                .collect())
        };

        Ok(PubRecord {
            title: publication.title,
            year: publication.year,
            abstract_text: publication.abstract_text,
            doi: publication.doi,
            bibcode: publication.bibcode,
            arxiv: publication.arxiv,
            keep: publication.keep,
            authors: names(AuthorRole::Author)?,
            editors: names(AuthorRole::Editor)?,
            nicknames: SqliteNicknameRepository::new(&conn).list_for(pub_id)?,
            refdata: publication.refdata,
        })
    }

    /// Delete a publication and everything hanging off it. Lists it was on
    /// are renumbered so their positions stay dense.
    pub fn delete_publication(&self, pub_id: i64) -> Result<()> {
        let mut conn = self.pool.get_connection();
        let tx = conn.transaction()?;
        {
            SqlitePublistRepository::new(&tx).remove_pub_everywhere(pub_id)?;
            SqliteAuthorRepository::new(&tx).delete_for_pub(pub_id)?;
            SqliteHistoryRepository::new(&tx).delete_for_pub(pub_id)?;
            SqliteNicknameRepository::new(&tx).delete_for_pub(pub_id)?;
            if !SqlitePublicationRepository::new(&tx).delete(&pub_id)? {
                return Err(CoreError::PublicationNotFound(pub_id));
            }
        }
        tx.commit()?;
        Ok(())
    }

    // ─── Named lists ───────────────────────────────────────

    /// Append publications to a user list, skipping ones already on it.
    pub fn add_to_list(&self, name: &str, pub_ids: &[i64]) -> Result<usize> {
        let mut conn = self.pool.get_connection();
        let tx = conn.transaction()?;
        let added = SqlitePublistRepository::new(&tx).append(&user_list_name(name), pub_ids)?;
        tx.commit()?;
        Ok(added)
    }

    pub fn remove_from_list(&self, name: &str, pub_ids: &[i64]) -> Result<usize> {
        let mut conn = self.pool.get_connection();
        let tx = conn.transaction()?;
        let removed = SqlitePublistRepository::new(&tx).remove(&user_list_name(name), pub_ids)?;
        tx.commit()?;
        Ok(removed)
    }

    pub fn list_members(&self, name: &str) -> Result<Vec<Publication>> {
        let conn = self.pool.get_connection();
        SqlitePublicationRepository::new(&conn).find_in_list(&user_list_name(name), None)
    }

    /// Names of user lists, without their storage prefix.
    pub fn list_names(&self) -> Result<Vec<String>> {
        let conn = self.pool.get_connection();
        let names = SqlitePublistRepository::new(&conn).names_with_prefix(USER_LIST_PREFIX)?;
        Ok(names
            .into_iter()
            .filter_map(|n| n.strip_prefix(USER_LIST_PREFIX).map(str::to_string))
            .collect())
    }

    // ─── History ───────────────────────────────────────────

    pub fn log_action(&self, pub_id: i64, action: HistoryAction) -> Result<()> {
        let conn = self.pool.get_connection();
        SqliteHistoryRepository::new(&conn).log(pub_id, action)
    }

    pub fn history(&self, pub_id: i64) -> Result<Vec<HistoryEntry>> {
        let conn = self.pool.get_connection();
        SqliteHistoryRepository::new(&conn).for_pub(pub_id)
    }

    /// Distinct publications, most recently touched first.
    pub fn recent(&self, limit: usize) -> Result<Vec<Publication>> {
        let conn = self.pool.get_connection();
        SqlitePublicationRepository::new(&conn).recent(limit)
    }
}

/// Build the `pubs` row for a record: whitespace squished, NFAS derived from
/// the first author, `_ident` dropped.
fn publication_row(record: &PubRecord, id: i64, keep: bool) -> Result<Publication> {
    if let Some(empty) = record
        .authors
        .iter()
        .chain(&record.editors)
        .find(|name| name.trim().is_empty())
    {
        return Err(CoreError::InvalidRecord(format!(
            "empty author name {empty:?}"
        )));
    }

    let mut refdata = record.refdata.clone();
    refdata.remove(REFDATA_IDENT_KEY);
    if refdata.get("journal").and_then(Value::as_str) == Some(ARXIV_EPRINTS_JOURNAL) {
        tracing::warn!(
            "refdata journal is \"{ARXIV_EPRINTS_JOURNAL}\"; a published version may exist"
        );
    }

    let squished = |text: &Option<String>| {
        text.as_deref()
            .map(squish_spaces)
            .filter(|t| !t.is_empty())
    };

    Ok(Publication {
        id,
        abstract_text: squished(&record.abstract_text),
        arxiv: record.arxiv.clone(),
        bibcode: record.bibcode.clone(),
        doi: record.doi.clone(),
        keep,
        nfas: record.authors.first().map(|name| nfas_of(name)),
        refdata,
        title: squished(&record.title),
        year: record.year,
    })
}

fn write_people_and_nicknames(conn: &Connection, pub_id: i64, record: &PubRecord) -> Result<()> {
    let authors = SqliteAuthorRepository::new(conn);
    authors.set_authors(pub_id, AuthorRole::Author, &record.authors)?;
    authors.set_authors(pub_id, AuthorRole::Editor, &record.editors)?;

    let nicknames = SqliteNicknameRepository::new(conn);
    nicknames.delete_for_pub(pub_id)?;
    for nickname in &record.nicknames {
        nicknames.add(pub_id, nickname)?;
    }
    Ok(())
}

impl RecordStore for Database {
    fn find_by_exact_id(&self, field: ExactIdField, value: &str) -> Result<Vec<Publication>> {
        let conn = self.pool.get_connection();
        SqlitePublicationRepository::new(&conn).find_by_exact_id(field, value)
    }

    fn find_by_nickname(&self, nickname: &str) -> Result<Vec<Publication>> {
        let conn = self.pool.get_connection();
        SqlitePublicationRepository::new(&conn).find_by_nickname(nickname)
    }

    fn find_by_nfas(&self, nfas: &str, year: Option<i32>) -> Result<Vec<Publication>> {
        let conn = self.pool.get_connection();
        SqlitePublicationRepository::new(&conn).find_by_nfas(nfas, year)
    }

    fn find_in_reserved_listing(&self, position: Option<usize>) -> Result<Vec<Publication>> {
        let conn = self.pool.get_connection();
        SqlitePublicationRepository::new(&conn).find_in_list(RESERVED_LISTING, position)
    }

    fn all_publications(&self) -> Result<Vec<Publication>> {
        let conn = self.pool.get_connection();
        SqlitePublicationRepository::new(&conn).all()
    }

    fn create_publication(&self, record: PubRecord) -> Result<Publication> {
        let row = publication_row(&record, 0, record.keep)?;

        let mut conn = self.pool.get_connection();
        let tx = conn.transaction()?;
        let created = SqlitePublicationRepository::new(&tx).insert(&row)?;
        write_people_and_nicknames(&tx, created.id, &record)?;
        tx.commit()?;

        tracing::debug!(id = created.id, "created publication");
        Ok(created)
    }

    fn replace_authors_and_nicknames(
        &self,
        pub_id: i64,
        record: PubRecord,
    ) -> Result<Publication> {
        let mut conn = self.pool.get_connection();
        let tx = conn.transaction()?;
        let updated = {
            let pubs = SqlitePublicationRepository::new(&tx);
            let existing = pubs
                .find_by_id(&pub_id)?
                .ok_or(CoreError::PublicationNotFound(pub_id))?;

            let row = publication_row(&record, pub_id, existing.keep)?;
            pubs.save(&row)?;
            write_people_and_nicknames(&tx, pub_id, &record)?;
            row
        };
        tx.commit()?;
        Ok(updated)
    }

    fn set_reserved_listing(&self, pub_ids: &[i64]) -> Result<()> {
        let mut conn = self.pool.get_connection();
        let tx = conn.transaction()?;
        SqlitePublistRepository::new(&tx).replace(RESERVED_LISTING, pub_ids)?;
        tx.commit()?;
        Ok(())
    }

    fn choose_nickname(&self, pub_id: i64) -> Result<Option<String>> {
        let conn = self.pool.get_connection();
        SqliteNicknameRepository::new(&conn).shortest(pub_id)
    }
}
