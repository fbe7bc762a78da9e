use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::error::{CoreError, Result};
use crate::models::{Publication, RefData};
use crate::storage::ExactIdField;

use super::Repository;

const PUB_COLUMNS: &str =
    "p.id, p.abstract, p.arxiv, p.bibcode, p.doi, p.keep, p.nfas, p.refdata, p.title, p.year";

pub trait PublicationRepository: Repository<Entity = Publication, Id = i64> {
    /// Insert a row and return it with its freshly assigned id.
    fn insert(&self, publication: &Publication) -> Result<Publication>;
    fn find_by_exact_id(&self, field: ExactIdField, value: &str) -> Result<Vec<Publication>>;
    fn find_by_nickname(&self, nickname: &str) -> Result<Vec<Publication>>;
    fn find_by_nfas(&self, nfas: &str, year: Option<i32>) -> Result<Vec<Publication>>;
    fn find_in_list(&self, name: &str, position: Option<usize>) -> Result<Vec<Publication>>;
    fn recent(&self, limit: usize) -> Result<Vec<Publication>>;
    fn all(&self) -> Result<Vec<Publication>>;
}

pub struct SqlitePublicationRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqlitePublicationRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn row_to_publication(row: &Row) -> rusqlite::Result<Publication> {
        let refdata: RefData = match row.get::<_, Option<String>>(7)? {
            Some(json) => serde_json::from_str(&json).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(7, Type::Text, Box::new(e))
            })?,
            None => RefData::default(),
        };

        Ok(Publication {
            id: row.get(0)?,
            abstract_text: row.get(1)?,
            arxiv: row.get(2)?,
            bibcode: row.get(3)?,
            doi: row.get(4)?,
            keep: row.get(5)?,
            nfas: row.get(6)?,
            refdata,
            title: row.get(8)?,
            year: row.get(9)?,
        })
    }

    fn query(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<Publication>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, Self::row_to_publication)?;
        let mut pubs = Vec::new();
        for row in rows {
            pubs.push(row?);
        }
        Ok(pubs)
    }
}

impl<'a> Repository for SqlitePublicationRepository<'a> {
    type Entity = Publication;
    type Id = i64;

    fn find_by_id(&self, id: &Self::Id) -> Result<Option<Self::Entity>> {
        let sql = format!("SELECT {PUB_COLUMNS} FROM pubs AS p WHERE p.id = ?1");
        let found = self
            .conn
            .query_row(&sql, params![id], Self::row_to_publication)
            .optional()?;
        Ok(found)
    }

    fn save(&self, publication: &Self::Entity) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE pubs SET abstract = ?1, arxiv = ?2, bibcode = ?3, doi = ?4, keep = ?5,
                             nfas = ?6, refdata = ?7, title = ?8, year = ?9
             WHERE id = ?10",
            params![
                publication.abstract_text,
                publication.arxiv,
                publication.bibcode,
                publication.doi,
                publication.keep,
                publication.nfas,
                serde_json::to_string(&publication.refdata)?,
                publication.title,
                publication.year,
                publication.id,
            ],
        )?;

        if changed == 0 {
            return Err(CoreError::PublicationNotFound(publication.id));
        }
        Ok(())
    }

    fn delete(&self, id: &Self::Id) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM pubs WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }
}

impl<'a> PublicationRepository for SqlitePublicationRepository<'a> {
    fn insert(&self, publication: &Publication) -> Result<Publication> {
        self.conn.execute(
            "INSERT INTO pubs (abstract, arxiv, bibcode, doi, keep, nfas, refdata, title, year)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                publication.abstract_text,
                publication.arxiv,
                publication.bibcode,
                publication.doi,
                publication.keep,
                publication.nfas,
                serde_json::to_string(&publication.refdata)?,
                publication.title,
                publication.year,
            ],
        )?;

        Ok(Publication {
            id: self.conn.last_insert_rowid(),
            ..publication.clone()
        })
    }

    fn find_by_exact_id(&self, field: ExactIdField, value: &str) -> Result<Vec<Publication>> {
        let sql = format!(
            "SELECT {PUB_COLUMNS} FROM pubs AS p WHERE p.{} = ?1 ORDER BY p.id",
            field.column()
        );
        self.query(&sql, params![value])
    }

    fn find_by_nickname(&self, nickname: &str) -> Result<Vec<Publication>> {
        let sql = format!(
            "SELECT {PUB_COLUMNS} FROM pubs AS p, nicknames AS n
             WHERE p.id = n.pubid AND n.nickname = ?1"
        );
        self.query(&sql, params![nickname])
    }

    fn find_by_nfas(&self, nfas: &str, year: Option<i32>) -> Result<Vec<Publication>> {
        match year {
            Some(year) => {
                let sql = format!(
                    "SELECT {PUB_COLUMNS} FROM pubs AS p
                     WHERE p.nfas = ?1 AND p.year = ?2 ORDER BY p.id"
                );
                self.query(&sql, params![nfas, year])
            }
            None => {
                let sql = format!(
                    "SELECT {PUB_COLUMNS} FROM pubs AS p
                     WHERE p.nfas = ?1 ORDER BY p.year, p.id"
                );
                self.query(&sql, params![nfas])
            }
        }
    }

    fn find_in_list(&self, name: &str, position: Option<usize>) -> Result<Vec<Publication>> {
        match position {
            Some(position) => {
                let sql = format!(
                    "SELECT {PUB_COLUMNS} FROM pubs AS p, publists AS l
                     WHERE p.id = l.pubid AND l.name = ?1 AND l.idx = ?2"
                );
                self.query(&sql, params![name, position as i64])
            }
            None => {
                let sql = format!(
                    "SELECT {PUB_COLUMNS} FROM pubs AS p, publists AS l
                     WHERE p.id = l.pubid AND l.name = ?1 ORDER BY l.idx"
                );
                self.query(&sql, params![name])
            }
        }
    }

    fn recent(&self, limit: usize) -> Result<Vec<Publication>> {
        let sql = format!(
            "SELECT {PUB_COLUMNS} FROM pubs AS p
             JOIN (SELECT pubid, MAX(date) AS last, MAX(rowid) AS seq
                   FROM history GROUP BY pubid) AS h
               ON p.id = h.pubid
             ORDER BY h.last DESC, h.seq DESC
             LIMIT ?1"
        );
        self.query(&sql, params![limit as i64])
    }

    fn all(&self) -> Result<Vec<Publication>> {
        let sql = format!("SELECT {PUB_COLUMNS} FROM pubs AS p ORDER BY p.id");
        self.query(&sql, [])
    }
}
