use std::cell::RefCell;
use std::collections::HashMap;

use rusqlite::{Connection, OptionalExtension, params};

use crate::error::Result;
use crate::models::{AuthorRef, AuthorRole};

pub trait AuthorRepository {
    /// Replace every `role` reference of a publication with `names`, in order.
    fn set_authors(&self, pub_id: i64, role: AuthorRole, names: &[String]) -> Result<()>;
    fn authors(&self, pub_id: i64, role: AuthorRole) -> Result<Vec<AuthorRef>>;
    fn delete_for_pub(&self, pub_id: i64) -> Result<()>;
}

/// Author references backed by the `author_names` / `authors` tables.
///
/// Names are interned once per repository; repeated authors across a batch
/// of writes hit the cache instead of the database.
pub struct SqliteAuthorRepository<'a> {
    conn: &'a Connection,
    interned: RefCell<HashMap<String, i64>>,
}

impl<'a> SqliteAuthorRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self {
            conn,
            interned: RefCell::new(HashMap::new()),
        }
    }

    fn intern(&self, name: &str) -> Result<i64> {
        if let Some(id) = self.interned.borrow().get(name) {
            return Ok(*id);
        }

        let existing: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM author_names WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;

        let id = match existing {
            Some(id) => id,
            None => {
                self.conn
                    .execute("INSERT INTO author_names (name) VALUES (?1)", params![name])?;
                self.conn.last_insert_rowid()
            }
        };

        self.interned.borrow_mut().insert(name.to_string(), id);
        Ok(id)
    }
}

impl<'a> AuthorRepository for SqliteAuthorRepository<'a> {
    fn set_authors(&self, pub_id: i64, role: AuthorRole, names: &[String]) -> Result<()> {
        self.conn.execute(
            "DELETE FROM authors WHERE pubid = ?1 AND type = ?2",
            params![pub_id, role.code()],
        )?;

        for (idx, name) in names.iter().enumerate() {
            let author_id = self.intern(name)?;
            self.conn.execute(
                "INSERT INTO authors (type, pubid, idx, authid) VALUES (?1, ?2, ?3, ?4)",
                params![role.code(), pub_id, idx as i64, author_id],
            )?;
        }
        Ok(())
    }

    fn authors(&self, pub_id: i64, role: AuthorRole) -> Result<Vec<AuthorRef>> {
        let mut stmt = self.conn.prepare(
            "SELECT a.idx, n.name FROM authors AS a, author_names AS n
             WHERE a.authid = n.id AND a.pubid = ?1 AND a.type = ?2
             ORDER BY a.idx",
        )?;

        let rows = stmt.query_map(params![pub_id, role.code()], |row| {
            let idx: i64 = row.get(0)?;
            Ok(AuthorRef {
                role,
                position: idx as usize,
                name: row.get(1)?,
            })
        })?;

        let mut refs = Vec::new();
        for row in rows {
            refs.push(row?);
        }
        Ok(refs)
    }

    fn delete_for_pub(&self, pub_id: i64) -> Result<()> {
        self.conn
            .execute("DELETE FROM authors WHERE pubid = ?1", params![pub_id])?;
        Ok(())
    }
}
