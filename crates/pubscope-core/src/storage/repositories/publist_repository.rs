use rusqlite::{Connection, params};

use crate::error::Result;
use crate::models::ListEntry;

pub trait PublistRepository {
    /// Drop the list and refill it with `pub_ids` at positions `0..n`.
    fn replace(&self, name: &str, pub_ids: &[i64]) -> Result<()>;
    /// Append publications not yet on the list. Returns how many were added.
    fn append(&self, name: &str, pub_ids: &[i64]) -> Result<usize>;
    /// Remove publications from the list, closing the gaps they leave.
    fn remove(&self, name: &str, pub_ids: &[i64]) -> Result<usize>;
    fn members(&self, name: &str) -> Result<Vec<ListEntry>>;
    fn names_with_prefix(&self, prefix: &str) -> Result<Vec<String>>;
    /// Remove a publication from every list it appears on.
    fn remove_pub_everywhere(&self, pub_id: i64) -> Result<()>;
}

pub struct SqlitePublistRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqlitePublistRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn write_positions(&self, name: &str, pub_ids: &[i64]) -> Result<()> {
        self.conn
            .execute("DELETE FROM publists WHERE name = ?1", params![name])?;
        let mut stmt = self
            .conn
            .prepare("INSERT INTO publists (name, idx, pubid) VALUES (?1, ?2, ?3)")?;
        for (idx, pub_id) in pub_ids.iter().enumerate() {
            stmt.execute(params![name, idx as i64, pub_id])?;
        }
        Ok(())
    }

    fn member_ids(&self, name: &str) -> Result<Vec<i64>> {
        Ok(self.members(name)?.into_iter().map(|e| e.pub_id).collect())
    }
}

impl<'a> PublistRepository for SqlitePublistRepository<'a> {
    fn replace(&self, name: &str, pub_ids: &[i64]) -> Result<()> {
        self.write_positions(name, pub_ids)
    }

    fn append(&self, name: &str, pub_ids: &[i64]) -> Result<usize> {
        let mut ids = self.member_ids(name)?;
        let before = ids.len();
        for pub_id in pub_ids {
            if !ids.contains(pub_id) {
                ids.push(*pub_id);
            }
        }

        let added = ids.len() - before;
        if added > 0 {
            self.write_positions(name, &ids)?;
        }
        Ok(added)
    }

    fn remove(&self, name: &str, pub_ids: &[i64]) -> Result<usize> {
        let ids = self.member_ids(name)?;
        let kept: Vec<i64> = ids
            .iter()
            .copied()
            .filter(|id| !pub_ids.contains(id))
            .collect();

        let removed = ids.len() - kept.len();
        if removed > 0 {
            self.write_positions(name, &kept)?;
        }
        Ok(removed)
    }

    fn members(&self, name: &str) -> Result<Vec<ListEntry>> {
        let mut stmt = self
            .conn
            .prepare("SELECT idx, pubid FROM publists WHERE name = ?1 ORDER BY idx")?;
        let rows = stmt.query_map(params![name], |row| {
            let idx: i64 = row.get(0)?;
            Ok(ListEntry {
                name: name.to_string(),
                position: idx as usize,
                pub_id: row.get(1)?,
            })
        })?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    fn names_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT name FROM publists WHERE substr(name, 1, ?2) = ?1 ORDER BY name",
        )?;
        let rows = stmt.query_map(params![prefix, prefix.len() as i64], |row| {
            row.get::<_, String>(0)
        })?;

        let mut names = Vec::new();
        for row in rows {
            names.push(row?);
        }
        Ok(names)
    }

    fn remove_pub_everywhere(&self, pub_id: i64) -> Result<()> {
        let affected: Vec<String> = {
            let mut stmt = self
                .conn
                .prepare("SELECT DISTINCT name FROM publists WHERE pubid = ?1")?;
            let rows = stmt.query_map(params![pub_id], |row| row.get::<_, String>(0))?;
            let mut names = Vec::new();
            for row in rows {
                names.push(row?);
            }
            names
        };

        for name in affected {
            self.remove(&name, &[pub_id])?;
        }
        Ok(())
    }
}
