use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, params};

use crate::error::Result;
use crate::models::{HistoryAction, HistoryEntry};

pub trait HistoryRepository {
    fn log(&self, pub_id: i64, action: HistoryAction) -> Result<()>;
    fn for_pub(&self, pub_id: i64) -> Result<Vec<HistoryEntry>>;
    fn delete_for_pub(&self, pub_id: i64) -> Result<()>;
}

pub struct SqliteHistoryRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteHistoryRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl<'a> HistoryRepository for SqliteHistoryRepository<'a> {
    fn log(&self, pub_id: i64, action: HistoryAction) -> Result<()> {
        self.conn.execute(
            "INSERT INTO history (date, pubid, action) VALUES (?1, ?2, ?3)",
            params![
                Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
                pub_id,
                action.code()
            ],
        )?;
        Ok(())
    }

    fn for_pub(&self, pub_id: i64) -> Result<Vec<HistoryEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT date, action FROM history WHERE pubid = ?1 ORDER BY date DESC, rowid DESC",
        )?;
        let rows = stmt.query_map(params![pub_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (date_str, code) = row?;
            let Some(action) = HistoryAction::from_code(code) else {
                continue;
            };
            let date = DateTime::parse_from_rfc3339(&date_str)
                .map(|d| d.with_timezone(&Utc))
                .unwrap_or_default();
            entries.push(HistoryEntry {
                date,
                pub_id,
                action,
            });
        }
        Ok(entries)
    }

    fn delete_for_pub(&self, pub_id: i64) -> Result<()> {
        self.conn
            .execute("DELETE FROM history WHERE pubid = ?1", params![pub_id])?;
        Ok(())
    }
}
