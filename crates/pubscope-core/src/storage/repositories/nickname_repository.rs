use rusqlite::{Connection, ErrorCode, params};

use crate::error::{CoreError, Result};

pub trait NicknameRepository {
    fn add(&self, pub_id: i64, nickname: &str) -> Result<()>;
    fn list_for(&self, pub_id: i64) -> Result<Vec<String>>;
    /// Shortest nickname of a publication; ties go to the alphabetically first.
    fn shortest(&self, pub_id: i64) -> Result<Option<String>>;
    fn delete_for_pub(&self, pub_id: i64) -> Result<()>;
}

pub struct SqliteNicknameRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteNicknameRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl<'a> NicknameRepository for SqliteNicknameRepository<'a> {
    fn add(&self, pub_id: i64, nickname: &str) -> Result<()> {
        let inserted = self.conn.execute(
            "INSERT INTO nicknames (nickname, pubid) VALUES (?1, ?2)",
            params![nickname, pub_id],
        );

        match inserted {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                Err(CoreError::DuplicateNickname(nickname.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn list_for(&self, pub_id: i64) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT nickname FROM nicknames WHERE pubid = ?1 ORDER BY nickname")?;
        let rows = stmt.query_map(params![pub_id], |row| row.get::<_, String>(0))?;

        let mut nicks = Vec::new();
        for row in rows {
            nicks.push(row?);
        }
        Ok(nicks)
    }

    fn shortest(&self, pub_id: i64) -> Result<Option<String>> {
        let nicks = self.list_for(pub_id)?;
        Ok(nicks.into_iter().min_by_key(|n| n.chars().count()))
    }

    fn delete_for_pub(&self, pub_id: i64) -> Result<()> {
        self.conn
            .execute("DELETE FROM nicknames WHERE pubid = ?1", params![pub_id])?;
        Ok(())
    }
}
