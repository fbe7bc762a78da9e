use rusqlite::Connection;

use crate::error::Result;

pub const SCHEMA_VERSION: u32 = 2;

pub fn apply_pragmas(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
        ",
    )?;
    Ok(())
}

pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version    INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS pubs (
            id       INTEGER PRIMARY KEY,
            abstract TEXT,
            arxiv    TEXT,
            bibcode  TEXT,
            doi      TEXT,
            keep     INTEGER NOT NULL DEFAULT 0,
            nfas     TEXT,
            refdata  TEXT NOT NULL DEFAULT '{}',
            title    TEXT,
            year     INTEGER
        );

        CREATE TABLE IF NOT EXISTS author_names (
            id   INTEGER PRIMARY KEY,
            name TEXT UNIQUE NOT NULL
        );

        CREATE TABLE IF NOT EXISTS authors (
            type   INTEGER NOT NULL,
            pubid  INTEGER NOT NULL REFERENCES pubs(id) ON DELETE CASCADE,
            idx    INTEGER NOT NULL,
            authid INTEGER NOT NULL REFERENCES author_names(id),
            PRIMARY KEY (type, pubid, idx)
        );

        CREATE TABLE IF NOT EXISTS nicknames (
            nickname TEXT PRIMARY KEY,
            pubid    INTEGER NOT NULL REFERENCES pubs(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS publists (
            name  TEXT NOT NULL,
            idx   INTEGER NOT NULL,
            pubid INTEGER NOT NULL REFERENCES pubs(id) ON DELETE CASCADE,
            PRIMARY KEY (name, idx)
        );

        CREATE TABLE IF NOT EXISTS history (
            date   TEXT NOT NULL,
            pubid  INTEGER NOT NULL REFERENCES pubs(id) ON DELETE CASCADE,
            action INTEGER NOT NULL
        );
        ",
    )?;
    Ok(())
}

pub fn create_indexes(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE INDEX IF NOT EXISTS idx_pubs_doi        ON pubs(doi);
        CREATE INDEX IF NOT EXISTS idx_pubs_bibcode    ON pubs(bibcode);
        CREATE INDEX IF NOT EXISTS idx_pubs_arxiv      ON pubs(arxiv);
        CREATE INDEX IF NOT EXISTS idx_pubs_nfas_year  ON pubs(nfas, year);
        CREATE INDEX IF NOT EXISTS idx_nicknames_pubid ON nicknames(pubid);
        CREATE INDEX IF NOT EXISTS idx_history_date    ON history(date);
        ",
    )?;
    Ok(())
}
