use rusqlite::Connection;
use std::path::Path;

use crate::error::Result;

pub fn open_db(db_path: &Path) -> Result<Connection> {
    if let Some(dir) = db_path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)?;
        }
    }
    let conn = Connection::open(db_path)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;
    init_schema(&conn)?;
    Ok(conn)
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS edition(
            year            INTEGER PRIMARY KEY,
            committee       TEXT,
            committee_img   TEXT,
            presenters      TEXT,
            presenters_img  TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS category(
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            name        TEXT    NOT NULL,
            name_welsh  TEXT
        )",
        [],
    )?;

    // Competition ids are text: legacy numeric ids are stringified on import
    // and backfill clones use "{year}-{originalId}".
    conn.execute(
        "CREATE TABLE IF NOT EXISTS competition(
            id          TEXT    PRIMARY KEY,
            category_id INTEGER NOT NULL REFERENCES category(id),
            description TEXT,
            language    TEXT    CHECK(language IN ('Welsh','Spanish','English','German','Polish','French','Portuguese','Italian','Other')),
            year        INTEGER NOT NULL REFERENCES edition(year),
            type        TEXT    NOT NULL CHECK(type IN ('GRU','IND')),
            extra_text  TEXT,
            rank        INTEGER DEFAULT 0,
            preliminary TEXT
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_competition_year ON competition(year)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS participant(
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            name         TEXT    NOT NULL,
            surname      TEXT,
            document_id  TEXT,
            birth_date   TEXT,
            nationality  TEXT,
            residence    TEXT,
            email        TEXT,
            phone        TEXT,
            type         TEXT    NOT NULL CHECK(type IN ('IND','GRU')),
            active       INTEGER NOT NULL DEFAULT 1
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS registration(
            id             INTEGER PRIMARY KEY AUTOINCREMENT,
            participant_id INTEGER NOT NULL REFERENCES participant(id),
            competition_id TEXT    NOT NULL REFERENCES competition(id),
            pseudonym      TEXT,
            registered_at  TEXT    DEFAULT (date('now')),
            year           INTEGER NOT NULL,
            dropped        INTEGER NOT NULL DEFAULT 0
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_registration_year ON registration(year)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_registration_competition ON registration(competition_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS work(
            id             INTEGER PRIMARY KEY AUTOINCREMENT,
            participant_id INTEGER NOT NULL REFERENCES participant(id),
            display_name   TEXT,
            placement      TEXT    CHECK(placement IN ('1','2','3','mention')),
            competition_id TEXT    NOT NULL REFERENCES competition(id),
            title          TEXT    NOT NULL,
            date           TEXT    DEFAULT (datetime('now')),
            video_url      TEXT,
            photo_url      TEXT
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_work_competition ON work(competition_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS upload(
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            year        INTEGER NOT NULL REFERENCES edition(year),
            filename    TEXT    NOT NULL,
            description TEXT
        )",
        [],
    )?;

    Ok(())
}

/// Suspends foreign-key enforcement for the duration of an import pass.
/// Enforcement comes back when the guard drops, on success and on error
/// alike. Must be acquired outside any open transaction: SQLite ignores the
/// pragma while one is active.
pub struct FkGuard<'c> {
    conn: &'c Connection,
}

impl<'c> FkGuard<'c> {
    pub fn suspend(conn: &'c Connection) -> rusqlite::Result<Self> {
        conn.execute("PRAGMA foreign_keys = OFF", [])?;
        Ok(FkGuard { conn })
    }
}

impl Drop for FkGuard<'_> {
    fn drop(&mut self) {
        let _ = self.conn.execute("PRAGMA foreign_keys = ON", []);
    }
}

pub fn foreign_keys_enabled(conn: &Connection) -> rusqlite::Result<bool> {
    conn.query_row("PRAGMA foreign_keys", [], |row| row.get::<_, i64>(0))
        .map(|v| v != 0)
}
