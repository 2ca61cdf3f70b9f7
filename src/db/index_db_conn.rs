// src/db/index_db_conn.rs
use rusqlite::{Connection, Result};
use std::{env, fs, path::Path};

const SCHEMA: &str = r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS files (
        file_id          TEXT PRIMARY KEY,
        owner_address    TEXT NOT NULL,
        file_name        TEXT NOT NULL,
        file_type        TEXT NOT NULL,
        plaintext_size   INTEGER NOT NULL,
        envelope_version TEXT NOT NULL,
        current_address  TEXT NOT NULL,
        created_at       TEXT NOT NULL DEFAULT (datetime('now')),
        updated_at       TEXT
    );

    CREATE TABLE IF NOT EXISTS envelope_history (
        file_id         TEXT NOT NULL REFERENCES files(file_id) ON DELETE CASCADE,
        version         INTEGER NOT NULL,
        storage_address TEXT NOT NULL,
        created_at      TEXT NOT NULL DEFAULT (datetime('now')),
        superseded_at   TEXT,
        note            TEXT,
        PRIMARY KEY (file_id, version)
    );

    CREATE TABLE IF NOT EXISTS recipients (
        file_id TEXT NOT NULL REFERENCES files(file_id) ON DELETE CASCADE,
        address TEXT NOT NULL,
        PRIMARY KEY (file_id, address)
    );

    CREATE INDEX IF NOT EXISTS idx_files_owner ON files(owner_address);
    CREATE INDEX IF NOT EXISTS idx_recipients_address ON recipients(address);
    CREATE INDEX IF NOT EXISTS idx_history_address ON envelope_history(storage_address);

    -- Keep `files.current_address` pointing at the newest live envelope
    CREATE TRIGGER IF NOT EXISTS sync_current_envelope_after_insert
    AFTER INSERT ON envelope_history
    WHEN NEW.superseded_at IS NULL
    BEGIN
        UPDATE files
        SET current_address = NEW.storage_address,
            updated_at = CASE WHEN NEW.version > 1 THEN NEW.created_at ELSE updated_at END
        WHERE file_id = NEW.file_id;
    END;
"#;

fn init(conn: Connection) -> Result<Connection> {
    conn.execute_batch(SCHEMA)?;
    Ok(conn)
}

/// Open the share index at the configured path (`IRYSHARE_INDEX_DB` wins)
pub fn open_index_db() -> Result<Connection> {
    let config = crate::config::load();
    let db_path = env::var("IRYSHARE_INDEX_DB").unwrap_or_else(|_| config.paths.index_db.clone());
    open_index_db_at(db_path)
}

pub fn open_index_db_at<P: AsRef<Path>>(db_path: P) -> Result<Connection> {
    if let Some(parent) = db_path.as_ref().parent() {
        let _ = fs::create_dir_all(parent);
    }
    init(Connection::open(db_path)?)
}

pub fn open_index_db_in_memory() -> Result<Connection> {
    init(Connection::open_in_memory()?)
}
