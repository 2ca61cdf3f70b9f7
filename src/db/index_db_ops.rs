//! Share index operations
//!
//! Records which envelope is current for each shared file, who it is shared
//! with, and the chain of superseded envelopes. Connection setup lives in
//! `index_db_conn`.

use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::address::Address;
use crate::enums::EnvelopeVersion;
use crate::error::{CoreError, Result};

/// A shared file as the index knows it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareRecord {
    pub file_id: String,
    pub owner_address: Address,
    pub file_name: String,
    pub file_type: String,
    pub plaintext_size: u64,
    pub envelope_version: EnvelopeVersion,
    pub current_address: String,
    pub created_at: String,
    pub updated_at: Option<String>,
}

/// One uploaded envelope in a file's history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub version: i64,
    pub storage_address: String,
    pub created_at: String,
    pub superseded_at: Option<String>,
    pub note: Option<String>,
}

/// Everything needed to index a first upload
#[derive(Debug, Clone)]
pub struct NewShare<'a> {
    pub file_id: &'a str,
    pub owner_address: &'a Address,
    pub file_name: &'a str,
    pub file_type: &'a str,
    pub plaintext_size: u64,
    pub envelope_version: EnvelopeVersion,
    pub storage_address: &'a str,
    pub recipients: &'a [Address],
}

const SHARE_COLUMNS: &str = "f.file_id, f.owner_address, f.file_name, f.file_type, \
     f.plaintext_size, f.envelope_version, f.current_address, f.created_at, f.updated_at";

fn conversion_error(idx: usize, err: CoreError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn share_from_row(row: &Row<'_>) -> rusqlite::Result<ShareRecord> {
    let owner: String = row.get(1)?;
    let version: String = row.get(5)?;
    Ok(ShareRecord {
        file_id: row.get(0)?,
        owner_address: Address::parse(&owner).map_err(|e| conversion_error(1, e))?,
        file_name: row.get(2)?,
        file_type: row.get(3)?,
        plaintext_size: row.get::<_, i64>(4)? as u64,
        envelope_version: version.parse().map_err(|e| conversion_error(5, e))?,
        current_address: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

fn insert_recipients(tx: &Connection, file_id: &str, recipients: &[Address]) -> rusqlite::Result<()> {
    let mut stmt =
        tx.prepare("INSERT OR IGNORE INTO recipients (file_id, address) VALUES (?1, ?2)")?;
    for address in recipients {
        stmt.execute(params![file_id, address.as_str()])?;
    }
    Ok(())
}

/// Index a first upload: file row, history version 1, recipient rows
pub fn record_share(conn: &mut Connection, share: &NewShare<'_>) -> Result<()> {
    let tx = conn.transaction()?;

    let exists: bool = tx.query_row(
        "SELECT EXISTS(SELECT 1 FROM files WHERE file_id = ?1)",
        [share.file_id],
        |row| row.get(0),
    )?;
    if exists {
        return Err(CoreError::AlreadyShared(share.file_id.to_string()));
    }

    tx.execute(
        r#"
        INSERT INTO files (
            file_id, owner_address, file_name, file_type,
            plaintext_size, envelope_version, current_address
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
        params![
            share.file_id,
            share.owner_address.as_str(),
            share.file_name,
            share.file_type,
            share.plaintext_size as i64,
            share.envelope_version.as_str(),
            share.storage_address,
        ],
    )?;
    tx.execute(
        "INSERT INTO envelope_history (file_id, version, storage_address, note)
         VALUES (?1, 1, ?2, 'initial')",
        params![share.file_id, share.storage_address],
    )?;
    insert_recipients(&tx, share.file_id, share.recipients)?;

    tx.commit()?;
    Ok(())
}

/// Record a superseding envelope atomically; returns the new history version
pub fn record_envelope_update(
    conn: &mut Connection,
    file_id: &str,
    storage_address: &str,
    envelope_version: EnvelopeVersion,
    recipients: &[Address],
    note: Option<&str>,
) -> Result<i64> {
    let tx = conn.transaction()?;

    let current_version: i64 = tx.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM envelope_history WHERE file_id = ?1",
        [file_id],
        |row| row.get(0),
    )?;
    if current_version == 0 {
        return Err(CoreError::NotFound(format!("share {file_id}")));
    }
    let new_version = current_version + 1;

    tx.execute(
        "UPDATE envelope_history SET superseded_at = datetime('now')
         WHERE file_id = ?1 AND version = ?2",
        params![file_id, current_version],
    )?;
    // the trigger moves files.current_address
    tx.execute(
        "INSERT INTO envelope_history (file_id, version, storage_address, note)
         VALUES (?1, ?2, ?3, ?4)",
        params![file_id, new_version, storage_address, note.unwrap_or("update")],
    )?;
    tx.execute(
        "UPDATE files SET envelope_version = ?2 WHERE file_id = ?1",
        params![file_id, envelope_version.as_str()],
    )?;
    tx.execute("DELETE FROM recipients WHERE file_id = ?1", [file_id])?;
    insert_recipients(&tx, file_id, recipients)?;

    tx.commit()?;
    Ok(new_version)
}

pub fn get_share(conn: &Connection, file_id: &str) -> Result<Option<ShareRecord>> {
    let record = conn
        .query_row(
            &format!("SELECT {SHARE_COLUMNS} FROM files f WHERE f.file_id = ?1"),
            [file_id],
            share_from_row,
        )
        .optional()?;
    Ok(record)
}

/// Storage address of the live envelope for `file_id`
pub fn current_address(conn: &Connection, file_id: &str) -> Result<Option<String>> {
    let address = conn
        .query_row(
            "SELECT current_address FROM files WHERE file_id = ?1",
            [file_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(address)
}

pub fn recipients_of(conn: &Connection, file_id: &str) -> Result<Vec<Address>> {
    let mut stmt =
        conn.prepare("SELECT address FROM recipients WHERE file_id = ?1 ORDER BY rowid")?;
    let rows = stmt.query_map([file_id], |row| {
        let raw: String = row.get(0)?;
        Address::parse(&raw).map_err(|e| conversion_error(0, e))
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn list_owned(conn: &Connection, owner: &Address) -> Result<Vec<ShareRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SHARE_COLUMNS} FROM files f WHERE f.owner_address = ?1 ORDER BY f.file_name"
    ))?;
    let rows = stmt.query_map([owner.as_str()], share_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Files someone else shared with `address`
pub fn list_shared_with(conn: &Connection, address: &Address) -> Result<Vec<ShareRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SHARE_COLUMNS} FROM files f
         JOIN recipients r ON r.file_id = f.file_id
         WHERE r.address = ?1
         ORDER BY f.file_name"
    ))?;
    let rows = stmt.query_map([address.as_str()], share_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn list_all(conn: &Connection) -> Result<Vec<ShareRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SHARE_COLUMNS} FROM files f ORDER BY f.file_name"
    ))?;
    let rows = stmt.query_map([], share_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Every envelope uploaded for `file_id`, oldest first
pub fn envelope_history(conn: &Connection, file_id: &str) -> Result<Vec<HistoryEntry>> {
    let mut stmt = conn.prepare(
        "SELECT version, storage_address, created_at, superseded_at, note
         FROM envelope_history WHERE file_id = ?1 ORDER BY version",
    )?;
    let rows = stmt.query_map([file_id], |row| {
        Ok(HistoryEntry {
            version: row.get(0)?,
            storage_address: row.get(1)?,
            created_at: row.get(2)?,
            superseded_at: row.get(3)?,
            note: row.get(4)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::index_db_conn::open_index_db_in_memory;

    fn addr(s: &str) -> Address {
        Address::parse(s).unwrap()
    }

    fn seed(conn: &mut Connection) {
        let owner = addr("alice");
        let recipients = [addr("bob")];
        record_share(
            conn,
            &NewShare {
                file_id: "f1",
                owner_address: &owner,
                file_name: "plan.md",
                file_type: "text/markdown",
                plaintext_size: 42,
                envelope_version: EnvelopeVersion::PerRecipient,
                storage_address: "addr-v1",
                recipients: &recipients,
            },
        )
        .unwrap();
    }

    #[test]
    fn record_share_indexes_file_history_and_recipients() {
        let mut conn = open_index_db_in_memory().unwrap();
        seed(&mut conn);

        let record = get_share(&conn, "f1").unwrap().unwrap();
        assert_eq!(record.owner_address, addr("alice"));
        assert_eq!(record.plaintext_size, 42);
        assert_eq!(record.envelope_version, EnvelopeVersion::PerRecipient);
        assert_eq!(record.current_address, "addr-v1");
        assert!(record.updated_at.is_none());

        let history = envelope_history(&conn, "f1").unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].note.as_deref(), Some("initial"));
        assert!(history[0].superseded_at.is_none());

        assert_eq!(recipients_of(&conn, "f1").unwrap(), vec![addr("bob")]);
    }

    #[test]
    fn duplicate_share_is_rejected() {
        let mut conn = open_index_db_in_memory().unwrap();
        seed(&mut conn);
        let owner = addr("alice");
        let err = record_share(
            &mut conn,
            &NewShare {
                file_id: "f1",
                owner_address: &owner,
                file_name: "plan.md",
                file_type: "text/markdown",
                plaintext_size: 42,
                envelope_version: EnvelopeVersion::SharedKey,
                storage_address: "other",
                recipients: &[],
            },
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::AlreadyShared(id) if id == "f1"));
    }

    #[test]
    fn update_supersedes_previous_envelope() {
        let mut conn = open_index_db_in_memory().unwrap();
        seed(&mut conn);

        let version = record_envelope_update(
            &mut conn,
            "f1",
            "addr-v2",
            EnvelopeVersion::SharedKey,
            &[addr("bob"), addr("carol")],
            Some("grant"),
        )
        .unwrap();
        assert_eq!(version, 2);

        let record = get_share(&conn, "f1").unwrap().unwrap();
        assert_eq!(record.current_address, "addr-v2");
        assert_eq!(record.envelope_version, EnvelopeVersion::SharedKey);
        assert!(record.updated_at.is_some());
        assert_eq!(current_address(&conn, "f1").unwrap().as_deref(), Some("addr-v2"));

        let history = envelope_history(&conn, "f1").unwrap();
        assert!(history[0].superseded_at.is_some());
        assert!(history[1].superseded_at.is_none());
        assert_eq!(history[1].note.as_deref(), Some("grant"));

        assert_eq!(list_shared_with(&conn, &addr("carol")).unwrap().len(), 1);
    }

    #[test]
    fn update_of_unknown_file_is_not_found() {
        let mut conn = open_index_db_in_memory().unwrap();
        let err = record_envelope_update(&mut conn, "ghost", "x", EnvelopeVersion::SharedKey, &[], None)
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[test]
    fn listings_split_owned_and_shared() {
        let mut conn = open_index_db_in_memory().unwrap();
        seed(&mut conn);

        assert_eq!(list_owned(&conn, &addr("alice")).unwrap().len(), 1);
        assert!(list_owned(&conn, &addr("bob")).unwrap().is_empty());
        assert_eq!(list_shared_with(&conn, &addr("bob")).unwrap()[0].file_id, "f1");
        assert!(list_shared_with(&conn, &addr("alice")).unwrap().is_empty());
        assert_eq!(list_all(&conn).unwrap().len(), 1);
        assert!(get_share(&conn, "missing").unwrap().is_none());
    }
}
