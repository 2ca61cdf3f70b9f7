// src/export/json.rs
use std::path::Path;

use chrono::Utc;
use rusqlite::Connection;
use serde_json::json;
use tracing::info;

use crate::consts::EXPORT_FORMAT;
use crate::db::{envelope_history, list_all, recipients_of};
use crate::error::Result;

/// Export the whole share index (files, recipients, envelope history) to JSON.
///
/// Envelopes carry their own key material; the index never does, so this
/// file holds no secrets. Returns the number of files exported.
pub fn export_to_json<P: AsRef<Path>>(conn: &Connection, path: P) -> Result<usize> {
    let mut files = Vec::new();

    for share in list_all(conn)? {
        let recipients: Vec<String> = recipients_of(conn, &share.file_id)?
            .into_iter()
            .map(String::from)
            .collect();

        let history: Vec<_> = envelope_history(conn, &share.file_id)?
            .into_iter()
            .map(|entry| {
                json!({
                    "version": entry.version,
                    "storage_address": entry.storage_address,
                    "created_at": entry.created_at,
                    "superseded_at": entry.superseded_at,
                    "note": entry.note,
                })
            })
            .collect();

        files.push(json!({
            "file_id": share.file_id,
            "owner_address": share.owner_address.as_str(),
            "file_name": share.file_name,
            "file_type": share.file_type,
            "plaintext_size_bytes": share.plaintext_size,
            "envelope_version": share.envelope_version.as_str(),
            "current_address": share.current_address,
            "created_at": share.created_at,
            "updated_at": share.updated_at,
            "recipients": recipients,
            "history": history,
        }));
    }

    let total = files.len();
    let export = json!({
        "export_format": EXPORT_FORMAT,
        "exported_at": Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        "exporter_version": env!("CARGO_PKG_VERSION"),
        "total_files": total,
        "files": files,
    });

    std::fs::write(path.as_ref(), serde_json::to_string_pretty(&export)?)?;
    info!(total, path = %path.as_ref().display(), "exported share index");

    Ok(total)
}
