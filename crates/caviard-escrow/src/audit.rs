// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Audit trail — append-only SQLite log of every redaction-relevant operation.
//
// Schema:
//   redaction_audit(
//     id            INTEGER PRIMARY KEY AUTOINCREMENT,
//     timestamp     TEXT    NOT NULL,   -- RFC 3339
//     action        TEXT    NOT NULL,   -- "apply", "restore", "restore-text", "export"
//     document_hash TEXT    NOT NULL,   -- SHA-256 hex of the document bytes
//     success       INTEGER NOT NULL,   -- 0 = failure, 1 = success
//     details       TEXT                -- optional free-form context
//   )

use std::path::Path;

use chrono::Utc;
use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use caviard_core::error::{CaviardError, Result};

fn db_err(e: rusqlite::Error) -> CaviardError {
    CaviardError::Database(e.to_string())
}

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS redaction_audit (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp     TEXT    NOT NULL,
    action        TEXT    NOT NULL,
    document_hash TEXT    NOT NULL,
    success       INTEGER NOT NULL,
    details       TEXT
);";

/// A single entry in the audit trail, used for queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: i64,
    pub timestamp: String,
    pub action: String,
    pub document_hash: String,
    pub success: bool,
    pub details: Option<String>,
}

/// Append-only audit trail backed by a SQLite database.
///
/// Every apply, restore, and export is recorded with a timestamp, action
/// verb, the SHA-256 hash of the document involved, and a success flag.
/// Escrow blobs, plaintext, and key material are never written here.
pub struct AuditTrail {
    conn: Connection,
}

impl AuditTrail {
    /// Open (or create) the audit database at `path`.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path).map_err(db_err)?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")
            .map_err(db_err)?;
        conn.execute_batch(SCHEMA).map_err(db_err)?;
        debug!("audit trail opened");
        Ok(Self { conn })
    }

    /// Open an in-memory audit database (useful for tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        conn.execute_batch(SCHEMA).map_err(db_err)?;
        debug!("in-memory audit trail opened");
        Ok(Self { conn })
    }

    /// Record a new audit entry.
    ///
    /// `action` is a short verb (`"apply"`, `"restore"`, `"export"`);
    /// `document_hash` is the SHA-256 hex digest of the document bytes the
    /// operation touched.
    #[instrument(skip(self, details), fields(%action, %document_hash, success))]
    pub fn record(
        &self,
        action: &str,
        document_hash: &str,
        success: bool,
        details: Option<&str>,
    ) -> Result<()> {
        let timestamp = Utc::now().to_rfc3339();
        let success_int: i32 = if success { 1 } else { 0 };

        self.conn
            .execute(
                "INSERT INTO redaction_audit (timestamp, action, document_hash, success, details)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![timestamp, action, document_hash, success_int, details],
            )
            .map_err(db_err)?;

        debug!("audit entry recorded");
        Ok(())
    }

    /// All entries for a given document hash, oldest first.
    pub fn entries_for_document(&self, document_hash: &str) -> Result<Vec<AuditEntry>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, timestamp, action, document_hash, success, details
                 FROM redaction_audit
                 WHERE document_hash = ?1
                 ORDER BY timestamp ASC",
            )
            .map_err(db_err)?;

        let rows = stmt
            .query_map(params![document_hash], row_to_entry)
            .map_err(db_err)?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row.map_err(db_err)?);
        }
        Ok(entries)
    }

    /// The most recent `limit` entries, newest first.
    pub fn recent_entries(&self, limit: u32) -> Result<Vec<AuditEntry>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, timestamp, action, document_hash, success, details
                 FROM redaction_audit
                 ORDER BY id DESC
                 LIMIT ?1",
            )
            .map_err(db_err)?;

        let rows = stmt.query_map(params![limit], row_to_entry).map_err(db_err)?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row.map_err(db_err)?);
        }
        Ok(entries)
    }

    /// Total number of entries in the trail.
    pub fn count(&self) -> Result<u64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM redaction_audit", [], |row| row.get(0))
            .map_err(db_err)
    }
}

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<AuditEntry> {
    Ok(AuditEntry {
        id: row.get(0)?,
        timestamp: row.get(1)?,
        action: row.get(2)?,
        document_hash: row.get(3)?,
        success: row.get::<_, i32>(4)? != 0,
        details: row.get(5)?,
    })
}
