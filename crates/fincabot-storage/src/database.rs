// SPDX-FileCopyrightText: 2026 Fincabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background
//! thread. Do NOT create additional Connection instances for writes; the
//! event deduplicator's atomicity depends on the single writer.

use fincabot_core::FincabotError;
use tokio_rusqlite::Connection;
use tracing::debug;

/// Handle to the SQLite database.
///
/// Cheap to clone; all clones share the same background connection thread.
#[derive(Clone)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database at `path`, applying PRAGMAs and running
    /// pending migrations.
    pub async fn open(path: &str) -> Result<Self, FincabotError> {
        let conn = Connection::open(path)
            .await
            .map_err(|e| map_tr_err(tokio_rusqlite::Error::from(e)))?;
        conn.call(|conn| -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            conn.pragma_update(None, "journal_mode", "WAL")?;
            conn.pragma_update(None, "foreign_keys", "ON")?;
            conn.pragma_update(None, "busy_timeout", 5000)?;
            crate::migrations::run_migrations(conn)?;
            Ok(())
        })
        .await
        .map_err(map_tr_err_boxed)?;
        debug!(path, "database opened");
        Ok(Self { conn })
    }

    /// Returns the underlying tokio-rusqlite connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Checkpoint the WAL and close the connection.
    pub async fn close(self) -> Result<(), FincabotError> {
        self.conn
            .call(|conn| {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        self.conn.close().await.map_err(map_tr_err)?;
        debug!("database closed");
        Ok(())
    }
}

/// Map a tokio-rusqlite error into the storage error variant.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error) -> FincabotError {
    FincabotError::Storage {
        source: Box::new(e),
    }
}

/// Map a tokio-rusqlite error carrying an application-specific boxed error
/// into the storage error variant.
pub(crate) fn map_tr_err_boxed(
    e: tokio_rusqlite::Error<Box<dyn std::error::Error + Send + Sync>>,
) -> FincabotError {
    FincabotError::Storage {
        source: e.to_string().into(),
    }
}
