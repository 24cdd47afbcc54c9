//! Database connection and initialization

use std::path::{Path, PathBuf};

use rusqlite::Connection;

use crate::{Error, Result};

/// Database handle
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database at the default location
    ///
    /// Location: `~/.local/share/campus/campus.db` on Linux
    pub fn open() -> Result<Self> {
        let path = Self::default_path()?;
        Self::open_at(&path)
    }

    /// Open or create database at a specific path
    pub fn open_at(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::InvalidData(format!("Failed to create database directory: {}", e))
            })?;
        }

        let conn = Connection::open(path)?;
        let mut db = Self { conn };
        db.initialize()?;
        tracing::debug!(path = %path.display(), "Database opened");
        Ok(db)
    }

    /// Create an in-memory database for testing
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let mut db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Get the default database path
    pub fn default_path() -> Result<PathBuf> {
        dirs::data_dir()
            .map(|p| p.join("campus").join("campus.db"))
            .ok_or_else(|| Error::InvalidData("Failed to determine data directory".to_string()))
    }

    /// Initialize database schema
    fn initialize(&mut self) -> Result<()> {
        self.conn.execute("PRAGMA foreign_keys = ON", [])?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                role TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_users_role ON users(role)",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS letter_requests (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                letter_type TEXT NOT NULL,
                title TEXT NOT NULL,
                purpose TEXT,
                status TEXT NOT NULL,
                workflow_stage TEXT NOT NULL,
                student_id INTEGER NOT NULL,
                assigned_to INTEGER,
                forwarded_by INTEGER,
                forwarded_at TEXT,
                wd1_approved_by INTEGER,
                wd1_approved_at TEXT,
                wd1_approval_notes TEXT,
                request_date TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (student_id) REFERENCES users(id),
                FOREIGN KEY (assigned_to) REFERENCES users(id),
                FOREIGN KEY (forwarded_by) REFERENCES users(id),
                FOREIGN KEY (wd1_approved_by) REFERENCES users(id)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_letter_requests_student
             ON letter_requests(student_id)",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_letter_requests_stage
             ON letter_requests(workflow_stage)",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS workflow_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                letter_request_id INTEGER NOT NULL,
                action TEXT NOT NULL,
                actor_id INTEGER NOT NULL,
                actor_role TEXT NOT NULL,
                notes TEXT,
                created_at TEXT NOT NULL,
                FOREIGN KEY (letter_request_id) REFERENCES letter_requests(id),
                FOREIGN KEY (actor_id) REFERENCES users(id)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_workflow_history_request
             ON workflow_history(letter_request_id, created_at, id)",
            [],
        )?;

        // History rows are append-only
        self.conn.execute(
            "CREATE TRIGGER IF NOT EXISTS workflow_history_no_update
             BEFORE UPDATE ON workflow_history
             BEGIN
                 SELECT RAISE(ABORT, 'workflow_history is append-only');
             END",
            [],
        )?;

        self.conn.execute(
            "CREATE TRIGGER IF NOT EXISTS workflow_history_no_delete
             BEFORE DELETE ON workflow_history
             BEGIN
                 SELECT RAISE(ABORT, 'workflow_history is append-only');
             END",
            [],
        )?;

        Ok(())
    }

    /// Get a reference to the underlying connection
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Run `f` inside a transaction, committing on success and rolling back on error
    pub fn in_transaction<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self.connection();

        conn.execute("BEGIN IMMEDIATE TRANSACTION", [])?;

        match f(conn) {
            Ok(value) => {
                conn.execute("COMMIT", [])?;
                Ok(value)
            }
            Err(e) => {
                conn.execute("ROLLBACK", [])?;
                Err(e)
            }
        }
    }
}
