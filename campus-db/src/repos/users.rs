//! Repository for portal users

use rusqlite::{params, Row};

use crate::models::{decode_time, encode_time, UserRecord};
use crate::{Database, Error, Result};

const USER_COLUMNS: &str = "id, name, email, role, created_at";

/// Repository for managing user records
pub struct UserRepository<'db> {
    db: &'db Database,
}

impl<'db> UserRepository<'db> {
    /// Create a new repository instance
    pub fn new(db: &'db Database) -> Self {
        Self { db }
    }

    /// Insert a new user
    pub fn insert(&self, user: &UserRecord) -> Result<i64> {
        let conn = self.db.connection();

        conn.execute(
            "INSERT INTO users (name, email, role, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                user.name,
                user.email,
                user.role,
                encode_time(&user.created_at),
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// Find a user by ID
    pub fn find_by_id(&self, id: i64) -> Result<UserRecord> {
        let conn = self.db.connection();
        conn.query_row(
            &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
            params![id],
            Self::map_row,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                Error::NotFound(format!("User with id {} not found", id))
            }
            _ => Error::Sqlite(e),
        })
    }

    /// Find a user by email
    pub fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let conn = self.db.connection();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM users WHERE email = ?1",
            USER_COLUMNS
        ))?;

        let mut rows = stmt.query(params![email])?;

        if let Some(row) = rows.next()? {
            Ok(Some(Self::map_row(row)?))
        } else {
            Ok(None)
        }
    }

    /// Find all users holding a role
    pub fn find_by_role(&self, role: &str) -> Result<Vec<UserRecord>> {
        let conn = self.db.connection();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM users WHERE role = ?1 ORDER BY id ASC",
            USER_COLUMNS
        ))?;

        let users = stmt
            .query_map(params![role], Self::map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(users)
    }

    /// Find all users
    pub fn find_all(&self) -> Result<Vec<UserRecord>> {
        let conn = self.db.connection();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM users ORDER BY id ASC",
            USER_COLUMNS
        ))?;

        let users = stmt
            .query_map([], Self::map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(users)
    }

    /// Count users
    pub fn count(&self) -> Result<i64> {
        let conn = self.db.connection();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count)
    }

    fn map_row(row: &Row) -> rusqlite::Result<UserRecord> {
        let created_at: String = row.get(4)?;

        Ok(UserRecord {
            id: Some(row.get(0)?),
            name: row.get(1)?,
            email: row.get(2)?,
            role: row.get(3)?,
            created_at: decode_time(4, &created_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_db() -> Database {
        Database::in_memory().unwrap()
    }

    #[test]
    fn test_insert_and_find_by_id() {
        let db = setup_db();
        let repo = UserRepository::new(&db);

        let id = repo
            .insert(&UserRecord::new("Budi", "budi@example.ac.id", "admin_umum"))
            .unwrap();

        let user = repo.find_by_id(id).unwrap();
        assert_eq!(user.id, Some(id));
        assert_eq!(user.name, "Budi");
        assert_eq!(user.role, "admin_umum");
    }

    #[test]
    fn test_find_by_id_missing() {
        let db = setup_db();
        let repo = UserRepository::new(&db);

        match repo.find_by_id(404) {
            Err(Error::NotFound(msg)) => assert!(msg.contains("404")),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_email_is_unique() {
        let db = setup_db();
        let repo = UserRepository::new(&db);

        repo.insert(&UserRecord::new("A", "same@example.ac.id", "student"))
            .unwrap();
        let result = repo.insert(&UserRecord::new("B", "same@example.ac.id", "lecturer"));
        assert!(result.is_err());
    }

    #[test]
    fn test_find_by_email_and_role() {
        let db = setup_db();
        let repo = UserRepository::new(&db);

        repo.insert(&UserRecord::new("A", "a@example.ac.id", "student"))
            .unwrap();
        repo.insert(&UserRecord::new("B", "b@example.ac.id", "student"))
            .unwrap();
        repo.insert(&UserRecord::new("C", "c@example.ac.id", "wd1"))
            .unwrap();

        let found = repo.find_by_email("c@example.ac.id").unwrap().unwrap();
        assert_eq!(found.role, "wd1");
        assert!(repo.find_by_email("nobody@example.ac.id").unwrap().is_none());

        assert_eq!(repo.find_by_role("student").unwrap().len(), 2);
        assert_eq!(repo.find_all().unwrap().len(), 3);
        assert_eq!(repo.count().unwrap(), 3);
    }
}
