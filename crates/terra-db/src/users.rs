use anyhow::Result;
use chrono::Utc;
use rusqlite::{Connection, Row};
use uuid::Uuid;

use terra_types::models::{Role, User};

use crate::Database;
use crate::models::{OptionalExt, UserRow, enum_column};

const USER_COLUMNS: &str = "id, email, password_hash, name, role, created_at";

impl Database {
    /// Insert a user. Returns `None` when the email is already registered.
    pub fn create_user(
        &self,
        id: Uuid,
        email: &str,
        password_hash: &str,
        name: &str,
        role: Role,
    ) -> Result<Option<User>> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO users (id, email, password_hash, name, role, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(email) DO NOTHING",
                rusqlite::params![id, email, password_hash, name, role.as_str(), Utc::now()],
            )?;
            if inserted == 0 {
                return Ok(None);
            }
            Ok(query_user(conn, "id = ?1", id)?.map(User::from))
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email = ?1", email))
    }

    pub fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        self.with_conn(|conn| Ok(query_user(conn, "id = ?1", id)?.map(User::from)))
    }

    pub fn get_user_role(&self, id: Uuid) -> Result<Option<Role>> {
        self.with_conn(|conn| {
            conn.query_row("SELECT role FROM users WHERE id = ?1", [id], |row| {
                enum_column(row, 0)
            })
            .optional()
        })
    }

    pub fn list_users(&self) -> Result<Vec<User>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, rowid DESC"
            ))?;
            let rows = stmt
                .query_map([], map_user_row)?
                .map(|r| r.map(User::from))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn update_user_role(&self, id: Uuid, role: Role) -> Result<Option<User>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("UPDATE users SET role = ?1 WHERE id = ?2 RETURNING {USER_COLUMNS}"),
                rusqlite::params![role.as_str(), id],
                map_user_row,
            )
            .optional()
            .map(|row| row.map(User::from))
        })
    }

    /// Deletes the user; owned content goes with it via `ON DELETE CASCADE`.
    pub fn delete_user(&self, id: Uuid) -> Result<bool> {
        self.with_conn(|conn| Ok(conn.execute("DELETE FROM users WHERE id = ?1", [id])? > 0))
    }

    pub fn count_users(&self) -> Result<i64> {
        self.with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))?))
    }
}

fn query_user<P: rusqlite::ToSql>(
    conn: &Connection,
    predicate: &str,
    param: P,
) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE {predicate}"))?;
    stmt.query_row([param], map_user_row).optional()
}

fn map_user_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        email: row.get(1)?,
        password_hash: row.get(2)?,
        name: row.get(3)?,
        role: enum_column(row, 4)?,
        created_at: row.get(5)?,
    })
}
