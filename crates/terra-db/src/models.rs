//! Database-only row types and column helpers. Public-facing rows are
//! returned as `terra_types::models` values directly.

use std::str::FromStr;

use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::Row;
use rusqlite::types::Type;
use uuid::Uuid;

use terra_types::models::{Report, Role, User};

/// A user row including the credential hash; only the auth path needs it.
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            email: row.email,
            name: row.name,
            role: row.role,
            created_at: row.created_at,
        }
    }
}

/// Seed data for `news_articles`.
pub struct NewArticle<'a> {
    pub title: &'a str,
    pub summary: &'a str,
    pub source: &'a str,
    pub url: &'a str,
    pub category: &'a str,
    pub published_at: DateTime<Utc>,
}

/// Ownership of a comment and the post it hangs off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentOwner {
    pub user_id: Uuid,
    pub post_id: Uuid,
}

/// Result of filing a moderation report. The target checks and the insert
/// run under one connection lock.
#[derive(Debug)]
pub enum ReportFiling {
    Filed(Report),
    PostNotFound,
    UserNotFound,
}

/// Read a TEXT column into one of the closed string enums.
pub(crate) fn enum_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Extension trait for optional query results
pub(crate) trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
