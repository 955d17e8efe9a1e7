use anyhow::Result;
use chrono::Utc;
use rusqlite::{Connection, Row};
use uuid::Uuid;

use terra_types::models::{Bookmark, NewsArticle};

use crate::Database;
use crate::models::{NewArticle, OptionalExt};

const ARTICLE_COLUMNS: &str = "id, title, summary, source, url, category, published_at";

impl Database {
    // -- Articles --

    pub fn list_articles(
        &self,
        category: Option<&str>,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<NewsArticle>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ARTICLE_COLUMNS} FROM news_articles
                 WHERE ?1 IS NULL OR category = ?1
                 ORDER BY published_at DESC, rowid DESC
                 LIMIT ?2 OFFSET ?3"
            ))?;
            let rows = stmt
                .query_map(rusqlite::params![category, limit, offset], map_article_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_article(&self, id: Uuid) -> Result<Option<NewsArticle>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {ARTICLE_COLUMNS} FROM news_articles WHERE id = ?1"),
                [id],
                map_article_row,
            )
            .optional()
        })
    }

    /// Insert an article unless its URL is already stored. Returns whether a
    /// row was written.
    pub fn insert_article_if_absent(&self, article: &NewArticle<'_>) -> Result<bool> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO news_articles (id, title, summary, source, url, category, published_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(url) DO NOTHING",
                rusqlite::params![
                    Uuid::new_v4(),
                    article.title,
                    article.summary,
                    article.source,
                    article.url,
                    article.category,
                    article.published_at,
                ],
            )?;
            Ok(inserted > 0)
        })
    }

    // -- Bookmarks --

    /// Bookmark an article for a user. Returns `None` if the article does not
    /// exist, otherwise the bookmark and whether it was newly created. A
    /// repeated bookmark returns the existing row.
    pub fn create_bookmark(
        &self,
        id: Uuid,
        user_id: Uuid,
        article_id: Uuid,
    ) -> Result<Option<(Bookmark, bool)>> {
        self.with_conn(|conn| {
            let exists: Option<Uuid> = conn
                .query_row(
                    "SELECT id FROM news_articles WHERE id = ?1",
                    [article_id],
                    |row| row.get(0),
                )
                .optional()?;
            if exists.is_none() {
                return Ok(None);
            }

            let inserted = conn.execute(
                "INSERT INTO bookmarks (id, user_id, article_id, created_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(user_id, article_id) DO NOTHING",
                rusqlite::params![id, user_id, article_id, Utc::now()],
            )?;

            let bookmark = query_bookmarks(
                conn,
                "b.user_id = ?1 AND b.article_id = ?2",
                rusqlite::params![user_id, article_id],
            )?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("bookmark vanished after insert"))?;

            Ok(Some((bookmark, inserted > 0)))
        })
    }

    pub fn list_bookmarks(&self, user_id: Uuid) -> Result<Vec<Bookmark>> {
        self.with_conn(|conn| query_bookmarks(conn, "b.user_id = ?1", [user_id]))
    }

    pub fn delete_bookmark(&self, id: Uuid, user_id: Uuid) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute(
                "DELETE FROM bookmarks WHERE id = ?1 AND user_id = ?2",
                rusqlite::params![id, user_id],
            )?;
            Ok(deleted > 0)
        })
    }
}

fn query_bookmarks<P: rusqlite::Params>(
    conn: &Connection,
    predicate: &str,
    params: P,
) -> Result<Vec<Bookmark>> {
    // JOIN articles so the listing carries title/source/url in one query
    let mut stmt = conn.prepare(&format!(
        "SELECT b.id, b.user_id, b.article_id, b.created_at, a.title, a.source, a.url, a.published_at
         FROM bookmarks b
         JOIN news_articles a ON b.article_id = a.id
         WHERE {predicate}
         ORDER BY b.created_at DESC, b.rowid DESC"
    ))?;

    let rows = stmt
        .query_map(params, |row| {
            Ok(Bookmark {
                id: row.get(0)?,
                user_id: row.get(1)?,
                article_id: row.get(2)?,
                created_at: row.get(3)?,
                title: row.get(4)?,
                source: row.get(5)?,
                url: row.get(6)?,
                published_at: row.get(7)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn map_article_row(row: &Row<'_>) -> rusqlite::Result<NewsArticle> {
    Ok(NewsArticle {
        id: row.get(0)?,
        title: row.get(1)?,
        summary: row.get(2)?,
        source: row.get(3)?,
        url: row.get(4)?,
        category: row.get(5)?,
        published_at: row.get(6)?,
    })
}
