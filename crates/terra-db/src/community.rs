use anyhow::Result;
use chrono::Utc;
use rusqlite::{Connection, Row};
use uuid::Uuid;

use terra_types::models::{Comment, Post, PostDetail, Role, VoteDirection};

use crate::Database;
use crate::models::{CommentOwner, OptionalExt, enum_column};

/// Posts joined with author name/role and the derived vote score.
const POST_SELECT: &str = "
    SELECT p.id, p.user_id, p.title, p.content, p.category, p.created_at, u.name,
           COALESCE((SELECT SUM(CASE v.vote_type WHEN 'up' THEN 1 ELSE -1 END)
                     FROM votes v WHERE v.post_id = p.id), 0),
           u.role
    FROM posts p
    JOIN users u ON p.user_id = u.id";

const COMMENT_SELECT: &str = "
    SELECT c.id, c.user_id, c.post_id, c.content, c.created_at, u.name, u.role
    FROM comments c
    JOIN users u ON c.user_id = u.id";

impl Database {
    // -- Posts --

    pub fn list_posts(&self, category: Option<&str>, limit: u32, offset: u32) -> Result<Vec<Post>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{POST_SELECT}
                 WHERE ?1 IS NULL OR p.category = ?1
                 ORDER BY p.created_at DESC, p.rowid DESC
                 LIMIT ?2 OFFSET ?3"
            ))?;
            let rows = stmt
                .query_map(rusqlite::params![category, limit, offset], |row| {
                    map_post_row(row).map(|(post, _)| post)
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    #[cfg(test)]
    pub fn get_post(&self, id: Uuid) -> Result<Option<Post>> {
        self.with_conn(|conn| Ok(query_post(conn, id)?.map(|(post, _)| post)))
    }

    /// A post with its author role and comments, oldest comment first.
    pub fn get_post_detail(&self, id: Uuid) -> Result<Option<PostDetail>> {
        self.with_conn(|conn| {
            let Some((post, author_role)) = query_post(conn, id)? else {
                return Ok(None);
            };

            let mut stmt = conn.prepare(&format!(
                "{COMMENT_SELECT}
                 WHERE c.post_id = ?1
                 ORDER BY c.created_at ASC, c.rowid ASC"
            ))?;
            let comments = stmt
                .query_map([id], map_comment_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(Some(PostDetail {
                post,
                author_role,
                comments,
            }))
        })
    }

    pub fn create_post(
        &self,
        id: Uuid,
        user_id: Uuid,
        title: &str,
        content: &str,
        category: &str,
    ) -> Result<Post> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO posts (id, user_id, title, content, category, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![id, user_id, title, content, category, Utc::now()],
            )?;
            query_post(conn, id)?
                .map(|(post, _)| post)
                .ok_or_else(|| anyhow::anyhow!("post {} missing after insert", id))
        })
    }

    pub fn update_post(
        &self,
        id: Uuid,
        title: &str,
        content: &str,
        category: &str,
    ) -> Result<Option<Post>> {
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE posts SET title = ?1, content = ?2, category = ?3 WHERE id = ?4",
                rusqlite::params![title, content, category, id],
            )?;
            if updated == 0 {
                return Ok(None);
            }
            Ok(query_post(conn, id)?.map(|(post, _)| post))
        })
    }

    /// Deletes the post; its comments and votes cascade.
    pub fn delete_post(&self, id: Uuid) -> Result<bool> {
        self.with_conn(|conn| Ok(conn.execute("DELETE FROM posts WHERE id = ?1", [id])? > 0))
    }

    pub fn post_owner(&self, id: Uuid) -> Result<Option<Uuid>> {
        self.with_conn(|conn| {
            conn.query_row("SELECT user_id FROM posts WHERE id = ?1", [id], |row| {
                row.get(0)
            })
            .optional()
        })
    }

    pub fn count_posts(&self) -> Result<i64> {
        self.with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM posts", [], |r| r.get(0))?))
    }

    // -- Comments --

    /// Returns `None` if the post does not exist.
    pub fn create_comment(
        &self,
        id: Uuid,
        user_id: Uuid,
        post_id: Uuid,
        content: &str,
    ) -> Result<Option<Comment>> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO comments (id, user_id, post_id, content, created_at)
                 SELECT ?1, ?2, p.id, ?4, ?5 FROM posts p WHERE p.id = ?3",
                rusqlite::params![id, user_id, post_id, content, Utc::now()],
            )?;
            if inserted == 0 {
                return Ok(None);
            }
            query_comment(conn, id)
        })
    }

    #[cfg(test)]
    pub fn get_comment(&self, id: Uuid) -> Result<Option<Comment>> {
        self.with_conn(|conn| query_comment(conn, id))
    }

    pub fn comment_owner(&self, id: Uuid) -> Result<Option<CommentOwner>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT user_id, post_id FROM comments WHERE id = ?1",
                [id],
                |row| {
                    Ok(CommentOwner {
                        user_id: row.get(0)?,
                        post_id: row.get(1)?,
                    })
                },
            )
            .optional()
        })
    }

    pub fn update_comment(&self, id: Uuid, content: &str) -> Result<Option<Comment>> {
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE comments SET content = ?1 WHERE id = ?2",
                rusqlite::params![content, id],
            )?;
            if updated == 0 {
                return Ok(None);
            }
            query_comment(conn, id)
        })
    }

    pub fn delete_comment(&self, id: Uuid) -> Result<bool> {
        self.with_conn(|conn| Ok(conn.execute("DELETE FROM comments WHERE id = ?1", [id])? > 0))
    }

    // -- Votes --

    /// Cast or change a vote in a single statement keyed by (user, post) and
    /// return the post's new score. Returns `None` if the post does not exist.
    pub fn upsert_vote(
        &self,
        user_id: Uuid,
        post_id: Uuid,
        direction: VoteDirection,
    ) -> Result<Option<i64>> {
        self.with_conn(|conn| {
            let written = conn.execute(
                "INSERT INTO votes (id, user_id, post_id, vote_type, created_at)
                 SELECT ?1, ?2, p.id, ?4, ?5 FROM posts p WHERE p.id = ?3
                 ON CONFLICT(user_id, post_id) DO UPDATE SET vote_type = excluded.vote_type",
                rusqlite::params![Uuid::new_v4(), user_id, post_id, direction.as_str(), Utc::now()],
            )?;
            if written == 0 {
                return Ok(None);
            }
            Ok(Some(query_vote_score(conn, post_id)?))
        })
    }

    pub fn get_vote(&self, user_id: Uuid, post_id: Uuid) -> Result<Option<VoteDirection>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT vote_type FROM votes WHERE user_id = ?1 AND post_id = ?2",
                rusqlite::params![user_id, post_id],
                |row| enum_column(row, 0),
            )
            .optional()
        })
    }
}

fn query_post(conn: &Connection, id: Uuid) -> Result<Option<(Post, Role)>> {
    conn.query_row(&format!("{POST_SELECT} WHERE p.id = ?1"), [id], map_post_row)
        .optional()
}

fn query_comment(conn: &Connection, id: Uuid) -> Result<Option<Comment>> {
    conn.query_row(&format!("{COMMENT_SELECT} WHERE c.id = ?1"), [id], map_comment_row)
        .optional()
}

fn query_vote_score(conn: &Connection, post_id: Uuid) -> Result<i64> {
    let score = conn.query_row(
        "SELECT COALESCE(SUM(CASE vote_type WHEN 'up' THEN 1 ELSE -1 END), 0)
         FROM votes WHERE post_id = ?1",
        [post_id],
        |row| row.get(0),
    )?;
    Ok(score)
}

fn map_post_row(row: &Row<'_>) -> rusqlite::Result<(Post, Role)> {
    Ok((
        Post {
            id: row.get(0)?,
            user_id: row.get(1)?,
            title: row.get(2)?,
            content: row.get(3)?,
            category: row.get(4)?,
            created_at: row.get(5)?,
            author_name: row.get(6)?,
            vote_score: row.get(7)?,
        },
        enum_column(row, 8)?,
    ))
}

fn map_comment_row(row: &Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: row.get(0)?,
        user_id: row.get(1)?,
        post_id: row.get(2)?,
        content: row.get(3)?,
        created_at: row.get(4)?,
        author_name: row.get(5)?,
        author_role: enum_column(row, 6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(db: &Database, email: &str) -> Uuid {
        let id = Uuid::new_v4();
        db.create_user(id, email, "h", email, Role::User).unwrap();
        id
    }

    #[test]
    fn post_lifecycle_with_comments() {
        let db = Database::open_in_memory().unwrap();
        let author = user(&db, "author@example.com");
        let reader = user(&db, "reader@example.com");

        let post = db
            .create_post(Uuid::new_v4(), author, "Bike lanes", "More please", "transport")
            .unwrap();
        assert_eq!(post.author_name, "author@example.com");
        assert_eq!(post.vote_score, 0);
        assert_eq!(db.post_owner(post.id).unwrap(), Some(author));

        let first = db
            .create_comment(Uuid::new_v4(), reader, post.id, "Agreed")
            .unwrap()
            .unwrap();
        let second = db
            .create_comment(Uuid::new_v4(), author, post.id, "Thanks")
            .unwrap()
            .unwrap();
        assert!(
            db.create_comment(Uuid::new_v4(), reader, Uuid::new_v4(), "orphan")
                .unwrap()
                .is_none()
        );

        let detail = db.get_post_detail(post.id).unwrap().unwrap();
        assert_eq!(detail.author_role, Role::User);
        let ids: Vec<Uuid> = detail.comments.iter().map(|c| c.id).collect();
        assert_eq!(ids, [first.id, second.id]);

        let owner = db.comment_owner(first.id).unwrap().unwrap();
        assert_eq!(owner.user_id, reader);
        assert_eq!(owner.post_id, post.id);

        let edited = db.update_comment(first.id, "Strongly agreed").unwrap().unwrap();
        assert_eq!(edited.content, "Strongly agreed");

        assert!(db.delete_post(post.id).unwrap());
        assert!(db.get_comment(second.id).unwrap().is_none(), "comments cascade");
        assert!(db.get_post_detail(post.id).unwrap().is_none());
    }

    #[test]
    fn list_posts_filters_by_category() {
        let db = Database::open_in_memory().unwrap();
        let author = user(&db, "lister@example.com");
        db.create_post(Uuid::new_v4(), author, "A", "a", "energy").unwrap();
        db.create_post(Uuid::new_v4(), author, "B", "b", "food").unwrap();
        let newest = db.create_post(Uuid::new_v4(), author, "C", "c", "energy").unwrap();

        let energy = db.list_posts(Some("energy"), 20, 0).unwrap();
        assert_eq!(energy.len(), 2);
        assert_eq!(energy[0].id, newest.id);
        assert_eq!(db.list_posts(None, 1, 0).unwrap().len(), 1);
        assert_eq!(db.count_posts().unwrap(), 3);
    }

    #[test]
    fn revote_overwrites_direction() {
        let db = Database::open_in_memory().unwrap();
        let author = user(&db, "v1@example.com");
        let voter = user(&db, "v2@example.com");
        let post = db.create_post(Uuid::new_v4(), author, "T", "c", "").unwrap();

        assert_eq!(db.upsert_vote(voter, post.id, VoteDirection::Up).unwrap(), Some(1));
        assert_eq!(db.upsert_vote(author, post.id, VoteDirection::Up).unwrap(), Some(2));
        assert_eq!(db.upsert_vote(voter, post.id, VoteDirection::Down).unwrap(), Some(0));
        assert_eq!(db.get_vote(voter, post.id).unwrap(), Some(VoteDirection::Down));

        let rows: i64 = db
            .with_conn(|conn| {
                Ok(conn.query_row(
                    "SELECT COUNT(*) FROM votes WHERE user_id = ?1 AND post_id = ?2",
                    rusqlite::params![voter, post.id],
                    |r| r.get(0),
                )?)
            })
            .unwrap();
        assert_eq!(rows, 1);

        assert_eq!(db.get_post(post.id).unwrap().unwrap().vote_score, 0);
        assert!(db.upsert_vote(voter, Uuid::new_v4(), VoteDirection::Up).unwrap().is_none());
    }
}
