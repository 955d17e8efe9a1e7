use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id              BLOB PRIMARY KEY,
                email           TEXT NOT NULL UNIQUE,
                password_hash   TEXT NOT NULL,
                name            TEXT NOT NULL,
                role            TEXT NOT NULL DEFAULT 'user'
                                CHECK (role IN ('user', 'moderator', 'admin')),
                created_at      TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE carbon_entries (
                id                      BLOB PRIMARY KEY,
                user_id                 BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                category                TEXT NOT NULL,
                value                   REAL NOT NULL,
                calculated_emissions    REAL NOT NULL,
                date                    TEXT NOT NULL,
                created_at              TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_carbon_entries_user_date
                ON carbon_entries(user_id, date);

            CREATE TABLE news_articles (
                id              BLOB PRIMARY KEY,
                title           TEXT NOT NULL,
                summary         TEXT NOT NULL,
                source          TEXT NOT NULL,
                url             TEXT NOT NULL UNIQUE,
                category        TEXT NOT NULL,
                published_at    TEXT NOT NULL
            );

            CREATE INDEX idx_news_articles_published
                ON news_articles(published_at);

            CREATE TABLE bookmarks (
                id          BLOB PRIMARY KEY,
                user_id     BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                article_id  BLOB NOT NULL REFERENCES news_articles(id) ON DELETE CASCADE,
                created_at  TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE (user_id, article_id)
            );

            CREATE TABLE posts (
                id          BLOB PRIMARY KEY,
                user_id     BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                title       TEXT NOT NULL,
                content     TEXT NOT NULL,
                category    TEXT NOT NULL DEFAULT '',
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_posts_created
                ON posts(created_at);

            CREATE TABLE comments (
                id          BLOB PRIMARY KEY,
                user_id     BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                post_id     BLOB NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
                content     TEXT NOT NULL,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_comments_post
                ON comments(post_id, created_at);

            CREATE TABLE votes (
                id          BLOB PRIMARY KEY,
                user_id     BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                post_id     BLOB NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
                vote_type   TEXT NOT NULL CHECK (vote_type IN ('up', 'down')),
                created_at  TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE (user_id, post_id)
            );

            CREATE TABLE reports (
                id                  BLOB PRIMARY KEY,
                reporter_user_id    BLOB REFERENCES users(id) ON DELETE SET NULL,
                reported_user_id    BLOB REFERENCES users(id) ON DELETE SET NULL,
                post_id             BLOB REFERENCES posts(id) ON DELETE SET NULL,
                reason              TEXT NOT NULL,
                status              TEXT NOT NULL DEFAULT 'pending'
                                    CHECK (status IN ('pending', 'reviewed', 'resolved')),
                created_at          TEXT NOT NULL DEFAULT (datetime('now'))
            );

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
