use anyhow::Result;
use chrono::Utc;
use rusqlite::Row;
use uuid::Uuid;

use terra_types::models::{Report, ReportStatus, ReportSummary};

use crate::Database;
use crate::models::{OptionalExt, ReportFiling, enum_column};

const REPORT_COLUMNS: &str = "id, reporter_user_id, reported_user_id, post_id, reason, status, created_at";

impl Database {
    /// File a report against a post, a user, or both. A post-only report
    /// targets the post's author.
    pub fn file_report(
        &self,
        id: Uuid,
        reporter: Uuid,
        reported_user: Option<Uuid>,
        post: Option<Uuid>,
        reason: &str,
    ) -> Result<ReportFiling> {
        self.with_conn(|conn| {
            let post_author = match post {
                Some(post_id) => {
                    let author: Option<Uuid> = conn
                        .query_row("SELECT user_id FROM posts WHERE id = ?1", [post_id], |row| {
                            row.get(0)
                        })
                        .optional()?;
                    match author {
                        Some(author) => Some(author),
                        None => return Ok(ReportFiling::PostNotFound),
                    }
                }
                None => None,
            };

            if let Some(user_id) = reported_user {
                let exists: Option<i64> = conn
                    .query_row("SELECT 1 FROM users WHERE id = ?1", [user_id], |row| row.get(0))
                    .optional()?;
                if exists.is_none() {
                    return Ok(ReportFiling::UserNotFound);
                }
            }

            let report = conn.query_row(
                &format!(
                    "INSERT INTO reports (id, reporter_user_id, reported_user_id, post_id, reason, status, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                     RETURNING {REPORT_COLUMNS}"
                ),
                rusqlite::params![
                    id,
                    reporter,
                    reported_user.or(post_author),
                    post,
                    reason,
                    ReportStatus::Pending.as_str(),
                    Utc::now(),
                ],
                map_report_row,
            )?;
            Ok(ReportFiling::Filed(report))
        })
    }

    /// Moderation queue, newest first, with reporter/reported names and the
    /// post title resolved. Labels are `None` once the referenced row is gone.
    pub fn list_report_summaries(&self) -> Result<Vec<ReportSummary>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT r.id, r.reason, r.status, r.created_at,
                        reporter.name, reported.name, p.title
                 FROM reports r
                 LEFT JOIN users reporter ON r.reporter_user_id = reporter.id
                 LEFT JOIN users reported ON r.reported_user_id = reported.id
                 LEFT JOIN posts p ON r.post_id = p.id
                 ORDER BY r.created_at DESC, r.rowid DESC",
            )?;

            let rows = stmt
                .query_map([], |row| {
                    Ok(ReportSummary {
                        id: row.get(0)?,
                        reason: row.get(1)?,
                        status: enum_column(row, 2)?,
                        created_at: row.get(3)?,
                        reporter_name: row.get(4)?,
                        reported_name: row.get(5)?,
                        post_title: row.get(6)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Set a report's status. Any status may follow any other.
    pub fn update_report_status(&self, id: Uuid, status: ReportStatus) -> Result<Option<Report>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("UPDATE reports SET status = ?1 WHERE id = ?2 RETURNING {REPORT_COLUMNS}"),
                rusqlite::params![status.as_str(), id],
                map_report_row,
            )
            .optional()
        })
    }
}

fn map_report_row(row: &Row<'_>) -> rusqlite::Result<Report> {
    Ok(Report {
        id: row.get(0)?,
        reporter_user_id: row.get(1)?,
        reported_user_id: row.get(2)?,
        post_id: row.get(3)?,
        reason: row.get(4)?,
        status: enum_column(row, 5)?,
        created_at: row.get(6)?,
    })
}
