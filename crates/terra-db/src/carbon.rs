use anyhow::Result;
use chrono::{NaiveDate, Utc};
use rusqlite::Row;
use uuid::Uuid;

use terra_types::api::CarbonAnalytics;
use terra_types::carbon::calculate_emissions;
use terra_types::models::{CarbonEntry, CategoryTotal, MonthlyTotal};

use crate::Database;
use crate::models::OptionalExt;

const ENTRY_COLUMNS: &str = "id, user_id, category, value, calculated_emissions, date, created_at";

impl Database {
    /// Insert an entry. Emissions are derived here from (category, value)
    /// and are never taken from the caller.
    pub fn insert_carbon_entry(
        &self,
        id: Uuid,
        user_id: Uuid,
        category: &str,
        value: f64,
        date: NaiveDate,
    ) -> Result<CarbonEntry> {
        let emissions = calculate_emissions(category, value);
        self.with_conn(|conn| {
            let entry = conn.query_row(
                &format!(
                    "INSERT INTO carbon_entries (id, user_id, category, value, calculated_emissions, date, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                     RETURNING {ENTRY_COLUMNS}"
                ),
                rusqlite::params![id, user_id, category, value, emissions, date, Utc::now()],
                map_entry_row,
            )?;
            Ok(entry)
        })
    }

    pub fn list_carbon_entries(&self, user_id: Uuid) -> Result<Vec<CarbonEntry>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ENTRY_COLUMNS} FROM carbon_entries
                 WHERE user_id = ?1
                 ORDER BY date DESC, created_at DESC, rowid DESC"
            ))?;
            let rows = stmt
                .query_map([user_id], map_entry_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Update an entry owned by `user_id`, recomputing emissions. A `None`
    /// date keeps the stored one. Returns `None` if no such owned row exists.
    pub fn update_carbon_entry(
        &self,
        id: Uuid,
        user_id: Uuid,
        category: &str,
        value: f64,
        date: Option<NaiveDate>,
    ) -> Result<Option<CarbonEntry>> {
        let emissions = calculate_emissions(category, value);
        self.with_conn(|conn| {
            conn.query_row(
                &format!(
                    "UPDATE carbon_entries
                     SET category = ?1, value = ?2, calculated_emissions = ?3, date = COALESCE(?4, date)
                     WHERE id = ?5 AND user_id = ?6
                     RETURNING {ENTRY_COLUMNS}"
                ),
                rusqlite::params![category, value, emissions, date, id, user_id],
                map_entry_row,
            )
            .optional()
        })
    }

    pub fn delete_carbon_entry(&self, id: Uuid, user_id: Uuid) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute(
                "DELETE FROM carbon_entries WHERE id = ?1 AND user_id = ?2",
                rusqlite::params![id, user_id],
            )?;
            Ok(deleted > 0)
        })
    }

    /// Per-category and grand totals over all of the user's entries, plus
    /// per-month totals for entries dated on or after `since`.
    pub fn carbon_analytics(&self, user_id: Uuid, since: NaiveDate) -> Result<CarbonAnalytics> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT category, SUM(calculated_emissions)
                 FROM carbon_entries
                 WHERE user_id = ?1
                 GROUP BY category
                 ORDER BY category",
            )?;
            let total_by_category = stmt
                .query_map([user_id], |row| {
                    Ok(CategoryTotal {
                        category: row.get(0)?,
                        total_emissions: row.get(1)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            let mut stmt = conn.prepare(
                "SELECT strftime('%Y-%m', date) AS month, SUM(calculated_emissions)
                 FROM carbon_entries
                 WHERE user_id = ?1 AND date >= ?2
                 GROUP BY month
                 ORDER BY month",
            )?;
            let monthly_emissions = stmt
                .query_map(rusqlite::params![user_id, since], |row| {
                    Ok(MonthlyTotal {
                        month: row.get(0)?,
                        total_emissions: row.get(1)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            let total_footprint: Option<f64> = conn.query_row(
                "SELECT SUM(calculated_emissions) FROM carbon_entries WHERE user_id = ?1",
                [user_id],
                |row| row.get(0),
            )?;

            Ok(CarbonAnalytics {
                total_by_category,
                monthly_emissions,
                total_footprint: total_footprint.unwrap_or(0.0),
            })
        })
    }

    /// Distinct users with at least one entry dated `day`.
    pub fn count_active_users_on(&self, day: NaiveDate) -> Result<i64> {
        self.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT COUNT(DISTINCT user_id) FROM carbon_entries WHERE date = ?1",
                [day],
                |r| r.get(0),
            )?)
        })
    }
}

fn map_entry_row(row: &Row<'_>) -> rusqlite::Result<CarbonEntry> {
    Ok(CarbonEntry {
        id: row.get(0)?,
        user_id: row.get(1)?,
        category: row.get(2)?,
        value: row.get(3)?,
        calculated_emissions: row.get(4)?,
        date: row.get(5)?,
        created_at: row.get(6)?,
    })
}
