use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, de};
use uuid::Uuid;

use crate::models::{CategoryTotal, MonthlyTotal, Report, ReportSummary, Role, User};

// -- JWT Claims --

/// Bearer token claims. `role` reflects the account at issue time; admin
/// checks re-read the role from the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: Role,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

// -- Generic --

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// `?category=&limit=&offset=` for the paginated listings.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub category: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

pub const DEFAULT_PAGE_LIMIT: u32 = 20;
pub const MAX_PAGE_LIMIT: u32 = 100;

impl ListQuery {
    pub fn limit(&self) -> u32 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .clamp(1, MAX_PAGE_LIMIT)
    }

    pub fn offset(&self) -> u32 {
        self.offset.unwrap_or(0)
    }

    /// Empty `?category=` behaves like no filter.
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref().filter(|c| !c.is_empty())
    }
}

// -- Carbon --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CarbonEntryRequest {
    pub category: String,
    /// Form inputs post this as a string, so `"10"` is accepted as well as `10`.
    #[serde(deserialize_with = "number_or_numeric_string")]
    pub value: f64,
    pub date: Option<NaiveDate>,
}

fn number_or_numeric_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        String(String),
    }

    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::String(s) => s
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("value must be a number, got {s:?}"))),
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CarbonAnalytics {
    pub total_by_category: Vec<CategoryTotal>,
    pub monthly_emissions: Vec<MonthlyTotal>,
    pub total_footprint: f64,
}

// -- News --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BookmarkRequest {
    pub article_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FetchNewsResponse {
    pub message: String,
    /// Size of the seed set.
    pub count: usize,
    /// Articles actually inserted; URLs already present are skipped.
    pub inserted: usize,
}

// -- Community --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PostRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub category: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCommentRequest {
    pub post_id: Uuid,
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateCommentRequest {
    pub content: String,
}

/// `vote_type` stays a string so an unknown direction is a 400 with a
/// message rather than a body rejection.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VoteRequest {
    pub post_id: Uuid,
    pub vote_type: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VoteResponse {
    pub message: String,
    pub vote_score: i64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateReportRequest {
    pub post_id: Option<Uuid>,
    pub reported_user_id: Option<Uuid>,
    pub reason: String,
}

// -- Admin --

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub total_users: i64,
    pub active_today: i64,
    pub total_posts: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UsersResponse {
    pub users: Vec<User>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateRoleRequest {
    pub role: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateRoleResponse {
    pub message: String,
    pub user: User,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReportsResponse {
    pub reports: Vec<ReportSummary>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateReportRequest {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateReportResponse {
    pub message: String,
    pub report: Report,
}
