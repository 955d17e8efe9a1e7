use axum::{Extension, extract::State, http::StatusCode, response::IntoResponse};
use chrono::{Months, NaiveDate, Utc};
use uuid::Uuid;

use terra_types::api::{CarbonAnalytics, CarbonEntryRequest, Claims, MessageResponse};
use terra_types::models::CarbonEntry;

use crate::auth::{AppState, blocking};
use crate::error::{ApiError, ApiResult};
use crate::extract::{Json, Path};

const MAX_CATEGORY_LEN: usize = 50;
/// Trailing window for the monthly series.
const ANALYTICS_MONTHS: u32 = 6;

pub async fn list_entries(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<Vec<CarbonEntry>>> {
    let entries = blocking(&state, move |db| db.list_carbon_entries(claims.sub)).await?;
    Ok(Json(entries))
}

pub async fn create_entry(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CarbonEntryRequest>,
) -> ApiResult<impl IntoResponse> {
    let category = validate_entry(&req)?;
    let date = req.date.unwrap_or_else(|| Utc::now().date_naive());
    let value = req.value;

    let entry = blocking(&state, move |db| {
        db.insert_carbon_entry(Uuid::new_v4(), claims.sub, &category, value, date)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn update_entry(
    State(state): State<AppState>,
    Path(entry_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CarbonEntryRequest>,
) -> ApiResult<Json<CarbonEntry>> {
    let category = validate_entry(&req)?;
    let (value, date) = (req.value, req.date);

    // Scoped to the caller's rows: someone else's entry looks like a missing one.
    let entry = blocking(&state, move |db| {
        db.update_carbon_entry(entry_id, claims.sub, &category, value, date)
    })
    .await?
    .ok_or(ApiError::NotFound("Carbon entry not found"))?;

    Ok(Json(entry))
}

pub async fn delete_entry(
    State(state): State<AppState>,
    Path(entry_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<MessageResponse>> {
    let deleted = blocking(&state, move |db| db.delete_carbon_entry(entry_id, claims.sub)).await?;
    if !deleted {
        return Err(ApiError::NotFound("Carbon entry not found"));
    }
    Ok(Json(MessageResponse::new("Carbon entry deleted successfully")))
}

pub async fn analytics(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<CarbonAnalytics>> {
    let since = window_start(Utc::now().date_naive());
    let summary = blocking(&state, move |db| db.carbon_analytics(claims.sub, since)).await?;
    Ok(Json(summary))
}

fn window_start(today: NaiveDate) -> NaiveDate {
    today
        .checked_sub_months(Months::new(ANALYTICS_MONTHS))
        .unwrap_or(NaiveDate::MIN)
}

/// Returns the trimmed category.
fn validate_entry(req: &CarbonEntryRequest) -> ApiResult<String> {
    let category = req.category.trim();
    if category.is_empty() || category.len() > MAX_CATEGORY_LEN {
        return Err(ApiError::bad_request("Category is required"));
    }
    if !req.value.is_finite() || req.value < 0.0 {
        return Err(ApiError::bad_request("Value must be a non-negative number"));
    }
    Ok(category.to_string())
}
