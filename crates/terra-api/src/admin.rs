//! Admin dashboard handlers. Every route here sits behind `require_admin`.

use axum::{Extension, extract::State};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use terra_types::api::{
    AdminStats, Claims, MessageResponse, ReportsResponse, UpdateReportRequest,
    UpdateReportResponse, UpdateRoleRequest, UpdateRoleResponse, UsersResponse,
};
use terra_types::models::{ReportStatus, Role};

use crate::auth::{AppState, blocking};
use crate::error::{ApiError, ApiResult};
use crate::extract::{Json, Path};

pub async fn stats(State(state): State<AppState>) -> ApiResult<Json<AdminStats>> {
    let today = Utc::now().date_naive();
    let stats = blocking(&state, move |db| {
        Ok(AdminStats {
            total_users: db.count_users()?,
            active_today: db.count_active_users_on(today)?,
            total_posts: db.count_posts()?,
        })
    })
    .await?;
    Ok(Json(stats))
}

pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<UsersResponse>> {
    let users = blocking(&state, |db| db.list_users()).await?;
    Ok(Json(UsersResponse { users }))
}

pub async fn update_user_role(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateRoleRequest>,
) -> ApiResult<Json<UpdateRoleResponse>> {
    let role: Role = req
        .role
        .parse()
        .map_err(|_| ApiError::bad_request("Invalid role"))?;

    let user = blocking(&state, move |db| db.update_user_role(user_id, role))
        .await?
        .ok_or(ApiError::NotFound("User not found"))?;

    info!("User {} set role of {} to {}", claims.sub, user.id, role);
    Ok(Json(UpdateRoleResponse {
        message: "User role updated successfully".into(),
        user,
    }))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<MessageResponse>> {
    if !blocking(&state, move |db| db.delete_user(user_id)).await? {
        return Err(ApiError::NotFound("User not found"));
    }

    info!("User {} deleted user {}", claims.sub, user_id);
    Ok(Json(MessageResponse::new("User deleted successfully")))
}

pub async fn list_reports(State(state): State<AppState>) -> ApiResult<Json<ReportsResponse>> {
    let reports = blocking(&state, |db| db.list_report_summaries()).await?;
    Ok(Json(ReportsResponse { reports }))
}

pub async fn update_report(
    State(state): State<AppState>,
    Path(report_id): Path<Uuid>,
    Json(req): Json<UpdateReportRequest>,
) -> ApiResult<Json<UpdateReportResponse>> {
    let status: ReportStatus = req
        .status
        .parse()
        .map_err(|_| ApiError::bad_request("Invalid status"))?;

    let report = blocking(&state, move |db| db.update_report_status(report_id, status))
        .await?
        .ok_or(ApiError::NotFound("Report not found"))?;

    Ok(Json(UpdateReportResponse {
        message: "Report status updated successfully".into(),
        report,
    }))
}
