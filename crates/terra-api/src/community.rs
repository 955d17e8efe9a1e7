use axum::{Extension, extract::State, http::StatusCode, response::IntoResponse};
use tracing::info;
use uuid::Uuid;

use terra_db::models::ReportFiling;
use terra_types::api::{
    Claims, CreateCommentRequest, CreateReportRequest, ListQuery, MessageResponse, PostRequest,
    UpdateCommentRequest, VoteRequest, VoteResponse,
};
use terra_types::models::{Comment, Post, PostDetail, VoteDirection};

use crate::auth::{AppState, blocking};
use crate::authz;
use crate::error::{ApiError, ApiResult};
use crate::extract::{Json, Path, Query};

const MAX_TITLE_LEN: usize = 200;
const MAX_BODY_LEN: usize = 20_000;
const MAX_REASON_LEN: usize = 1_000;

// -- Posts --

pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Post>>> {
    let category = query.category().map(str::to_string);
    let (limit, offset) = (query.limit(), query.offset());

    let posts = blocking(&state, move |db| {
        db.list_posts(category.as_deref(), limit, offset)
    })
    .await?;
    Ok(Json(posts))
}

pub async fn get_post(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
) -> ApiResult<Json<PostDetail>> {
    let post = blocking(&state, move |db| db.get_post_detail(post_id))
        .await?
        .ok_or(ApiError::NotFound("Post not found"))?;
    Ok(Json(post))
}

pub async fn create_post(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<PostRequest>,
) -> ApiResult<impl IntoResponse> {
    let req = validate_post(req)?;
    let post = blocking(&state, move |db| {
        db.create_post(Uuid::new_v4(), claims.sub, &req.title, &req.content, &req.category)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn update_post(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<PostRequest>,
) -> ApiResult<Json<Post>> {
    let req = validate_post(req)?;
    authz::authorize_post(&state, post_id, claims.sub).await?;

    let post = blocking(&state, move |db| {
        db.update_post(post_id, &req.title, &req.content, &req.category)
    })
    .await?
    .ok_or(ApiError::NotFound("Post not found"))?;

    Ok(Json(post))
}

pub async fn delete_post(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<MessageResponse>> {
    authz::authorize_post(&state, post_id, claims.sub).await?;

    if !blocking(&state, move |db| db.delete_post(post_id)).await? {
        return Err(ApiError::NotFound("Post not found"));
    }

    info!("Post {} deleted by {}", post_id, claims.sub);
    Ok(Json(MessageResponse::new("Post deleted successfully")))
}

// -- Comments --

pub async fn create_comment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateCommentRequest>,
) -> ApiResult<impl IntoResponse> {
    let content = validate_content(&req.content)?;
    let post_id = req.post_id;

    let comment = blocking(&state, move |db| {
        db.create_comment(Uuid::new_v4(), claims.sub, post_id, &content)
    })
    .await?
    .ok_or(ApiError::NotFound("Post not found"))?;

    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn update_comment(
    State(state): State<AppState>,
    Path(comment_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateCommentRequest>,
) -> ApiResult<Json<Comment>> {
    let content = validate_content(&req.content)?;
    authz::authorize_comment(&state, comment_id, claims.sub).await?;

    let comment = blocking(&state, move |db| db.update_comment(comment_id, &content))
        .await?
        .ok_or(ApiError::NotFound("Comment not found"))?;

    Ok(Json(comment))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Path(comment_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<MessageResponse>> {
    authz::authorize_comment(&state, comment_id, claims.sub).await?;

    if !blocking(&state, move |db| db.delete_comment(comment_id)).await? {
        return Err(ApiError::NotFound("Comment not found"));
    }
    Ok(Json(MessageResponse::new("Comment deleted successfully")))
}

// -- Votes --

pub async fn vote(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<VoteRequest>,
) -> ApiResult<Json<VoteResponse>> {
    let direction: VoteDirection = req
        .vote_type
        .parse()
        .map_err(|_| ApiError::bad_request("Invalid vote type. Use \"up\" or \"down\"."))?;
    let post_id = req.post_id;

    let vote_score = blocking(&state, move |db| db.upsert_vote(claims.sub, post_id, direction))
        .await?
        .ok_or(ApiError::NotFound("Post not found"))?;

    Ok(Json(VoteResponse {
        message: "Vote recorded successfully".into(),
        vote_score,
    }))
}

// -- Reports --

/// File a moderation report against a post, a user, or both. A post-only
/// report is attributed to the post's author.
pub async fn create_report(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateReportRequest>,
) -> ApiResult<impl IntoResponse> {
    let reason = req.reason.trim().to_string();
    if reason.is_empty() || reason.chars().count() > MAX_REASON_LEN {
        return Err(ApiError::bad_request("A reason is required"));
    }
    if req.post_id.is_none() && req.reported_user_id.is_none() {
        return Err(ApiError::bad_request("A post or user to report is required"));
    }

    let (post_id, reported_user_id) = (req.post_id, req.reported_user_id);
    let filing = blocking(&state, move |db| {
        db.file_report(Uuid::new_v4(), claims.sub, reported_user_id, post_id, &reason)
    })
    .await?;

    let report = match filing {
        ReportFiling::Filed(report) => report,
        ReportFiling::PostNotFound => return Err(ApiError::NotFound("Post not found")),
        ReportFiling::UserNotFound => return Err(ApiError::NotFound("User not found")),
    };

    info!("Report {} filed by {}", report.id, claims.sub);
    Ok((StatusCode::CREATED, Json(report)))
}

fn validate_post(mut req: PostRequest) -> ApiResult<PostRequest> {
    req.title = req.title.trim().to_string();
    req.category = req.category.trim().to_string();
    if req.title.is_empty() || req.title.chars().count() > MAX_TITLE_LEN {
        return Err(ApiError::bad_request("Title is required"));
    }
    req.content = validate_content(&req.content)?;
    Ok(req)
}

fn validate_content(content: &str) -> ApiResult<String> {
    let content = content.trim();
    if content.is_empty() || content.len() > MAX_BODY_LEN {
        return Err(ApiError::bad_request("Content is required"));
    }
    Ok(content.to_string())
}
