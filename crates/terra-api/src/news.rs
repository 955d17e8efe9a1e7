use axum::{Extension, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use terra_db::models::NewArticle;
use terra_types::api::{BookmarkRequest, Claims, FetchNewsResponse, ListQuery, MessageResponse};
use terra_types::models::{Bookmark, NewsArticle};

use crate::auth::{AppState, blocking};
use crate::error::{ApiError, ApiResult};
use crate::extract::{Json, Path, Query};

/// (title, summary, url, source, category) seeded by `fetch_news`.
const SEED_ARTICLES: &[(&str, &str, &str, &str, &str)] = &[
    (
        "Global Temperatures Reach Record High",
        "Scientists report unprecedented global warming trends",
        "https://example.com/news1",
        "Climate News Network",
        "climate-science",
    ),
    (
        "Renewable Energy Investments Surge",
        "Solar and wind power investments exceed fossil fuels",
        "https://example.com/news2",
        "Green Energy Today",
        "renewable-energy",
    ),
    (
        "New Carbon Capture Technology Breakthrough",
        "Innovative method shows promise for reducing emissions",
        "https://example.com/news3",
        "Environmental Tech",
        "technology",
    ),
];

pub async fn list_articles(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<NewsArticle>>> {
    let category = query.category().map(str::to_string);
    let (limit, offset) = (query.limit(), query.offset());

    let articles = blocking(&state, move |db| {
        db.list_articles(category.as_deref(), limit, offset)
    })
    .await?;
    Ok(Json(articles))
}

pub async fn get_article(
    State(state): State<AppState>,
    Path(article_id): Path<Uuid>,
) -> ApiResult<Json<NewsArticle>> {
    let article = blocking(&state, move |db| db.get_article(article_id))
        .await?
        .ok_or(ApiError::NotFound("News article not found"))?;
    Ok(Json(article))
}

/// 201 for a new bookmark, 200 with the existing row for a repeat.
pub async fn create_bookmark(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<BookmarkRequest>,
) -> ApiResult<impl IntoResponse> {
    let (bookmark, created) = blocking(&state, move |db| {
        db.create_bookmark(Uuid::new_v4(), claims.sub, req.article_id)
    })
    .await?
    .ok_or(ApiError::NotFound("News article not found"))?;

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(bookmark)))
}

pub async fn list_bookmarks(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<Vec<Bookmark>>> {
    let bookmarks = blocking(&state, move |db| db.list_bookmarks(claims.sub)).await?;
    Ok(Json(bookmarks))
}

pub async fn delete_bookmark(
    State(state): State<AppState>,
    Path(bookmark_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<MessageResponse>> {
    let deleted = blocking(&state, move |db| db.delete_bookmark(bookmark_id, claims.sub)).await?;
    if !deleted {
        return Err(ApiError::NotFound("Bookmark not found"));
    }
    Ok(Json(MessageResponse::new("Bookmark removed successfully")))
}

/// Admin-only. Stores the fixed seed set; URLs already present are skipped.
pub async fn fetch_news(State(state): State<AppState>) -> ApiResult<Json<FetchNewsResponse>> {
    let inserted = blocking(&state, |db| {
        let published_at = Utc::now();
        let mut inserted: usize = 0;
        for &(title, summary, url, source, category) in SEED_ARTICLES {
            let article = NewArticle {
                title,
                summary,
                source,
                url,
                category,
                published_at,
            };
            if db.insert_article_if_absent(&article)? {
                inserted += 1;
            }
        }
        Ok(inserted)
    })
    .await?;

    info!("Seeded {} of {} news articles", inserted, SEED_ARTICLES.len());

    Ok(Json(FetchNewsResponse {
        message: "News articles fetched and stored successfully".into(),
        count: SEED_ARTICLES.len(),
        inserted,
    }))
}
