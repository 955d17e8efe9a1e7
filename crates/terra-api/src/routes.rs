use axum::{
    Json, Router,
    http::{HeaderName, HeaderValue, StatusCode, header},
    middleware,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use serde_json::json;
use tower_http::set_header::SetResponseHeaderLayer;

use terra_types::api::MessageResponse;

use crate::auth::{self, AppState};
use crate::middleware::{require_admin, require_auth};
use crate::{admin, carbon, community, news};

/// Every REST route, rooted at `/api`. Unknown `/api/*` paths get a JSON 404
/// so the outer fallback (static files or the dev hint) never sees them.
pub fn api_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .merge(
            Router::new()
                .route("/me", get(auth::me))
                .route_layer(middleware::from_fn_with_state(state.clone(), require_auth)),
        );

    let carbon_routes = Router::new()
        .route("/entries", get(carbon::list_entries).post(carbon::create_entry))
        .route(
            "/entries/{entry_id}",
            put(carbon::update_entry).delete(carbon::delete_entry),
        )
        .route("/analytics", get(carbon::analytics))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let news_routes = Router::new()
        .route("/articles", get(news::list_articles))
        .route("/articles/{article_id}", get(news::get_article))
        .merge(
            Router::new()
                .route("/bookmarks", get(news::list_bookmarks).post(news::create_bookmark))
                .route("/bookmarks/{bookmark_id}", delete(news::delete_bookmark))
                .route_layer(middleware::from_fn_with_state(state.clone(), require_auth)),
        )
        .merge(
            Router::new()
                .route("/fetch-news", post(news::fetch_news))
                .route_layer(middleware::from_fn_with_state(state.clone(), require_admin))
                .route_layer(middleware::from_fn_with_state(state.clone(), require_auth)),
        );

    let community_routes = Router::new()
        .route("/posts", get(community::list_posts))
        .route("/posts/{post_id}", get(community::get_post))
        .merge(
            Router::new()
                .route("/posts", post(community::create_post))
                .route(
                    "/posts/{post_id}",
                    put(community::update_post).delete(community::delete_post),
                )
                .route("/comments", post(community::create_comment))
                .route(
                    "/comments/{comment_id}",
                    put(community::update_comment).delete(community::delete_comment),
                )
                .route("/votes", post(community::vote))
                .route("/reports", post(community::create_report))
                .route_layer(middleware::from_fn_with_state(state.clone(), require_auth)),
        );

    // Layers run outside-in: require_auth inserts the claims require_admin reads.
    let admin_routes = Router::new()
        .route("/stats", get(admin::stats))
        .route("/users", get(admin::list_users))
        .route("/users/{user_id}", delete(admin::delete_user))
        .route("/users/{user_id}/role", put(admin::update_user_role))
        .route("/reports", get(admin::list_reports))
        .route("/reports/{report_id}", put(admin::update_report))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let api = Router::new()
        .route("/health", get(health))
        .nest("/auth", auth_routes)
        .nest("/carbon", carbon_routes)
        .nest("/news", news_routes)
        .nest("/community", community_routes)
        .nest("/admin", admin_routes)
        .fallback(not_found)
        .with_state(state);

    Router::new().nest("/api", api)
}

/// Static security headers on every response, unless a handler set its own.
pub fn with_security_headers(router: Router) -> Router {
    let headers: [(HeaderName, &'static str); 5] = [
        (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
        (header::X_FRAME_OPTIONS, "SAMEORIGIN"),
        (header::REFERRER_POLICY, "no-referrer"),
        (
            HeaderName::from_static("cross-origin-resource-policy"),
            "cross-origin",
        ),
        (header::X_DNS_PREFETCH_CONTROL, "off"),
    ];

    headers.into_iter().fold(router, |router, (name, value)| {
        router.layer(SetResponseHeaderLayer::if_not_present(
            name,
            HeaderValue::from_static(value),
        ))
    })
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(MessageResponse::new("Route not found")),
    )
}
