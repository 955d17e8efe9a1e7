use std::sync::Arc;

use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    http::{
        HeaderValue, Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    middleware,
    response::IntoResponse,
};
use serde_json::json;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use terra_api::rate_limit::{self, RateLimitConfig, RateLimiter};
use terra_api::{AppState, api_router, with_security_headers};

use crate::config::Config;

const BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Prefixes advertised by the development hint.
const API_PREFIXES: &[&str] = &[
    "/api/auth",
    "/api/carbon",
    "/api/news",
    "/api/community",
    "/api/admin",
    "/api/health",
];

/// The complete HTTP application: API routes, front-end fallback and the
/// shared middleware stack.
pub fn build_app(config: &Config, state: AppState) -> Router {
    let mut api = api_router(state);
    if config.environment.is_production() {
        let limiter = Arc::new(RateLimiter::new(
            RateLimitConfig::new(config.rate_limit_max, config.rate_limit_window)
                .trust_proxy(config.trust_proxy),
        ));
        api = api.layer(middleware::from_fn_with_state(limiter, rate_limit::enforce));
        info!(
            "Rate limiting: {} requests per {}s per client (trust proxy: {})",
            config.rate_limit_max,
            config.rate_limit_window.as_secs(),
            config.trust_proxy
        );
    }

    let app = with_frontend(api, config);
    let app = with_security_headers(app);

    app.layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(cors(&config.client_urls))
        .layer(TraceLayer::new_for_http())
}

fn with_frontend(api: Router, config: &Config) -> Router {
    if !config.environment.is_production() {
        let frontend_url = config.frontend_url().to_string();
        return api.fallback(move || dev_hint(frontend_url.clone()));
    }

    let static_dir = &config.static_dir;
    if !static_dir.is_dir() {
        warn!(
            "Static directory {} not found; only the API will be served",
            static_dir.display()
        );
        return api;
    }

    info!("Serving front end from {}", static_dir.display());
    let index = ServeFile::new(static_dir.join("index.html"));
    api.fallback_service(ServeDir::new(static_dir).fallback(index))
}

async fn dev_hint(frontend_url: String) -> impl IntoResponse {
    Json(json!({
        "message": format!(
            "Terra API server running in development mode. Open the front end at {frontend_url}"
        ),
        "frontendUrl": frontend_url,
        "api": API_PREFIXES,
    }))
}

fn cors(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_credentials(true)
}
