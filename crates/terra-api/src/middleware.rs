use axum::{
    Extension,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use jsonwebtoken::{DecodingKey, Validation, decode};

use terra_types::api::Claims;

use crate::auth::AppState;
use crate::authz;
use crate::error::ApiError;

/// Extract and validate the JWT from the Authorization header, then expose
/// its claims to handlers as `Extension<Claims>`.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let bearer = req
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or(ApiError::Unauthorized("Access denied. No token provided."))?;

    let claims = verify_token(&state.jwt_secret, bearer.token())
        .map_err(|_| ApiError::Unauthorized("Invalid token."))?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Admin-only guard. Must run after `require_auth`; the role is re-read from
/// the database so demotions apply to outstanding tokens.
pub async fn require_admin(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    authz::require_admin_role(&state, claims.sub).await?;
    Ok(next.run(req).await)
}

pub fn verify_token(secret: &str, token: &str) -> jsonwebtoken::errors::Result<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}
