//! Ownership and role checks for mutating community content.
//!
//! Both checks resolve the target row first, so a missing resource is a 404
//! regardless of who is asking.

use uuid::Uuid;

use terra_types::models::Role;

use crate::auth::{AppState, blocking};
use crate::error::{ApiError, ApiResult};

/// Author-or-admin rule shared by posts and comments.
pub fn permits(actor: Uuid, owner: Uuid, actor_role: Role) -> bool {
    actor == owner || actor_role == Role::Admin
}

/// Fails with 401 when the token's account no longer exists, 403 for any
/// role other than admin.
pub async fn require_admin_role(state: &AppState, actor: Uuid) -> ApiResult<()> {
    let role = blocking(state, move |db| db.get_user_role(actor))
        .await?
        .ok_or(ApiError::Unauthorized("Account no longer exists"))?;

    if role != Role::Admin {
        return Err(ApiError::Forbidden("Admin access required"));
    }
    Ok(())
}

pub async fn authorize_post(state: &AppState, post_id: Uuid, actor: Uuid) -> ApiResult<()> {
    let (owner, role) = blocking(state, move |db| {
        Ok((db.post_owner(post_id)?, db.get_user_role(actor)?))
    })
    .await?;

    let owner = owner.ok_or(ApiError::NotFound("Post not found"))?;
    let role = role.ok_or(ApiError::Unauthorized("Account no longer exists"))?;

    if !permits(actor, owner, role) {
        return Err(ApiError::Forbidden("Not authorized to modify this post"));
    }
    Ok(())
}

/// When the actor is not the comment author, the parent post must still
/// resolve before the admin decision is made.
pub async fn authorize_comment(state: &AppState, comment_id: Uuid, actor: Uuid) -> ApiResult<()> {
    let (owner, parent_exists, role) = blocking(state, move |db| {
        let Some(owner) = db.comment_owner(comment_id)? else {
            return Ok((None, false, None));
        };
        if owner.user_id == actor {
            return Ok((Some(owner), true, None));
        }
        let parent_exists = db.post_owner(owner.post_id)?.is_some();
        Ok((Some(owner), parent_exists, db.get_user_role(actor)?))
    })
    .await?;

    let owner = owner.ok_or(ApiError::NotFound("Comment not found"))?;
    if owner.user_id == actor {
        return Ok(());
    }
    if !parent_exists {
        return Err(ApiError::NotFound("Post not found"));
    }

    let role = role.ok_or(ApiError::Unauthorized("Account no longer exists"))?;
    if !permits(actor, owner.user_id, role) {
        return Err(ApiError::Forbidden("Not authorized to modify this comment"));
    }
    Ok(())
}
