use axum::{Json, debug_handler, extract::State};

use crate::{
    App,
    error::AppError,
    extract::Path,
    identity::{AuthUser, models::identity::Identity},
    store::{AuthoredComment, Store},
};

use super::{CommentError, CommentView};

#[debug_handler(state = App)]
pub async fn approve_comment(
    State(ctx): State<App>,
    Path(comment_id): Path<i32>,
    AuthUser(moderator): AuthUser,
) -> Result<Json<CommentView>, AppError> {
    let comment = set_approval(ctx.store.as_ref(), &moderator, comment_id, true).await?;
    Ok(Json(comment.into()))
}

#[debug_handler(state = App)]
pub async fn unapprove_comment(
    State(ctx): State<App>,
    Path(comment_id): Path<i32>,
    AuthUser(moderator): AuthUser,
) -> Result<Json<CommentView>, AppError> {
    let comment = set_approval(ctx.store.as_ref(), &moderator, comment_id, false).await?;
    Ok(Json(comment.into()))
}

pub async fn set_approval(
    store: &dyn Store,
    moderator: &Identity,
    comment_id: i32,
    approved: bool,
) -> Result<AuthoredComment, AppError> {
    if !moderator.is_staff {
        tracing::warn!(
            comment_id,
            identity_id = moderator.id,
            "Non-staff identity tried to moderate a comment"
        );
        return Err(CommentError::PermissionDenied.into());
    }

    let comment = store
        .set_approval(comment_id, approved)
        .await?
        .ok_or(CommentError::CommentNotFound(comment_id))?;

    tracing::info!(
        comment_id,
        moderator_id = moderator.id,
        approved,
        "Comment moderated"
    );

    Ok(comment)
}
