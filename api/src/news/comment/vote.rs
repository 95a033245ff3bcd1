use axum::{Json, debug_handler, extract::State};

use crate::{App, error::AppError, extract::Path, identity::AuthUser, store::Store};

use super::{CommentError, VoteDirection, VoteTally};

#[debug_handler(state = App)]
pub async fn vote_comment(
    State(ctx): State<App>,
    Path((comment_id, direction)): Path<(i32, String)>,
    AuthUser(voter): AuthUser,
) -> Result<Json<VoteTally>, AppError> {
    let direction: VoteDirection = direction.parse()?;

    let tally = cast_vote(ctx.store.as_ref(), comment_id, direction).await?;

    tracing::debug!(
        comment_id,
        voter_id = voter.id,
        ?direction,
        upvotes = tally.upvotes,
        downvotes = tally.downvotes,
        "Vote recorded"
    );

    Ok(Json(tally))
}

/// Adds exactly one vote. Votes are not deduplicated per voter.
pub async fn cast_vote(
    store: &dyn Store,
    comment_id: i32,
    direction: VoteDirection,
) -> Result<VoteTally, AppError> {
    Ok(store
        .increment_vote(comment_id, direction)
        .await?
        .ok_or(CommentError::CommentNotFound(comment_id))?)
}
