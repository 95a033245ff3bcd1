use axum::{debug_handler, extract::State, http::StatusCode};
use serde::Deserialize;

use crate::{
    App,
    error::AppError,
    extract::Path,
    identity::{AuthUser, models::identity::Identity},
    json::Json,
    news::models::comment::NewComment,
    store::{AuthoredComment, Store},
};

use super::{CommentError, CommentView, validate_body};

#[derive(Deserialize)]
pub struct CommentSubmission {
    body: String,
    #[serde(default)]
    parent_id: Option<i32>,
}

#[derive(Deserialize)]
pub struct ReplySubmission {
    body: String,
}

#[debug_handler(state = App)]
pub async fn add_comment(
    State(ctx): State<App>,
    Path(article_id): Path<i32>,
    AuthUser(author): AuthUser,
    Json(submission): Json<CommentSubmission>,
) -> Result<(StatusCode, axum::Json<CommentView>), AppError> {
    let comment = create_comment(
        ctx.store.as_ref(),
        &author,
        article_id,
        submission.parent_id,
        &submission.body,
        ctx.config.comments_approved_by_default,
    )
    .await?;

    Ok((StatusCode::CREATED, axum::Json(comment.into())))
}

#[debug_handler(state = App)]
pub async fn reply_comment(
    State(ctx): State<App>,
    Path(comment_id): Path<i32>,
    AuthUser(author): AuthUser,
    Json(submission): Json<ReplySubmission>,
) -> Result<(StatusCode, axum::Json<CommentView>), AppError> {
    let reply = create_reply(
        ctx.store.as_ref(),
        &author,
        comment_id,
        &submission.body,
        ctx.config.comments_approved_by_default,
    )
    .await?;

    Ok((StatusCode::CREATED, axum::Json(reply.into())))
}

/// Creates a comment on an article, optionally as a reply.
///
/// Replies are kept one level deep: answering a reply attaches the new
/// comment to the thread's top-level comment instead.
pub async fn create_comment(
    store: &dyn Store,
    author: &Identity,
    article_id: i32,
    parent_id: Option<i32>,
    body: &str,
    approved: bool,
) -> Result<AuthoredComment, AppError> {
    let article = store
        .find_article(article_id)
        .await?
        .filter(|a| a.is_published() || author.is_staff)
        .ok_or(CommentError::ArticleNotFound(article_id))?;

    let body = validate_body(body)?;

    let parent_id = match parent_id {
        Some(parent_id) => {
            let parent = store
                .find_comment(parent_id)
                .await?
                .ok_or(CommentError::CommentNotFound(parent_id))?;

            if parent.article_id != article.id {
                return Err(CommentError::ParentOnOtherArticle.into());
            }

            Some(parent.parent_id.unwrap_or(parent.id))
        }
        None => None,
    };

    let comment = store
        .insert_comment(NewComment::new(
            article.id,
            author.id,
            parent_id,
            body,
            approved,
        ))
        .await?;

    tracing::info!(
        comment_id = comment.comment.id,
        article_id = article.id,
        parent_id = ?comment.comment.parent_id,
        author_id = author.id,
        "Comment created"
    );

    Ok(comment)
}

/// Replies to an existing comment on whatever article it belongs to.
pub async fn create_reply(
    store: &dyn Store,
    author: &Identity,
    parent_id: i32,
    body: &str,
    approved: bool,
) -> Result<AuthoredComment, AppError> {
    let parent = store
        .find_comment(parent_id)
        .await?
        .ok_or(CommentError::CommentNotFound(parent_id))?;

    create_comment(
        store,
        author,
        parent.article_id,
        Some(parent.id),
        body,
        approved,
    )
    .await
}
