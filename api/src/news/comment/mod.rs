pub mod create;
pub mod moderate;
pub mod thread;
pub mod visibility;
pub mod vote;

use std::str::FromStr;

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::{
    error::{ApiRequestError, AppError},
    store::AuthoredComment,
};

pub const MAX_BODY_CHARS: usize = 5000;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum CommentError {
    #[error("Article `{0}` not found")]
    ArticleNotFound(i32),

    #[error("Comment `{0}` not found")]
    CommentNotFound(i32),

    #[error("You're replying to a comment that does not belong to this article")]
    ParentOnOtherArticle,

    #[error("No content provided")]
    EmptyBody,

    #[error("Content too long (max {} characters)", MAX_BODY_CHARS)]
    BodyTooLong,

    #[error("Invalid vote direction `{0}`, expected `up` or `down`")]
    InvalidVoteDirection(String),

    #[error("Only staff members can moderate comments")]
    PermissionDenied,
}

impl ApiRequestError for CommentError {
    fn status_code(&self) -> StatusCode {
        match self {
            CommentError::ArticleNotFound(_) | CommentError::CommentNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            CommentError::PermissionDenied => StatusCode::FORBIDDEN,
            CommentError::ParentOnOtherArticle
            | CommentError::EmptyBody
            | CommentError::BodyTooLong
            | CommentError::InvalidVoteDirection(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            CommentError::ArticleNotFound(_) | CommentError::CommentNotFound(_) => "NOT_FOUND",
            CommentError::PermissionDenied => "PERMISSION_DENIED",
            _ => "VALIDATION_ERR",
        }
    }
}

impl From<CommentError> for AppError {
    fn from(e: CommentError) -> Self {
        AppError::from_request_error(e)
    }
}

/// Trims the body and checks its length.
pub fn validate_body(body: &str) -> Result<String, CommentError> {
    let body = body.trim();

    if body.is_empty() {
        return Err(CommentError::EmptyBody);
    }

    if body.chars().count() > MAX_BODY_CHARS {
        return Err(CommentError::BodyTooLong);
    }

    Ok(body.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteDirection {
    Up,
    Down,
}

impl FromStr for VoteDirection {
    type Err = CommentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(VoteDirection::Up),
            "down" => Ok(VoteDirection::Down),
            other => Err(CommentError::InvalidVoteDirection(other.into())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
    pub upvotes: i32,
    pub downvotes: i32,
}

// The model that will be returned to the client
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CommentView {
    pub id: i32,
    pub article_id: i32,
    pub author_name: String,
    pub body: String,
    pub parent_id: Option<i32>,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
    pub is_approved: bool,
    pub upvotes: i32,
    pub downvotes: i32,
}

impl From<AuthoredComment> for CommentView {
    fn from(c: AuthoredComment) -> Self {
        CommentView {
            id: c.comment.id,
            article_id: c.comment.article_id,
            author_name: c.author_name,
            body: c.comment.body,
            parent_id: c.comment.parent_id,
            created_at: c.comment.created_at,
            updated_at: c.comment.updated_at,
            is_approved: c.comment.is_approved,
            upvotes: c.comment.upvotes,
            downvotes: c.comment.downvotes,
        }
    }
}
