//! Persistence for the content store and the comment subsystem.
//!
//! Handlers only talk to the [`Store`] trait. [`postgres::PgStore`] is the
//! production backend; [`memory::MemoryStore`] backs local development and the
//! test suite.

use async_trait::async_trait;

use crate::{
    identity::models::identity::Identity,
    news::{
        comment::{VoteDirection, VoteTally},
        models::{
            article::Article,
            category::Category,
            comment::{Comment, NewComment},
            reporter::Reporter,
            tag::Tag,
        },
    },
};

pub mod memory;
pub mod postgres;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("could not get a database connection: {0}")]
    Pool(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Restricts an article listing to one category, reporter or tag (by slug).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArticleFilter {
    All,
    Category(String),
    Reporter(String),
    Tag(String),
}

/// A window into a listing. `offset` and `limit` are already clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub offset: i64,
    pub limit: i64,
}

/// A comment together with the display name of its author.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthoredComment {
    pub comment: Comment,
    pub author_name: String,
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Finds an article regardless of its publication status.
    async fn find_article(&self, id: i32) -> StoreResult<Option<Article>>;

    /// Counts the published articles matching the filter.
    async fn count_published_articles(&self, filter: &ArticleFilter) -> StoreResult<i64>;

    /// Published articles matching the filter, newest first.
    async fn list_published_articles(
        &self,
        filter: &ArticleFilter,
        window: PageWindow,
    ) -> StoreResult<Vec<Article>>;

    async fn find_category(&self, slug: &str) -> StoreResult<Option<Category>>;

    async fn find_reporter(&self, slug: &str) -> StoreResult<Option<Reporter>>;

    async fn find_tag(&self, slug: &str) -> StoreResult<Option<Tag>>;

    /// Resolves the identity behind a session token if the session is still valid.
    async fn find_identity_by_session(&self, token: &str) -> StoreResult<Option<Identity>>;

    async fn find_comment(&self, id: i32) -> StoreResult<Option<Comment>>;

    async fn insert_comment(&self, comment: NewComment) -> StoreResult<AuthoredComment>;

    /// Every comment of an article, approved or not, newest first.
    async fn article_comments(&self, article_id: i32) -> StoreResult<Vec<AuthoredComment>>;

    /// Adds one vote in a single atomic step. `None` if the comment is missing.
    async fn increment_vote(
        &self,
        comment_id: i32,
        direction: VoteDirection,
    ) -> StoreResult<Option<VoteTally>>;

    async fn set_approval(
        &self,
        comment_id: i32,
        approved: bool,
    ) -> StoreResult<Option<AuthoredComment>>;
}
