use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;

use crate::{
    App,
    error::{ApiRequestError, AppError},
    extract::{Path, Query},
    identity::MaybeAuthUser,
    store::ArticleFilter,
};

use super::{
    comment::{
        thread::{SortType, build_threads},
        visibility::visible_comments,
    },
    page::{
        ArticleListPage, ArticlePage, ListingSubject, Pagination, render_article_list,
        render_article_page,
    },
};

#[derive(thiserror::Error, Debug)]
pub enum PageError {
    #[error("Article `{0}` not found")]
    Article(i32),

    #[error("Category `{0}` not found")]
    Category(String),

    #[error("Reporter `{0}` not found")]
    Reporter(String),

    #[error("Tag `{0}` not found")]
    Tag(String),
}

impl ApiRequestError for PageError {
    fn status_code(&self) -> StatusCode {
        StatusCode::NOT_FOUND
    }

    fn code(&self) -> &'static str {
        "NOT_FOUND"
    }
}

impl From<PageError> for AppError {
    fn from(e: PageError) -> Self {
        AppError::from_request_error(e)
    }
}

#[derive(Deserialize, Default)]
pub struct ArticleQuery {
    sort: Option<SortType>,
}

#[derive(Deserialize, Default)]
pub struct PageQuery {
    page: Option<String>,
}

impl PageQuery {
    /// Anything that is not a number means the first page.
    fn page(&self) -> Option<i64> {
        self.page.as_deref().and_then(|p| p.trim().parse().ok())
    }
}

pub async fn get_article(
    State(ctx): State<App>,
    Path(article_id): Path<i32>,
    Query(q): Query<ArticleQuery>,
    auth_user: MaybeAuthUser,
) -> Result<Json<ArticlePage>, AppError> {
    let viewer = auth_user.viewer();

    let article = ctx
        .store
        .find_article(article_id)
        .await?
        .filter(|a| a.is_published() || viewer.is_staff())
        .ok_or(PageError::Article(article_id))?;

    let comments = ctx.store.article_comments(article.id).await?;
    let threads = build_threads(visible_comments(viewer, comments), q.sort.unwrap_or_default());

    Ok(Json(render_article_page(article, threads)))
}

pub async fn list_articles(
    State(ctx): State<App>,
    Query(q): Query<PageQuery>,
) -> Result<Json<ArticleListPage>, AppError> {
    article_list(&ctx, None, ArticleFilter::All, q.page()).await
}

pub async fn list_category(
    State(ctx): State<App>,
    Path(slug): Path<String>,
    Query(q): Query<PageQuery>,
) -> Result<Json<ArticleListPage>, AppError> {
    let category = ctx
        .store
        .find_category(&slug)
        .await?
        .ok_or_else(|| PageError::Category(slug.clone()))?;

    article_list(
        &ctx,
        Some(ListingSubject::Category(category)),
        ArticleFilter::Category(slug),
        q.page(),
    )
    .await
}

pub async fn list_reporter(
    State(ctx): State<App>,
    Path(slug): Path<String>,
    Query(q): Query<PageQuery>,
) -> Result<Json<ArticleListPage>, AppError> {
    let reporter = ctx
        .store
        .find_reporter(&slug)
        .await?
        .ok_or_else(|| PageError::Reporter(slug.clone()))?;

    article_list(
        &ctx,
        Some(ListingSubject::Reporter(reporter)),
        ArticleFilter::Reporter(slug),
        q.page(),
    )
    .await
}

pub async fn list_tag(
    State(ctx): State<App>,
    Path(slug): Path<String>,
    Query(q): Query<PageQuery>,
) -> Result<Json<ArticleListPage>, AppError> {
    let tag = ctx
        .store
        .find_tag(&slug)
        .await?
        .ok_or_else(|| PageError::Tag(slug.clone()))?;

    article_list(
        &ctx,
        Some(ListingSubject::Tag(tag)),
        ArticleFilter::Tag(slug),
        q.page(),
    )
    .await
}

async fn article_list(
    ctx: &App,
    subject: Option<ListingSubject>,
    filter: ArticleFilter,
    page: Option<i64>,
) -> Result<Json<ArticleListPage>, AppError> {
    let total = ctx.store.count_published_articles(&filter).await?;
    let pagination = Pagination::new(page, ctx.config.articles_per_page, total);
    let articles = ctx
        .store
        .list_published_articles(&filter, pagination.window())
        .await?;

    Ok(Json(render_article_list(
        subject,
        articles,
        pagination,
        ctx.config.summary_words,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::ServerConfig,
        identity::AuthenticationError,
        news::{
            comment::{create::create_comment, test_support::fixture},
            models::article::ArticleStatus,
        },
        store::memory::{ArticleDraft, MemoryStore},
    };

    fn anonymous() -> MaybeAuthUser {
        MaybeAuthUser(Err(AuthenticationError::NoCookie))
    }

    #[tokio::test]
    async fn staff_see_unapproved_comments_and_others_do_not() {
        let f = fixture(ServerConfig::default()).await;
        for (body, approved) in [("first", true), ("second", true), ("pending", false)] {
            create_comment(f.store.as_ref(), &f.reader, f.article_id, None, body, approved)
                .await
                .unwrap();
        }

        let Json(page) = get_article(
            State(f.app.clone()),
            Path(f.article_id),
            Query(ArticleQuery::default()),
            anonymous(),
        )
        .await
        .unwrap();
        assert_eq!(page.comments.len(), 2);
        assert_eq!(page.comment_count, 2);

        let Json(page) = get_article(
            State(f.app.clone()),
            Path(f.article_id),
            Query(ArticleQuery::default()),
            MaybeAuthUser(Ok(f.reader.clone())),
        )
        .await
        .unwrap();
        assert_eq!(page.comments.len(), 2);

        let Json(page) = get_article(
            State(f.app.clone()),
            Path(f.article_id),
            Query(ArticleQuery::default()),
            MaybeAuthUser(Ok(f.editor.clone())),
        )
        .await
        .unwrap();
        assert_eq!(page.comments.len(), 3);
        // newest first
        assert_eq!(page.comments[0].comment.body, "pending");
    }

    #[tokio::test]
    async fn article_page_threads_replies_and_sorts() {
        let f = fixture(ServerConfig::default()).await;
        let quiet = create_comment(f.store.as_ref(), &f.reader, f.article_id, None, "quiet", true)
            .await
            .unwrap();
        let popular =
            create_comment(f.store.as_ref(), &f.reader, f.article_id, None, "popular", true)
                .await
                .unwrap();
        create_comment(
            f.store.as_ref(),
            &f.editor,
            f.article_id,
            Some(quiet.comment.id),
            "reply",
            true,
        )
        .await
        .unwrap();
        f.store.set_votes(quiet.comment.id, 9, 0).await;
        f.store.set_votes(popular.comment.id, 2, 0).await;

        let Json(page) = get_article(
            State(f.app.clone()),
            Path(f.article_id),
            Query(ArticleQuery {
                sort: Some(SortType::Best),
            }),
            anonymous(),
        )
        .await
        .unwrap();

        assert_eq!(page.comments[0].comment.id, quiet.comment.id);
        assert_eq!(page.comments[0].replies.len(), 1);
        assert_eq!(page.comment_count, 3);
    }

    #[tokio::test]
    async fn drafts_are_hidden_from_readers() {
        let f = fixture(ServerConfig::default()).await;

        let err = get_article(
            State(f.app.clone()),
            Path(f.draft_article_id),
            Query(ArticleQuery::default()),
            MaybeAuthUser(Ok(f.reader.clone())),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let Json(page) = get_article(
            State(f.app.clone()),
            Path(f.draft_article_id),
            Query(ArticleQuery::default()),
            MaybeAuthUser(Ok(f.editor.clone())),
        )
        .await
        .unwrap();
        assert_eq!(page.article.id, f.draft_article_id);

        let err = get_article(
            State(f.app.clone()),
            Path(12345),
            Query(ArticleQuery::default()),
            anonymous(),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    async fn store_with_many_articles() -> std::sync::Arc<MemoryStore> {
        let store = std::sync::Arc::new(MemoryStore::new());
        let world = store.add_category("World", "world").await;
        let sport = store.add_category("Sport", "sport").await;
        let reporter = store.add_reporter("Lois Lane", "lois-lane").await;
        let tag = store.add_tag("Elections", "elections").await;
        let start = chrono::Utc::now().naive_utc();

        for i in 0..7 {
            store
                .add_article(ArticleDraft {
                    title: format!("Story {i}"),
                    slug: format!("story-{i}"),
                    body: format!("<p>Story number {i} has a body</p>"),
                    status: ArticleStatus::Published,
                    published_at: start + chrono::Duration::minutes(i),
                    category_id: if i % 2 == 0 { world.id } else { sport.id },
                    reporter_id: reporter.id,
                    tag_ids: if i < 2 { vec![tag.id] } else { vec![] },
                })
                .await;
        }
        store
    }

    #[tokio::test]
    async fn listings_paginate_and_clamp() {
        let store = store_with_many_articles().await;
        let app = App::new(
            store,
            ServerConfig {
                articles_per_page: 3,
                summary_words: 2,
                ..ServerConfig::default()
            },
        );

        let Json(first) = list_articles(State(app.clone()), Query(PageQuery::default()))
            .await
            .unwrap();
        assert_eq!(first.pagination.num_pages, 3);
        assert_eq!(first.articles.len(), 3);
        assert_eq!(first.articles[0].slug, "story-6");
        assert_eq!(first.articles[0].summary, "<p>Story number …</p>");

        let Json(last) = list_articles(
            State(app.clone()),
            Query(PageQuery {
                page: Some("42".into()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(last.pagination.page, 3);
        assert_eq!(last.articles.len(), 1);
        assert_eq!(last.articles[0].slug, "story-0");

        let Json(garbage) = list_articles(
            State(app.clone()),
            Query(PageQuery {
                page: Some("two".into()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(garbage.pagination.page, 1);
    }

    #[tokio::test]
    async fn filtered_listings_carry_their_subject() {
        let store = store_with_many_articles().await;
        let app = App::new(store, ServerConfig::default());

        let Json(world) = list_category(
            State(app.clone()),
            Path("world".into()),
            Query(PageQuery::default()),
        )
        .await
        .unwrap();
        assert_eq!(world.pagination.total, 4);
        assert!(matches!(
            world.subject,
            Some(ListingSubject::Category(ref c)) if c.slug == "world"
        ));

        let Json(elections) = list_tag(
            State(app.clone()),
            Path("elections".into()),
            Query(PageQuery::default()),
        )
        .await
        .unwrap();
        assert_eq!(elections.pagination.total, 2);

        let Json(lois) = list_reporter(
            State(app.clone()),
            Path("lois-lane".into()),
            Query(PageQuery::default()),
        )
        .await
        .unwrap();
        assert_eq!(lois.pagination.total, 7);

        let err = list_category(
            State(app.clone()),
            Path("weather".into()),
            Query(PageQuery::default()),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unknown_reporter_or_tag_is_not_found() {
        let store = store_with_many_articles().await;
        let app = App::new(store, ServerConfig::default());

        let err = list_reporter(
            State(app.clone()),
            Path("jimmy-olsen".into()),
            Query(PageQuery::default()),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let err = list_tag(
            State(app.clone()),
            Path("weather".into()),
            Query(PageQuery::default()),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        // a known tag with no published articles is an empty listing
        let store = MemoryStore::new();
        store.add_tag("Quiet", "quiet").await;
        let app = App::new(std::sync::Arc::new(store), ServerConfig::default());
        let Json(quiet) = list_tag(
            State(app),
            Path("quiet".into()),
            Query(PageQuery::default()),
        )
        .await
        .unwrap();
        assert!(quiet.articles.is_empty());
        assert_eq!(quiet.pagination.num_pages, 1);
    }
}
