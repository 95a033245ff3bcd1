use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use diesel::{pg::Pg, prelude::*};
use diesel_async::{
    AsyncPgConnection, RunQueryDsl,
    pooled_connection::{
        AsyncDieselConnectionManager,
        deadpool::{Object, Pool},
    },
};

use crate::{
    identity::models::identity::{Identity, display_name_from_traits},
    news::{
        comment::{VoteDirection, VoteTally},
        models::{
            article::{Article, ArticleRow, ArticleStatus},
            category::Category,
            comment::{Comment, NewComment},
            reporter::Reporter,
            tag::Tag,
        },
    },
    schema::{
        comments, identities, news_article_tags, news_articles, news_categories, news_reporters,
        news_tags, sessions,
    },
};

use super::{ArticleFilter, AuthoredComment, PageWindow, Store, StoreError, StoreResult};

pub type DieselPool = Pool<AsyncPgConnection>;

pub struct PgStore {
    pool: DieselPool,
}

impl PgStore {
    pub fn connect(database_url: &str, max_connections: usize) -> StoreResult<Self> {
        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);
        let pool = Pool::builder(manager)
            .max_size(max_connections)
            .runtime(deadpool_runtime::Runtime::Tokio1)
            .wait_timeout(Some(Duration::from_secs(10)))
            .create_timeout(Some(Duration::from_secs(10)))
            .recycle_timeout(Some(Duration::from_secs(120)))
            .build()
            .map_err(|e| StoreError::Pool(e.to_string()))?;

        Ok(PgStore { pool })
    }

    async fn conn(&self) -> StoreResult<Object<AsyncPgConnection>> {
        self.pool.get().await.map_err(|e| {
            tracing::error!(error = %e, "Could not get a pooled diesel connection");
            StoreError::Pool(e.to_string())
        })
    }
}

fn published_articles(filter: &ArticleFilter) -> news_articles::BoxedQuery<'static, Pg> {
    let query = news_articles::table
        .filter(news_articles::status.eq(ArticleStatus::PUBLISHED))
        .into_boxed();

    match filter {
        ArticleFilter::All => query,
        ArticleFilter::Category(slug) => query.filter(
            news_articles::category_id.eq_any(
                news_categories::table
                    .filter(news_categories::slug.eq(slug.clone()))
                    .select(news_categories::id),
            ),
        ),
        ArticleFilter::Reporter(slug) => query.filter(
            news_articles::reporter_id.eq_any(
                news_reporters::table
                    .filter(news_reporters::slug.eq(slug.clone()))
                    .select(news_reporters::id),
            ),
        ),
        ArticleFilter::Tag(slug) => query.filter(
            news_articles::id.eq_any(
                news_article_tags::table
                    .inner_join(news_tags::table)
                    .filter(news_tags::slug.eq(slug.clone()))
                    .select(news_article_tags::article_id),
            ),
        ),
    }
}

async fn tags_by_article(
    conn: &mut AsyncPgConnection,
    article_ids: Vec<i32>,
) -> StoreResult<HashMap<i32, Vec<Tag>>> {
    let pairs = news_article_tags::table
        .inner_join(news_tags::table)
        .filter(news_article_tags::article_id.eq_any(article_ids))
        .order(news_tags::name.asc())
        .select((news_article_tags::article_id, Tag::as_select()))
        .load::<(i32, Tag)>(conn)
        .await?;

    let mut tags = HashMap::<i32, Vec<Tag>>::new();
    for (article_id, tag) in pairs {
        tags.entry(article_id).or_default().push(tag);
    }
    Ok(tags)
}

async fn author_name(conn: &mut AsyncPgConnection, author_id: i32) -> StoreResult<String> {
    let traits = identities::table
        .find(author_id)
        .select(identities::traits)
        .first::<serde_json::Value>(conn)
        .await
        .optional()?;

    Ok(match traits {
        Some(traits) => display_name_from_traits(&traits),
        None => {
            tracing::error!(author_id, "Comment author has no identity row");
            display_name_from_traits(&serde_json::Value::Null)
        }
    })
}

#[async_trait]
impl Store for PgStore {
    async fn find_article(&self, id: i32) -> StoreResult<Option<Article>> {
        let mut conn = self.conn().await?;

        let found = news_articles::table
            .inner_join(news_categories::table)
            .inner_join(news_reporters::table)
            .filter(news_articles::id.eq(id))
            .select((
                ArticleRow::as_select(),
                Category::as_select(),
                Reporter::as_select(),
            ))
            .first::<(ArticleRow, Category, Reporter)>(&mut conn)
            .await
            .optional()?;

        let Some((row, category, reporter)) = found else {
            return Ok(None);
        };

        let tags = tags_by_article(&mut conn, vec![row.id])
            .await?
            .remove(&row.id)
            .unwrap_or_default();

        Ok(Some(Article::from_parts(row, category, reporter, tags)))
    }

    async fn count_published_articles(&self, filter: &ArticleFilter) -> StoreResult<i64> {
        let mut conn = self.conn().await?;

        Ok(published_articles(filter)
            .count()
            .get_result::<i64>(&mut conn)
            .await?)
    }

    async fn list_published_articles(
        &self,
        filter: &ArticleFilter,
        window: PageWindow,
    ) -> StoreResult<Vec<Article>> {
        let mut conn = self.conn().await?;

        let rows = published_articles(filter)
            .order((news_articles::published_at.desc(), news_articles::id.desc()))
            .limit(window.limit)
            .offset(window.offset)
            .select(ArticleRow::as_select())
            .load::<ArticleRow>(&mut conn)
            .await?;

        if rows.is_empty() {
            return Ok(vec![]);
        }

        let category_ids: Vec<i32> = rows.iter().map(|r| r.category_id).collect();
        let categories: HashMap<i32, Category> = news_categories::table
            .filter(news_categories::id.eq_any(category_ids))
            .select(Category::as_select())
            .load::<Category>(&mut conn)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        let reporter_ids: Vec<i32> = rows.iter().map(|r| r.reporter_id).collect();
        let reporters: HashMap<i32, Reporter> = news_reporters::table
            .filter(news_reporters::id.eq_any(reporter_ids))
            .select(Reporter::as_select())
            .load::<Reporter>(&mut conn)
            .await?
            .into_iter()
            .map(|r| (r.id, r))
            .collect();

        let mut tags = tags_by_article(&mut conn, rows.iter().map(|r| r.id).collect()).await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let category = categories.get(&row.category_id).cloned();
                let reporter = reporters.get(&row.reporter_id).cloned();
                match (category, reporter) {
                    (Some(category), Some(reporter)) => {
                        let article_tags = tags.remove(&row.id).unwrap_or_default();
                        Some(Article::from_parts(row, category, reporter, article_tags))
                    }
                    _ => {
                        tracing::error!(article_id = row.id, "Article has dangling relations");
                        None
                    }
                }
            })
            .collect())
    }

    async fn find_category(&self, slug: &str) -> StoreResult<Option<Category>> {
        let mut conn = self.conn().await?;

        Ok(news_categories::table
            .filter(news_categories::slug.eq(slug))
            .select(Category::as_select())
            .first::<Category>(&mut conn)
            .await
            .optional()?)
    }

    async fn find_reporter(&self, slug: &str) -> StoreResult<Option<Reporter>> {
        let mut conn = self.conn().await?;

        Ok(news_reporters::table
            .filter(news_reporters::slug.eq(slug))
            .select(Reporter::as_select())
            .first::<Reporter>(&mut conn)
            .await
            .optional()?)
    }

    async fn find_tag(&self, slug: &str) -> StoreResult<Option<Tag>> {
        let mut conn = self.conn().await?;

        Ok(news_tags::table
            .filter(news_tags::slug.eq(slug))
            .select(Tag::as_select())
            .first::<Tag>(&mut conn)
            .await
            .optional()?)
    }

    async fn find_identity_by_session(&self, token: &str) -> StoreResult<Option<Identity>> {
        let mut conn = self.conn().await?;
        let now = chrono::Utc::now().naive_utc();

        Ok(sessions::table
            .inner_join(identities::table)
            .filter(sessions::token.eq(token))
            .filter(sessions::active.eq(true))
            .filter(sessions::expires_at.gt(now))
            .filter(sessions::issued_at.le(now))
            .select(Identity::as_select())
            .first::<Identity>(&mut conn)
            .await
            .optional()?)
    }

    async fn find_comment(&self, id: i32) -> StoreResult<Option<Comment>> {
        let mut conn = self.conn().await?;

        Ok(comments::table
            .find(id)
            .select(Comment::as_select())
            .first::<Comment>(&mut conn)
            .await
            .optional()?)
    }

    async fn insert_comment(&self, comment: NewComment) -> StoreResult<AuthoredComment> {
        let mut conn = self.conn().await?;

        let comment = diesel::insert_into(comments::table)
            .values(&comment)
            .returning(Comment::as_returning())
            .get_result::<Comment>(&mut conn)
            .await?;

        let author_name = author_name(&mut conn, comment.author_id).await?;

        Ok(AuthoredComment {
            comment,
            author_name,
        })
    }

    async fn article_comments(&self, article_id: i32) -> StoreResult<Vec<AuthoredComment>> {
        let mut conn = self.conn().await?;

        let rows = comments::table
            .inner_join(identities::table)
            .filter(comments::article_id.eq(article_id))
            .order((comments::created_at.desc(), comments::id.desc()))
            .select((Comment::as_select(), identities::traits))
            .load::<(Comment, serde_json::Value)>(&mut conn)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(comment, traits)| AuthoredComment {
                comment,
                author_name: display_name_from_traits(&traits),
            })
            .collect())
    }

    async fn increment_vote(
        &self,
        comment_id: i32,
        direction: VoteDirection,
    ) -> StoreResult<Option<VoteTally>> {
        let mut conn = self.conn().await?;
        let now = chrono::Utc::now().naive_utc();
        let target = comments::table.find(comment_id);

        // The increment happens inside the UPDATE so concurrent votes never
        // overwrite each other.
        let counts = match direction {
            VoteDirection::Up => {
                diesel::update(target)
                    .set((
                        comments::upvotes.eq(comments::upvotes + 1),
                        comments::updated_at.eq(now),
                    ))
                    .returning((comments::upvotes, comments::downvotes))
                    .get_result::<(i32, i32)>(&mut conn)
                    .await
            }
            VoteDirection::Down => {
                diesel::update(target)
                    .set((
                        comments::downvotes.eq(comments::downvotes + 1),
                        comments::updated_at.eq(now),
                    ))
                    .returning((comments::upvotes, comments::downvotes))
                    .get_result::<(i32, i32)>(&mut conn)
                    .await
            }
        }
        .optional()?;

        Ok(counts.map(|(upvotes, downvotes)| VoteTally { upvotes, downvotes }))
    }

    async fn set_approval(
        &self,
        comment_id: i32,
        approved: bool,
    ) -> StoreResult<Option<AuthoredComment>> {
        let mut conn = self.conn().await?;
        let now = chrono::Utc::now().naive_utc();

        let comment = diesel::update(comments::table.find(comment_id))
            .set((
                comments::is_approved.eq(approved),
                comments::updated_at.eq(now),
            ))
            .returning(Comment::as_returning())
            .get_result::<Comment>(&mut conn)
            .await
            .optional()?;

        let Some(comment) = comment else {
            return Ok(None);
        };

        let author_name = author_name(&mut conn, comment.author_id).await?;

        Ok(Some(AuthoredComment {
            comment,
            author_name,
        }))
    }
}
