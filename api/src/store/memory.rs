use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use tokio::sync::RwLock;

use crate::{
    identity::models::{
        identity::{Identity, Traits},
        session::Session,
    },
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
};

use super::{ArticleFilter, AuthoredComment, PageWindow, Store, StoreResult};

/// Everything needed to add an article to a [`MemoryStore`].
#[derive(Debug, Clone)]
pub struct ArticleDraft {
    pub title: String,
    pub slug: String,
    pub body: String,
    pub status: ArticleStatus,
    pub published_at: NaiveDateTime,
    pub category_id: i32,
    pub reporter_id: i32,
    pub tag_ids: Vec<i32>,
}

#[derive(Default)]
struct MemoryState {
    categories: Vec<Category>,
    reporters: Vec<Reporter>,
    tags: Vec<Tag>,
    articles: Vec<ArticleRow>,
    // (article_id, tag_id)
    article_tags: Vec<(i32, i32)>,
    identities: Vec<Identity>,
    sessions: Vec<Session>,
    comments: BTreeMap<i32, Comment>,
    last_comment_id: i32,
}

impl MemoryState {
    fn article(&self, row: &ArticleRow) -> Option<Article> {
        let category = self.categories.iter().find(|c| c.id == row.category_id)?;
        let reporter = self.reporters.iter().find(|r| r.id == row.reporter_id)?;
        let mut tags: Vec<Tag> = self
            .article_tags
            .iter()
            .filter(|(article_id, _)| *article_id == row.id)
            .filter_map(|(_, tag_id)| self.tags.iter().find(|t| t.id == *tag_id))
            .cloned()
            .collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));

        Some(Article::from_parts(
            row.clone(),
            category.clone(),
            reporter.clone(),
            tags,
        ))
    }

    fn matches(&self, row: &ArticleRow, filter: &ArticleFilter) -> bool {
        if ArticleStatus::parse(&row.status) != ArticleStatus::Published {
            return false;
        }

        match filter {
            ArticleFilter::All => true,
            ArticleFilter::Category(slug) => self
                .categories
                .iter()
                .any(|c| c.id == row.category_id && &c.slug == slug),
            ArticleFilter::Reporter(slug) => self
                .reporters
                .iter()
                .any(|r| r.id == row.reporter_id && &r.slug == slug),
            ArticleFilter::Tag(slug) => self.article_tags.iter().any(|(article_id, tag_id)| {
                *article_id == row.id
                    && self
                        .tags
                        .iter()
                        .any(|t| t.id == *tag_id && &t.slug == slug)
            }),
        }
    }

    fn author_name(&self, author_id: i32) -> String {
        self.identities
            .iter()
            .find(|i| i.id == author_id)
            .map(Identity::display_name)
            .unwrap_or_else(|| {
                tracing::error!(author_id, "Comment author has no identity");
                "Anonymous".into()
            })
    }

    fn authored(&self, comment: &Comment) -> AuthoredComment {
        AuthoredComment {
            comment: comment.clone(),
            author_name: self.author_name(comment.author_id),
        }
    }
}

/// A [`Store`] kept entirely in process memory.
///
/// All mutations take the write lock, so a vote is a single serialized
/// read-increment-write and concurrent votes are never lost.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_category(&self, name: &str, slug: &str) -> Category {
        let mut state = self.state.write().await;
        let category = Category {
            id: state.categories.len() as i32 + 1,
            name: name.into(),
            slug: slug.into(),
        };
        state.categories.push(category.clone());
        category
    }

    pub async fn add_reporter(&self, name: &str, slug: &str) -> Reporter {
        let mut state = self.state.write().await;
        let reporter = Reporter {
            id: state.reporters.len() as i32 + 1,
            name: name.into(),
            slug: slug.into(),
            email: None,
            bio: None,
        };
        state.reporters.push(reporter.clone());
        reporter
    }

    pub async fn add_tag(&self, name: &str, slug: &str) -> Tag {
        let mut state = self.state.write().await;
        let tag = Tag {
            id: state.tags.len() as i32 + 1,
            name: name.into(),
            slug: slug.into(),
        };
        state.tags.push(tag.clone());
        tag
    }

    pub async fn add_article(&self, draft: ArticleDraft) -> i32 {
        let mut state = self.state.write().await;
        let id = state.articles.len() as i32 + 1;
        state.articles.push(ArticleRow {
            id,
            title: draft.title,
            slug: draft.slug,
            body: draft.body,
            status: draft.status.as_str().into(),
            published_at: draft.published_at,
            category_id: draft.category_id,
            reporter_id: draft.reporter_id,
        });
        for tag_id in draft.tag_ids {
            state.article_tags.push((id, tag_id));
        }
        id
    }

    pub async fn add_identity(&self, traits: Traits, is_staff: bool) -> Identity {
        let mut state = self.state.write().await;
        let new = Identity::new_with_traits(traits, is_staff);
        let identity = Identity {
            id: state.identities.len() as i32 + 1,
            traits: new.traits,
            is_staff: new.is_staff,
            created_at: new.created_at,
            updated_at: new.updated_at,
        };
        state.identities.push(identity.clone());
        identity
    }

    /// Issues a fresh session for the identity and returns it.
    pub async fn issue_session(&self, identity_id: i32) -> Session {
        let mut state = self.state.write().await;
        let new = Session::new_with_identity_id(identity_id);
        let session = Session {
            id: state.sessions.len() as i32 + 1,
            token: new.token,
            active: new.active,
            issued_at: new.issued_at,
            expires_at: new.expires_at,
            identity_id: new.identity_id,
            created_at: new.created_at,
            updated_at: new.updated_at,
        };
        state.sessions.push(session.clone());
        session
    }

    /// Overwrites vote counters directly, bypassing the atomic increment.
    #[cfg(test)]
    pub async fn set_votes(&self, comment_id: i32, upvotes: i32, downvotes: i32) -> bool {
        let mut state = self.state.write().await;
        match state.comments.get_mut(&comment_id) {
            Some(comment) => {
                comment.upvotes = upvotes;
                comment.downvotes = downvotes;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_article(&self, id: i32) -> StoreResult<Option<Article>> {
        let state = self.state.read().await;
        Ok(state
            .articles
            .iter()
            .find(|a| a.id == id)
            .and_then(|row| state.article(row)))
    }

    async fn count_published_articles(&self, filter: &ArticleFilter) -> StoreResult<i64> {
        let state = self.state.read().await;
        Ok(state
            .articles
            .iter()
            .filter(|row| state.matches(row, filter))
            .count() as i64)
    }

    async fn list_published_articles(
        &self,
        filter: &ArticleFilter,
        window: PageWindow,
    ) -> StoreResult<Vec<Article>> {
        let state = self.state.read().await;
        let mut rows: Vec<&ArticleRow> = state
            .articles
            .iter()
            .filter(|row| state.matches(row, filter))
            .collect();
        rows.sort_by(|a, b| (b.published_at, b.id).cmp(&(a.published_at, a.id)));

        Ok(rows
            .into_iter()
            .skip(window.offset.max(0) as usize)
            .take(window.limit.max(0) as usize)
            .filter_map(|row| state.article(row))
            .collect())
    }

    async fn find_category(&self, slug: &str) -> StoreResult<Option<Category>> {
        let state = self.state.read().await;
        Ok(state.categories.iter().find(|c| c.slug == slug).cloned())
    }

    async fn find_reporter(&self, slug: &str) -> StoreResult<Option<Reporter>> {
        let state = self.state.read().await;
        Ok(state.reporters.iter().find(|r| r.slug == slug).cloned())
    }

    async fn find_tag(&self, slug: &str) -> StoreResult<Option<Tag>> {
        let state = self.state.read().await;
        Ok(state.tags.iter().find(|t| t.slug == slug).cloned())
    }

    async fn find_identity_by_session(&self, token: &str) -> StoreResult<Option<Identity>> {
        let state = self.state.read().await;
        let now = chrono::Utc::now().naive_utc();

        Ok(state
            .sessions
            .iter()
            .find(|s| s.token == token && s.is_valid_at(now))
            .and_then(|s| state.identities.iter().find(|i| i.id == s.identity_id))
            .cloned())
    }

    async fn find_comment(&self, id: i32) -> StoreResult<Option<Comment>> {
        let state = self.state.read().await;
        Ok(state.comments.get(&id).cloned())
    }

    async fn insert_comment(&self, comment: NewComment) -> StoreResult<AuthoredComment> {
        let mut state = self.state.write().await;
        state.last_comment_id += 1;
        let comment = Comment {
            id: state.last_comment_id,
            article_id: comment.article_id,
            author_id: comment.author_id,
            parent_id: comment.parent_id,
            body: comment.body,
            created_at: comment.created_at,
            updated_at: comment.updated_at,
            is_approved: comment.is_approved,
            upvotes: comment.upvotes,
            downvotes: comment.downvotes,
        };
        state.comments.insert(comment.id, comment.clone());
        Ok(state.authored(&comment))
    }

    async fn article_comments(&self, article_id: i32) -> StoreResult<Vec<AuthoredComment>> {
        let state = self.state.read().await;
        let mut comments: Vec<AuthoredComment> = state
            .comments
            .values()
            .filter(|c| c.article_id == article_id)
            .map(|c| state.authored(c))
            .collect();
        comments.sort_by(|a, b| {
            (b.comment.created_at, b.comment.id).cmp(&(a.comment.created_at, a.comment.id))
        });
        Ok(comments)
    }

    async fn increment_vote(
        &self,
        comment_id: i32,
        direction: VoteDirection,
    ) -> StoreResult<Option<VoteTally>> {
        let mut state = self.state.write().await;
        let Some(comment) = state.comments.get_mut(&comment_id) else {
            return Ok(None);
        };

        match direction {
            VoteDirection::Up => comment.upvotes = comment.upvotes.saturating_add(1),
            VoteDirection::Down => comment.downvotes = comment.downvotes.saturating_add(1),
        }
        comment.updated_at = chrono::Utc::now().naive_utc();

        Ok(Some(VoteTally {
            upvotes: comment.upvotes,
            downvotes: comment.downvotes,
        }))
    }

    async fn set_approval(
        &self,
        comment_id: i32,
        approved: bool,
    ) -> StoreResult<Option<AuthoredComment>> {
        let mut state = self.state.write().await;
        let Some(comment) = state.comments.get_mut(&comment_id) else {
            return Ok(None);
        };
        comment.is_approved = approved;
        comment.updated_at = chrono::Utc::now().naive_utc();
        let comment = comment.clone();

        Ok(Some(state.authored(&comment)))
    }
}

/// Fills an empty store with a small newsroom so the API is usable without
/// a database.
pub async fn seed_demo_data(store: &MemoryStore) -> StoreResult<()> {
    let now = chrono::Utc::now().naive_utc();

    let politics = store.add_category("Politics", "politics").await;
    let science = store.add_category("Science", "science").await;
    let lois = store.add_reporter("Lois Lane", "lois-lane").await;
    let clark = store.add_reporter("Clark Kent", "clark-kent").await;
    let city = store.add_tag("Metropolis", "metropolis").await;
    let space = store.add_tag("Space", "space").await;

    let council = store
        .add_article(ArticleDraft {
            title: "City council approves new budget".into(),
            slug: "city-council-approves-new-budget".into(),
            body: "<p>The Metropolis city council voted <strong>seven to two</strong> on \
                   Tuesday to approve next year's budget, which expands transit service \
                   and funds two new libraries.</p><p>Opponents argued the plan leaves \
                   too little in reserve.</p>"
                .into(),
            status: ArticleStatus::Published,
            published_at: now - chrono::Duration::hours(3),
            category_id: politics.id,
            reporter_id: lois.id,
            tag_ids: vec![city.id],
        })
        .await;

    store
        .add_article(ArticleDraft {
            title: "Probe returns samples from near-Earth asteroid".into(),
            slug: "probe-returns-asteroid-samples".into(),
            body: "<p>A capsule carrying dust from a near-Earth asteroid landed safely \
                   in the desert this morning.</p>"
                .into(),
            status: ArticleStatus::Published,
            published_at: now - chrono::Duration::hours(1),
            category_id: science.id,
            reporter_id: clark.id,
            tag_ids: vec![space.id],
        })
        .await;

    store
        .add_article(ArticleDraft {
            title: "Unreleased: election night live blog".into(),
            slug: "election-night-live-blog".into(),
            body: "<p>Coming soon.</p>".into(),
            status: ArticleStatus::Draft,
            published_at: now,
            category_id: politics.id,
            reporter_id: lois.id,
            tag_ids: vec![city.id],
        })
        .await;

    let reader = store
        .add_identity(
            Traits {
                email: Some("jimmy@dailyplanet.test".into()),
                name: Some("Jimmy Olsen".into()),
            },
            false,
        )
        .await;
    let editor = store
        .add_identity(
            Traits {
                email: Some("perry@dailyplanet.test".into()),
                name: Some("Perry White".into()),
            },
            true,
        )
        .await;

    let first = store
        .insert_comment(NewComment::new(
            council,
            reader.id,
            None,
            "Finally some money for the libraries.".into(),
            true,
        ))
        .await?;
    store
        .insert_comment(NewComment::new(
            council,
            editor.id,
            Some(first.comment.id),
            "Follow-up story is in the works.".into(),
            true,
        ))
        .await?;

    let reader_session = store.issue_session(reader.id).await;
    let editor_session = store.issue_session(editor.id).await;
    tracing::info!("Seeded in-memory store with demo content");
    tracing::debug!(
        reader_token = %reader_session.token,
        editor_token = %editor_session.token,
        "Demo session tokens"
    );

    Ok(())
}
