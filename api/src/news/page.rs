//! Page representations handed to the client. Everything here is a pure
//! function of store records.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::{store::PageWindow, utils::truncate_html_words};

use super::{
    comment::thread::CommentThread,
    models::{article::Article, category::Category, reporter::Reporter, tag::Tag},
};

#[derive(Debug, Serialize, Clone)]
pub struct ArticlePage {
    pub article: Article,
    /// Visible comments, top-level and replies combined
    pub comment_count: usize,
    pub comments: Vec<CommentThread>,
}

pub fn render_article_page(article: Article, comments: Vec<CommentThread>) -> ArticlePage {
    let comment_count = comments.iter().map(|t| 1 + t.replies.len()).sum();
    ArticlePage {
        article,
        comment_count,
        comments,
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ArticleSummary {
    pub id: i32,
    pub title: String,
    pub slug: String,
    pub summary: String,
    pub published_at: NaiveDateTime,
    pub category: Category,
    pub reporter: Reporter,
    pub tags: Vec<Tag>,
}

pub fn summarize(article: Article, summary_words: usize) -> ArticleSummary {
    ArticleSummary {
        id: article.id,
        title: article.title,
        slug: article.slug,
        summary: truncate_html_words(&article.body, summary_words),
        published_at: article.published_at,
        category: article.category,
        reporter: article.reporter,
        tags: article.tags,
    }
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub num_pages: i64,
    pub has_previous: bool,
    pub has_next: bool,
}

impl Pagination {
    /// Clamps the requested page into range. A listing always has at least
    /// one (possibly empty) page.
    pub fn new(requested: Option<i64>, per_page: i64, total: i64) -> Self {
        let per_page = per_page.max(1);
        let total = total.max(0);
        let num_pages = ((total + per_page - 1) / per_page).max(1);
        let page = requested.unwrap_or(1).clamp(1, num_pages);

        Pagination {
            page,
            per_page,
            total,
            num_pages,
            has_previous: page > 1,
            has_next: page < num_pages,
        }
    }

    pub fn window(&self) -> PageWindow {
        PageWindow {
            offset: (self.page - 1) * self.per_page,
            limit: self.per_page,
        }
    }
}

/// What a filtered listing is about.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ListingSubject {
    Category(Category),
    Reporter(Reporter),
    Tag(Tag),
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ArticleListPage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<ListingSubject>,
    pub articles: Vec<ArticleSummary>,
    pub pagination: Pagination,
}

pub fn render_article_list(
    subject: Option<ListingSubject>,
    articles: Vec<Article>,
    pagination: Pagination,
    summary_words: usize,
) -> ArticleListPage {
    ArticleListPage {
        subject,
        articles: articles
            .into_iter()
            .map(|a| summarize(a, summary_words))
            .collect(),
        pagination,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::news::{
        comment::CommentView,
        models::article::ArticleStatus,
    };

    fn article(body: &str) -> Article {
        Article {
            id: 1,
            title: "Title".into(),
            slug: "title".into(),
            body: body.into(),
            status: ArticleStatus::Published,
            published_at: chrono::Utc::now().naive_utc(),
            category: Category {
                id: 1,
                name: "World".into(),
                slug: "world".into(),
            },
            reporter: Reporter {
                id: 1,
                name: "Lois Lane".into(),
                slug: "lois-lane".into(),
                email: None,
                bio: None,
            },
            tags: vec![],
        }
    }

    fn view(id: i32, parent_id: Option<i32>) -> CommentView {
        let now = chrono::Utc::now().naive_utc();
        CommentView {
            id,
            article_id: 1,
            author_name: "Reader".into(),
            body: "Body".into(),
            parent_id,
            created_at: now,
            updated_at: now,
            is_approved: true,
            upvotes: 0,
            downvotes: 0,
        }
    }

    #[test]
    fn pagination_clamps_out_of_range_pages() {
        let p = Pagination::new(Some(2), 10, 25);
        assert_eq!((p.page, p.num_pages), (2, 3));
        assert!(p.has_previous && p.has_next);
        assert_eq!(
            p.window(),
            PageWindow {
                offset: 10,
                limit: 10
            }
        );

        assert_eq!(Pagination::new(Some(99), 10, 25).page, 3);
        assert_eq!(Pagination::new(Some(-4), 10, 25).page, 1);
        assert_eq!(Pagination::new(None, 10, 25).page, 1);
    }

    #[test]
    fn empty_listing_has_one_page() {
        let p = Pagination::new(Some(3), 10, 0);
        assert_eq!((p.page, p.num_pages), (1, 1));
        assert!(!p.has_previous && !p.has_next);
        assert_eq!(p.window().offset, 0);
    }

    #[test]
    fn article_page_counts_replies() {
        let threads = vec![
            CommentThread {
                comment: view(1, None),
                replies: vec![view(3, Some(1)), view(4, Some(1))],
            },
            CommentThread {
                comment: view(2, None),
                replies: vec![],
            },
        ];

        let page = render_article_page(article("<p>Body</p>"), threads);
        assert_eq!(page.comment_count, 4);
        assert_eq!(page.comments.len(), 2);
    }

    #[test]
    fn listing_summaries_are_truncated() {
        let page = render_article_list(
            None,
            vec![article("<p>one two <b>three four</b></p>")],
            Pagination::new(None, 10, 1),
            3,
        );
        assert_eq!(page.articles[0].summary, "<p>one two <b>three …</b></p>");

        let json = serde_json::to_value(&page).unwrap();
        assert!(json.get("subject").is_none());
    }

    #[test]
    fn listing_subject_is_tagged() {
        let subject = ListingSubject::Tag(Tag {
            id: 1,
            name: "Space".into(),
            slug: "space".into(),
        });
        let json = serde_json::to_value(&subject).unwrap();
        assert_eq!(json["kind"], "tag");
        assert_eq!(json["slug"], "space");
    }
}
