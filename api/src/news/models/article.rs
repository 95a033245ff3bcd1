use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::Serialize;

use super::{category::Category, reporter::Reporter, tag::Tag};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArticleStatus {
    Draft,
    Published,
}

impl ArticleStatus {
    pub const DRAFT: &'static str = "draft";
    pub const PUBLISHED: &'static str = "published";

    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleStatus::Draft => Self::DRAFT,
            ArticleStatus::Published => Self::PUBLISHED,
        }
    }

    /// Unknown statuses are treated as drafts so they never leak publicly.
    pub fn parse(status: &str) -> Self {
        match status {
            Self::PUBLISHED => ArticleStatus::Published,
            _ => ArticleStatus::Draft,
        }
    }
}

// The row as stored in the database
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = crate::schema::news_articles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ArticleRow {
    pub id: i32,
    pub title: String,
    pub slug: String,
    pub body: String,
    pub status: String,
    pub published_at: NaiveDateTime,
    pub category_id: i32,
    pub reporter_id: i32,
}

// The article with its relations resolved
#[derive(Debug, Clone, Serialize)]
pub struct Article {
    pub id: i32,
    pub title: String,
    pub slug: String,
    pub body: String,
    pub status: ArticleStatus,
    pub published_at: NaiveDateTime,
    pub category: Category,
    pub reporter: Reporter,
    pub tags: Vec<Tag>,
}

impl Article {
    pub fn from_parts(
        row: ArticleRow,
        category: Category,
        reporter: Reporter,
        tags: Vec<Tag>,
    ) -> Self {
        Article {
            id: row.id,
            title: row.title,
            slug: row.slug,
            body: row.body,
            status: ArticleStatus::parse(&row.status),
            published_at: row.published_at,
            category,
            reporter,
            tags,
        }
    }

    pub fn is_published(&self) -> bool {
        self.status == ArticleStatus::Published
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parsing_defaults_to_draft() {
        assert_eq!(ArticleStatus::parse("published"), ArticleStatus::Published);
        assert_eq!(ArticleStatus::parse("draft"), ArticleStatus::Draft);
        assert_eq!(ArticleStatus::parse("PUBLISHED"), ArticleStatus::Draft);
        assert_eq!(ArticleStatus::Published.as_str(), "published");
    }
}
