use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::Serialize;

#[derive(Queryable, Selectable, Identifiable, Debug, Serialize, Clone, PartialEq)]
#[diesel(table_name = crate::schema::comments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Comment {
    pub id: i32,
    pub article_id: i32,
    pub author_id: i32,
    pub parent_id: Option<i32>,
    pub body: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub is_approved: bool,
    pub upvotes: i32,
    pub downvotes: i32,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::comments)]
pub struct NewComment {
    pub article_id: i32,
    pub author_id: i32,
    pub parent_id: Option<i32>,
    pub body: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub is_approved: bool,
    pub upvotes: i32,
    pub downvotes: i32,
}

impl NewComment {
    pub fn new(
        article_id: i32,
        author_id: i32,
        parent_id: Option<i32>,
        body: String,
        is_approved: bool,
    ) -> Self {
        let now = chrono::Utc::now().naive_utc();
        NewComment {
            article_id,
            author_id,
            parent_id,
            body,
            created_at: now,
            updated_at: now,
            is_approved,
            upvotes: 0,
            downvotes: 0,
        }
    }
}
