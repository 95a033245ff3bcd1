use axum::{
    Router,
    routing::{get, post},
};

use crate::App;

use super::{
    comment::{
        create::{add_comment, reply_comment},
        moderate::{approve_comment, unapprove_comment},
        vote::vote_comment,
    },
    pages::{get_article, list_articles, list_category, list_reporter, list_tag},
};

pub fn pages() -> Router<App> {
    Router::<App>::new()
        .route("/articles", get(list_articles))
        .route("/articles/{id}", get(get_article))
        .route("/categories/{slug}", get(list_category))
        .route("/reporters/{slug}", get(list_reporter))
        .route("/tags/{slug}", get(list_tag))
}

pub fn comments() -> Router<App> {
    // TODO rate limit these public endpoints
    Router::<App>::new()
        .route("/add/{article_id}", post(add_comment))
        .route("/reply/{comment_id}", post(reply_comment))
        .route("/vote/{comment_id}/{direction}", post(vote_comment))
        .route("/approve/{comment_id}", post(approve_comment))
        .route("/unapprove/{comment_id}", post(unapprove_comment))
}
