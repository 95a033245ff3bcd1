use std::collections::HashSet;

use crate::{identity::Viewer, news::models::comment::Comment, store::AuthoredComment};

pub fn is_visible(viewer: Viewer, comment: &Comment) -> bool {
    viewer.is_staff() || comment.is_approved
}

/// Keeps the comments the viewer may see.
///
/// Top-level comments must be visible themselves. Replies must be visible and
/// hang off a visible top-level comment, so hiding a comment hides its replies.
pub fn visible_comments(viewer: Viewer, comments: Vec<AuthoredComment>) -> Vec<AuthoredComment> {
    let visible_roots: HashSet<i32> = comments
        .iter()
        .filter(|c| c.comment.parent_id.is_none() && is_visible(viewer, &c.comment))
        .map(|c| c.comment.id)
        .collect();

    comments
        .into_iter()
        .filter(|c| match c.comment.parent_id {
            None => visible_roots.contains(&c.comment.id),
            Some(parent_id) => {
                visible_roots.contains(&parent_id) && is_visible(viewer, &c.comment)
            }
        })
        .collect()
}
