use std::{cmp::Ordering, collections::HashMap};

use serde::{Deserialize, Serialize};

use crate::store::AuthoredComment;

use super::CommentView;

/// A top-level comment and its direct replies.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CommentThread {
    #[serde(flatten)]
    pub comment: CommentView,
    pub replies: Vec<CommentView>,
}

#[derive(PartialEq, Eq, Clone, Copy, Debug, Default)]
pub enum SortType {
    /// Highest score (upvotes minus downvotes) first
    Best,
    #[default]
    New,
}

impl<'de> Deserialize<'de> for SortType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        match String::deserialize(deserializer)?.as_str() {
            "best" => Ok(SortType::Best),
            "new" => Ok(SortType::New),
            _ => Err(serde::de::Error::custom("invalid sort type")),
        }
    }
}

/// Groups flat comments into threads one level deep and sorts them.
///
/// Comments whose parent is not a top-level comment of the input are left
/// out, which also drops replies to replies.
pub fn build_threads(comments: Vec<AuthoredComment>, sort: SortType) -> Vec<CommentThread> {
    let (roots, replies): (Vec<_>, Vec<_>) = comments
        .into_iter()
        .partition(|c| c.comment.parent_id.is_none());

    let mut index = HashMap::<i32, usize>::with_capacity(roots.len());
    let mut threads: Vec<CommentThread> = Vec::with_capacity(roots.len());

    for root in roots {
        index.insert(root.comment.id, threads.len());
        threads.push(CommentThread {
            comment: root.into(),
            replies: vec![],
        });
    }

    for reply in replies {
        let parent_id = reply.comment.parent_id;
        match parent_id.and_then(|id| index.get(&id)) {
            Some(&i) => threads[i].replies.push(reply.into()),
            None => tracing::trace!(
                comment_id = reply.comment.id,
                ?parent_id,
                "Skipping comment without a top-level parent"
            ),
        }
    }

    sort_threads(&mut threads, sort);
    threads
}

fn compare(a: &CommentView, b: &CommentView, sort: SortType) -> Ordering {
    let newest_first = (b.created_at, b.id).cmp(&(a.created_at, a.id));
    match sort {
        SortType::New => newest_first,
        SortType::Best => {
            let score = |c: &CommentView| i64::from(c.upvotes) - i64::from(c.downvotes);
            score(b).cmp(&score(a)).then(newest_first)
        }
    }
}

fn sort_threads(threads: &mut [CommentThread], sort: SortType) {
    // sort the top level comments
    threads.sort_by(|a, b| compare(&a.comment, &b.comment, sort));

    // then the replies of each thread
    for thread in threads {
        thread.replies.sort_by(|a, b| compare(a, b, sort));
    }
}
