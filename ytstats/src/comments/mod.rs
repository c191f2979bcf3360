//! Aggregation of all comments and replies on a video into a single, filterable list.
//!
//! The pipeline for one request is:
//!
//! 1. [`threads::fetch_threads`] pages through the video's comment threads. Threads whose
//!    replies were all embedded are complete; the rest are queued for reply resolution.
//! 2. [`replies::resolve_replies`] drains that queue with a fixed pool of workers, each paging
//!    through the replies of one comment at a time.
//! 3. [`filter::apply`] narrows the collection down with the caller's filter stages.
//! 4. [`sort_chronologically`] orders what's left by publish time.
//!
//! [`aggregate::CommentAggregator`] strings these together and accounts for the quota spent.

use crate::youtube_api::{CommentThread, YouTubeComment};
use serde::{Deserialize, Serialize};

pub mod aggregate;
pub mod filter;
pub mod replies;
pub mod threads;

pub use aggregate::{CommentAggregator, CommentsRequest, CommentsResponse, Failure};
pub use filter::FilterStage;

/// A top-level comment on a video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub author_name: String,
    pub author_id: String,
    pub author_channel_url: String,
    pub message: String,
    pub likes: u32,
    pub published_at: String,
    /// The number of replies YouTube says this comment has.
    pub reply_count: u32,
}

/// A reply to a top-level comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub id: String,
    pub parent_id: String,
    pub author_name: String,
    pub author_id: String,
    pub author_channel_url: String,
    pub message: String,
    pub likes: u32,
    pub published_at: String,
}

/// One entry of the aggregated list: either a comment or a reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CommentItem {
    Comment(Comment),
    Reply(Reply),
}

impl CommentItem {
    pub fn id(&self) -> &str {
        match self {
            CommentItem::Comment(c) => &c.id,
            CommentItem::Reply(r) => &r.id,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            CommentItem::Comment(c) => &c.message,
            CommentItem::Reply(r) => &r.message,
        }
    }

    pub fn author_name(&self) -> &str {
        match self {
            CommentItem::Comment(c) => &c.author_name,
            CommentItem::Reply(r) => &r.author_name,
        }
    }

    pub fn published_at(&self) -> &str {
        match self {
            CommentItem::Comment(c) => &c.published_at,
            CommentItem::Reply(r) => &r.published_at,
        }
    }
}

impl From<Comment> for CommentItem {
    fn from(comment: Comment) -> Self {
        CommentItem::Comment(comment)
    }
}

impl From<Reply> for CommentItem {
    fn from(reply: Reply) -> Self {
        CommentItem::Reply(reply)
    }
}

impl Comment {
    pub fn from_thread(thread: &CommentThread) -> Self {
        let top = &thread.snippet.top_level_comment;
        Self {
            id: top.id.clone(),
            author_name: top.snippet.author_display_name.clone(),
            author_id: top.snippet.author_id().to_string(),
            author_channel_url: top.snippet.author_channel_url.clone(),
            message: top.snippet.text_display.clone(),
            likes: top.snippet.like_count,
            published_at: top.snippet.published_at.clone(),
            reply_count: thread.snippet.total_reply_count,
        }
    }
}

impl From<YouTubeComment> for Reply {
    fn from(comment: YouTubeComment) -> Self {
        let author_id = comment.snippet.author_id().to_string();
        // reply ids are "<parent id>.<reply id>"
        let parent_id = match comment.snippet.parent_id {
            Some(parent) if !parent.is_empty() => parent,
            _ => comment
                .id
                .split_once('.')
                .map(|(parent, _)| parent)
                .unwrap_or(&comment.id)
                .to_string(),
        };
        Self {
            id: comment.id,
            parent_id,
            author_name: comment.snippet.author_display_name,
            author_id,
            author_channel_url: comment.snippet.author_channel_url,
            message: comment.snippet.text_display,
            likes: comment.snippet.like_count,
            published_at: comment.snippet.published_at,
        }
    }
}

/// Orders comments and replies by publish time, oldest first.
///
/// Timestamps are compared as strings, which is sound since YouTube always emits them as
/// fixed-width UTC. The sort is stable: items published at the same instant keep their
/// relative order.
pub fn sort_chronologically(mut items: Vec<CommentItem>) -> Vec<CommentItem> {
    items.sort_by(|a, b| a.published_at().cmp(b.published_at()));
    items
}
