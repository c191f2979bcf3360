//! Client for the comment endpoints of the YouTube Data API v3.
//!
//! # Core Concepts: Threads vs Replies
//!
//! YouTube exposes comments through two list endpoints:
//!
//! ## [`comments::CommentThread`] - `commentThreads.list`
//! - **Scope**: all top-level comments on one video
//! - **Replies**: a thread embeds only *some* of its replies, alongside the total reply count
//! - **Cost**: 5 quota units per page with `part=snippet,replies`
//!
//! ## [`comments::YouTubeComment`] - `comments.list`
//! - **Scope**: all replies to one top-level comment (`parentId`)
//! - **Use for**: completing threads whose embedded replies fall short of the total
//! - **Cost**: 2 quota units per page with `part=snippet`
//!
//! Both endpoints paginate with an opaque `nextPageToken`; [`PagedStream`] hides that and
//! yields items one by one. Every page is decoded with [`errors::decode_response`], which
//! turns YouTube's error envelope into a [`Status`], and is accounted for in a
//! [`crate::quota::QuotaLedger`].
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use ytstats::quota::QuotaLedger;
//! use ytstats::youtube_api::{Endpoints, YouTubeClient};
//! use tokio_stream::StreamExt;
//!
//! # async fn example() -> Result<(), ytstats::youtube_api::Status> {
//! let client = YouTubeClient::new(Endpoints::default(), reqwest::Client::new());
//! let ledger = QuotaLedger::new();
//!
//! let threads = client.list_comment_threads("dQw4w9WgXcQ", "my-api-key", &ledger);
//! let mut threads = std::pin::pin!(threads);
//! while let Some(thread) = threads.next().await {
//!     let thread = thread?;
//!     println!("{}: {}", thread.id, thread.snippet.top_level_comment.snippet.text_display);
//! }
//! println!("spent {} quota units", ledger.total());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod comments;
pub mod errors;
pub mod types;

pub use client::{Endpoints, YouTubeClient};
pub use errors::{Status, check_response, decode_response};
pub use types::{PageInfo, PagedStream};

pub use comments::{
    AuthorChannelId, CommentListResponse, CommentSnippet, CommentThread,
    CommentThreadListResponse, CommentThreadReplies, CommentThreadSnippet, YouTubeComment,
};
