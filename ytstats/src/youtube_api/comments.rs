//! YouTube Comments and CommentThreads API types.

use crate::youtube_api::types::PageInfo;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Response structure for the `commentThreads.list` API call.
///
/// See: <https://developers.google.com/youtube/v3/docs/commentThreads/list>
#[derive(Debug, Serialize, Deserialize)]
pub struct CommentThreadListResponse {
    /// Identifies the API resource's type.
    ///
    /// The value will be `youtube#commentThreadListResponse`.
    #[serde(default)]
    pub kind: String,
    /// A list of comment threads that match the request criteria.
    #[serde(default)]
    pub items: VecDeque<CommentThread>,
    #[serde(rename = "pageInfo", default)]
    pub page_info: PageInfo,
    /// Token that can be used as the value of the pageToken parameter to retrieve the next page in the result set.
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

/// A `commentThread` resource: a top-level comment and, if requested, some of its replies.
///
/// See: <https://developers.google.com/youtube/v3/docs/commentThreads#resource>
#[derive(Debug, Serialize, Deserialize)]
pub struct CommentThread {
    /// The ID that YouTube uses to uniquely identify the comment thread.
    #[serde(default)]
    pub id: String,
    pub snippet: CommentThreadSnippet,
    /// Replies to the top-level comment.
    ///
    /// YouTube embeds at most a handful of replies here. All replies are present only if the
    /// number of embedded replies equals [`CommentThreadSnippet::total_reply_count`].
    #[serde(default)]
    pub replies: Option<CommentThreadReplies>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommentThreadSnippet {
    #[serde(rename = "topLevelComment")]
    pub top_level_comment: YouTubeComment,
    /// The total number of replies (not including the top-level comment).
    #[serde(rename = "totalReplyCount", default)]
    pub total_reply_count: u32,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CommentThreadReplies {
    #[serde(default)]
    pub comments: Vec<YouTubeComment>,
}

/// Response structure for the `comments.list` API call, used to fetch the replies to a comment.
///
/// See: <https://developers.google.com/youtube/v3/docs/comments/list>
#[derive(Debug, Serialize, Deserialize)]
pub struct CommentListResponse {
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub items: VecDeque<YouTubeComment>,
    #[serde(rename = "pageInfo", default)]
    pub page_info: PageInfo,
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

/// A `comment` resource, either a top-level comment or a reply.
///
/// See: <https://developers.google.com/youtube/v3/docs/comments#resource>
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YouTubeComment {
    pub id: String,
    pub snippet: CommentSnippet,
}

/// This is a subset of the full snippet, containing only the fields we pass on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommentSnippet {
    /// The display name of the user who posted the comment.
    pub author_display_name: String,
    pub author_channel_url: String,
    pub author_channel_id: Option<AuthorChannelId>,
    /// The comment's text, in the format requested through `textFormat`.
    pub text_display: String,
    pub like_count: u32,
    /// ISO 8601, always in UTC and with a fixed width, so it sorts lexicographically.
    pub published_at: String,
    /// Only set for replies.
    pub parent_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthorChannelId {
    #[serde(default)]
    pub value: String,
}

impl CommentSnippet {
    pub fn author_id(&self) -> &str {
        self.author_channel_id
            .as_ref()
            .map(|id| id.value.as_str())
            .unwrap_or("")
    }
}
