//! Core YouTube API client functionality.

use crate::quota::{QuotaLedger, REPLY_PAGE_COST, THREAD_PAGE_COST};
use crate::youtube_api::{
    comments::{CommentListResponse, CommentThread, CommentThreadListResponse, YouTubeComment},
    errors::{Status, decode_response},
    types::{PagedStream, next_cursor},
};
use bytes::Bytes;
use eyre::Context;
use http::Method;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio_stream::Stream;
use tracing::instrument;

/// Upper bound YouTube accepts for `maxResults` on both comment endpoints.
const MAX_RESULTS: &str = "100";

/// Where the client sends its requests.
///
/// These are the production YouTube endpoints by default, but can be pointed elsewhere (for
/// example at a local mock in tests).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Root of the `commentThreads.list` API.
    pub comment_threads: String,
    /// Root of the `comments.list` API.
    pub comments: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            comment_threads: "https://www.googleapis.com/youtube/v3/commentThreads".to_string(),
            comments: "https://www.googleapis.com/youtube/v3/comments".to_string(),
        }
    }
}

/// Client for the comment endpoints of the YouTube Data API v3.
///
/// Requests are authorized with an API key that the caller supplies per call; the client
/// never stores it. Cloning is cheap and shares the underlying connection pool, so a clone
/// can be handed to each reply worker.
#[derive(Debug, Clone)]
pub struct YouTubeClient {
    endpoints: Arc<Endpoints>,
    /// HTTP client for API requests
    client: reqwest::Client,
}

impl YouTubeClient {
    pub fn new(endpoints: Endpoints, client: reqwest::Client) -> Self {
        Self {
            endpoints: Arc::new(endpoints),
            client,
        }
    }

    /// Fetches one page from a YouTube endpoint and returns its raw body.
    ///
    /// Unlike most clients, a non-2xx status is *not* an error here: YouTube describes its
    /// failures in the body, and [`decode_response`] is what turns those into a [`Status`].
    /// Only failing to talk to YouTube at all is an error.
    #[instrument(skip(self, query_params), level = tracing::Level::TRACE)]
    pub async fn fetch_page(&self, url: &str, query_params: &[(&str, &str)]) -> eyre::Result<Bytes> {
        let response = self
            .client
            .request(Method::GET, url)
            .query(query_params)
            .send()
            .await
            // the URL carries the API key
            .map_err(|e| e.without_url())
            .with_context(|| format!("send GET request to YouTube API: {}", url))?;

        let status_code = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| e.without_url())
            .context("read YouTube API response body")?;

        tracing::trace!(%status_code, bytes = body.len(), "got YouTube API response");
        Ok(body)
    }

    /// Fetches and decodes one page, keeping the quota ledger up to date.
    ///
    /// The ledger is charged `cost` once YouTube has answered, whatever the answer is, and the
    /// charge is taken back if the answer was a key rejection. A call that never reached
    /// YouTube costs nothing.
    async fn fetch_charged<T: DeserializeOwned>(
        &self,
        url: &str,
        query_params: &[(&str, &str)],
        ledger: &QuotaLedger,
        cost: u64,
    ) -> Result<T, Status> {
        let body = self.fetch_page(url, query_params).await.map_err(|e| {
            tracing::warn!(error = %format!("{e:#}"), "failed to query YouTube API");
            Status::failed_to_query()
        })?;

        ledger.charge(cost);
        decode_response(&body).inspect_err(|status| {
            if status.is_key_invalid() {
                tracing::debug!(cost, "API key rejected, refunding quota");
                ledger.refund(cost);
            } else {
                tracing::debug!(%status, "YouTube API call failed");
            }
        })
    }

    /// Returns a paginated stream of all comment threads on a video.
    ///
    /// Each page fetched charges [`THREAD_PAGE_COST`] to `ledger`. The stream ends after the
    /// first failed page, yielding that failure.
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/docs/commentThreads/list>
    #[instrument(skip(self, key, ledger))]
    pub fn list_comment_threads<'a>(
        &'a self,
        video_id: &'a str,
        key: &'a str,
        ledger: &'a QuotaLedger,
    ) -> impl Stream<Item = Result<CommentThread, Status>> + 'a {
        PagedStream::new(move |page_token| async move {
            let response = self
                .list_comment_threads_internal(video_id, key, page_token, ledger)
                .await?;
            Ok::<_, Status>((response.items, next_cursor(response.next_page_token)))
        })
    }

    /// Returns a paginated stream of all replies to a top-level comment.
    ///
    /// Each page fetched charges [`REPLY_PAGE_COST`] to `ledger`. The stream ends after the
    /// first failed page, yielding that failure.
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/docs/comments/list>
    #[instrument(skip(self, key, ledger))]
    pub fn list_replies<'a>(
        &'a self,
        parent_id: &'a str,
        key: &'a str,
        ledger: &'a QuotaLedger,
    ) -> impl Stream<Item = Result<YouTubeComment, Status>> + 'a {
        PagedStream::new(move |page_token| async move {
            let response = self
                .list_replies_internal(parent_id, key, page_token, ledger)
                .await?;
            Ok::<_, Status>((response.items, next_cursor(response.next_page_token)))
        })
    }

    async fn list_comment_threads_internal(
        &self,
        video_id: &str,
        key: &str,
        page_token: Option<String>,
        ledger: &QuotaLedger,
    ) -> Result<CommentThreadListResponse, Status> {
        let mut query_params = vec![
            ("part", "snippet,replies"),
            ("maxResults", MAX_RESULTS),
            ("textFormat", "plainText"),
            ("videoId", video_id),
            ("key", key),
        ];

        if let Some(ref token) = page_token {
            query_params.push(("pageToken", token.as_str()));
        }

        let threads: CommentThreadListResponse = self
            .fetch_charged(
                &self.endpoints.comment_threads,
                &query_params,
                ledger,
                THREAD_PAGE_COST,
            )
            .await?;

        tracing::debug!(
            video_id,
            total_results = threads.page_info.total_results,
            returned_items = threads.items.len(),
            "fetched comment threads"
        );

        Ok(threads)
    }

    async fn list_replies_internal(
        &self,
        parent_id: &str,
        key: &str,
        page_token: Option<String>,
        ledger: &QuotaLedger,
    ) -> Result<CommentListResponse, Status> {
        let mut query_params = vec![
            ("part", "snippet"),
            ("maxResults", MAX_RESULTS),
            ("textFormat", "plainText"),
            ("parentId", parent_id),
            ("key", key),
        ];

        if let Some(ref token) = page_token {
            query_params.push(("pageToken", token.as_str()));
        }

        let replies: CommentListResponse = self
            .fetch_charged(
                &self.endpoints.comments,
                &query_params,
                ledger,
                REPLY_PAGE_COST,
            )
            .await?;

        tracing::debug!(
            parent_id,
            returned_items = replies.items.len(),
            "fetched replies"
        );

        Ok(replies)
    }
}
