//! The per-request pipeline, from validation to the final response envelope.

use super::{CommentItem, FilterStage, filter, replies, sort_chronologically, threads};
use crate::quota::QuotaLedger;
use crate::youtube_api::{Status, YouTubeClient};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Status message for a request that didn't name an API key.
pub const KEY_MISSING: &str = "keyMissing";

/// Status message for a request that didn't name a video.
pub const VIDEO_ID_MISSING: &str = "videoIdMissing";

/// What a caller wants aggregated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentsRequest {
    pub video_id: String,
    /// Passed through to YouTube on every call.
    pub key: String,
    /// Applied in order; empty means everything is returned.
    pub filters: Vec<FilterStage>,
}

/// The successful result of aggregating a video's comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentsResponse {
    pub quota_usage: u64,
    pub video_id: String,
    /// Comments and replies that passed the filter, oldest first.
    pub comments: Vec<CommentItem>,
}

/// A failed aggregation, together with the quota it had already used up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{status} (quota used: {quota_usage})")]
pub struct Failure {
    pub quota_usage: u64,
    #[serde(flatten)]
    pub status: Status,
}

impl Failure {
    /// A failure that happened before anything was charged.
    pub fn free(status: Status) -> Self {
        Self {
            quota_usage: 0,
            status,
        }
    }
}

/// Aggregates all comments and replies on a video into one filtered, chronological list.
#[derive(Debug, Clone)]
pub struct CommentAggregator {
    client: YouTubeClient,
    workers: usize,
}

impl CommentAggregator {
    /// Creates an aggregator that resolves missing replies with `workers` concurrent workers.
    pub fn new(client: YouTubeClient, workers: usize) -> Self {
        Self {
            client,
            workers: workers.max(1),
        }
    }

    /// Runs the whole pipeline for `request`.
    ///
    /// Either way, the quota reported is exactly what YouTube billed for this request. On
    /// failure no comments are returned, even if some had been fetched.
    #[instrument(skip_all, fields(video_id = %request.video_id, stages = request.filters.len()))]
    pub async fn aggregate(&self, request: &CommentsRequest) -> Result<CommentsResponse, Failure> {
        let ledger = QuotaLedger::new();
        match self.run(request, &ledger).await {
            Ok(comments) => {
                tracing::info!(
                    comments = comments.len(),
                    quota = ledger.total(),
                    "aggregated comments"
                );
                Ok(CommentsResponse {
                    quota_usage: ledger.total(),
                    video_id: request.video_id.clone(),
                    comments,
                })
            }
            Err(status) => {
                tracing::warn!(%status, quota = ledger.total(), "comment aggregation failed");
                Err(Failure {
                    quota_usage: ledger.total(),
                    status,
                })
            }
        }
    }

    async fn run(
        &self,
        request: &CommentsRequest,
        ledger: &QuotaLedger,
    ) -> Result<Vec<CommentItem>, Status> {
        if request.key.is_empty() {
            return Err(Status::new(400, KEY_MISSING));
        }
        if request.video_id.is_empty() {
            return Err(Status::new(400, VIDEO_ID_MISSING));
        }

        let fetched =
            threads::fetch_threads(&self.client, &request.video_id, &request.key, ledger).await?;
        let items = replies::resolve_replies(
            &self.client,
            &request.key,
            fetched.pending,
            fetched.items,
            ledger,
            self.workers,
        )
        .await?;

        let matched = filter::apply(&request.filters, items);
        Ok(sort_chronologically(matched))
    }
}
