//! HTTP surface of the comment aggregator.
//!
//! Serves a single endpoint:
//!
//! ```text
//! GET /ytstats/v1/comments/?key=<api key>&id=<video id>
//! ```
//!
//! The request body, if any, is a JSON list of [`FilterStage`]s. Successful requests are
//! answered with a [`CommentsResponse`]; everything else with a status envelope
//! (`quota_usage`, `status_code`, `status_message`) whose code is also the HTTP status.

use crate::comments::aggregate::{KEY_MISSING, VIDEO_ID_MISSING};
use crate::comments::{CommentAggregator, CommentsRequest, CommentsResponse, Failure, FilterStage};
use crate::youtube_api::Status;
use eyre::Context;
use http::header::CONTENT_TYPE;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{self, Body, Bytes};
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use serde::Serialize;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

pub const COMMENTS_PATH: &str = "/ytstats/v1/comments/";

/// Largest filter body accepted.
pub const MAX_BODY_BYTES: usize = 1 << 20;

const SEARCH_BODY_INVALID: &str = "searchBodyInvalid";
const SEARCH_BODY_TOO_LARGE: &str = "searchBodyTooLarge";
const METHOD_NOT_SUPPORTED: &str = "methodNotSupported";
const NOT_FOUND: &str = "notFound";

/// Accepts connections on `listener` until `shutdown` completes.
///
/// Each connection is served on its own task. Connections that are still open at shutdown
/// are left to finish on their own.
pub async fn serve(
    listener: TcpListener,
    aggregator: CommentAggregator,
    shutdown: impl Future<Output = ()>,
) -> eyre::Result<()> {
    let aggregator = Arc::new(aggregator);
    let addr = listener.local_addr().context("get local address")?;
    tracing::info!(%addr, "serving comment aggregation");

    let mut shutdown = std::pin::pin!(shutdown);
    loop {
        let (conn, remote) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(accepted) => accepted,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to accept connection");
                    continue;
                }
            },
            _ = &mut shutdown => {
                tracing::info!("shutting down");
                return Ok(());
            }
        };

        let aggregator = Arc::clone(&aggregator);
        tokio::spawn(async move {
            let conn = hyper_util::rt::TokioIo::new(conn);
            let service = service_fn(move |req: Request<body::Incoming>| {
                let aggregator = Arc::clone(&aggregator);
                async move { Ok::<_, Infallible>(handle(&aggregator, remote, req).await) }
            });
            if let Err(e) = hyper::server::conn::http1::Builder::new()
                .serve_connection(conn, service)
                .await
            {
                tracing::debug!(%remote, error = %e, "connection closed with error");
            }
        });
    }
}

async fn handle<B>(
    aggregator: &CommentAggregator,
    remote: SocketAddr,
    req: Request<B>,
) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    tracing::info!(method = %req.method(), %remote, path = req.uri().path(), "request");

    let path = req.uri().path().trim_end_matches('/');
    if path != COMMENTS_PATH.trim_end_matches('/') {
        return failure(Failure::free(Status::new(404, NOT_FOUND)));
    }
    match comments(aggregator, req).await {
        Ok(response) => json(StatusCode::OK, &response),
        Err(f) => failure(f),
    }
}

async fn comments<B>(
    aggregator: &CommentAggregator,
    req: Request<B>,
) -> Result<CommentsResponse, Failure>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    if req.method() != Method::GET {
        return Err(Failure::free(Status::new(405, METHOD_NOT_SUPPORTED)));
    }

    let mut request = CommentsRequest::default();
    for (k, v) in form_urlencoded::parse(req.uri().query().unwrap_or("").as_bytes()) {
        match &*k {
            "key" => request.key = v.into_owned(),
            "id" => request.video_id = v.into_owned(),
            _ => {}
        }
    }
    if request.key.is_empty() {
        return Err(Failure::free(Status::new(400, KEY_MISSING)));
    }
    if request.video_id.is_empty() {
        return Err(Failure::free(Status::new(400, VIDEO_ID_MISSING)));
    }

    request.filters = read_filters(req.into_body())
        .await
        .map_err(Failure::free)?;
    aggregator.aggregate(&request).await
}

/// Reads the filter list from a request body.
///
/// An empty body, or one that is just `null`, means no filtering.
async fn read_filters<B>(body: B) -> Result<Vec<FilterStage>, Status>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let bytes = match Limited::new(body, MAX_BODY_BYTES).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.is::<LengthLimitError>() => {
            return Err(Status::new(413, SEARCH_BODY_TOO_LARGE));
        }
        Err(e) => {
            tracing::debug!(error = %e, "failed to read request body");
            return Err(Status::new(400, SEARCH_BODY_INVALID));
        }
    };

    if bytes.trim_ascii().is_empty() {
        return Ok(Vec::new());
    }
    let filters: Option<Vec<FilterStage>> = serde_json::from_slice(&bytes).map_err(|e| {
        tracing::debug!(error = %e, "filter body is not a list of filter stages");
        Status::new(400, SEARCH_BODY_INVALID)
    })?;
    Ok(filters.unwrap_or_default())
}

fn failure(failure: Failure) -> Response<Full<Bytes>> {
    let status =
        StatusCode::from_u16(failure.status.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    json(status, &failure)
}

fn json(status: StatusCode, body: &impl Serialize) -> Response<Full<Bytes>> {
    let (status, body) = match serde_json::to_vec(body) {
        Ok(body) => (status, body),
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize response");
            (StatusCode::INTERNAL_SERVER_ERROR, Vec::new())
        }
    };
    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, http::HeaderValue::from_static("application/json"));
    response
}
