//! Mock YouTube Data API server for testing the comment pipeline.
//!
//! Serves scripted `commentThreads.list` and `comments.list` pages over real HTTP, so that
//! tests exercise the same client code paths as production. Pages are keyed by video or
//! parent id plus page token (empty for the first page); anything unscripted is answered
//! with a 404 error envelope. Requests made with the key `invalid` are rejected the way
//! YouTube rejects bad API keys.

use crate::youtube_api::errors::KEY_INVALID;
use crate::youtube_api::{Endpoints, YouTubeClient};
use eyre::Context;
use http_body_util::Full;
use hyper::body::{self, Bytes};
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Scripted responses, keyed by `(id, page token)`.
#[derive(Debug, Default)]
pub(crate) struct MockYouTube {
    thread_pages: HashMap<(String, String), Value>,
    reply_pages: HashMap<(String, String), Value>,
}

#[derive(Debug, Default)]
struct Counters {
    threads: AtomicUsize,
    replies: AtomicUsize,
}

/// A running [`MockYouTube`]. The server stops when this is dropped.
#[derive(Debug)]
pub(crate) struct RunningMock {
    addr: SocketAddr,
    counters: Arc<Counters>,
    server: JoinHandle<()>,
}

impl MockYouTube {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Scripts the `commentThreads.list` page for `video_id` at `token`.
    pub(crate) fn thread_page(&mut self, video_id: &str, token: &str, body: Value) -> &mut Self {
        self.thread_pages
            .insert((video_id.to_string(), token.to_string()), body);
        self
    }

    /// Scripts the `comments.list` page for `parent_id` at `token`.
    pub(crate) fn reply_page(&mut self, parent_id: &str, token: &str, body: Value) -> &mut Self {
        self.reply_pages
            .insert((parent_id.to_string(), token.to_string()), body);
        self
    }

    pub(crate) fn error_body(code: u16, reason: &str) -> Value {
        json!({
            "error": {
                "code": code,
                "message": format!("mock error: {reason}"),
                "errors": [{"message": "mock", "domain": "youtube.mock", "reason": reason}],
            }
        })
    }

    pub(crate) async fn start(self) -> RunningMock {
        self.try_start().await.expect("start mock YouTube server")
    }

    async fn try_start(self) -> eyre::Result<RunningMock> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .context("bind to localhost")?;
        let addr = listener.local_addr().context("get local address")?;
        let counters = Arc::new(Counters::default());
        let script = Arc::new(self);

        let server = tokio::spawn({
            let counters = Arc::clone(&counters);
            async move {
                loop {
                    let Ok((conn, _)) = listener.accept().await else {
                        break;
                    };
                    let script = Arc::clone(&script);
                    let counters = Arc::clone(&counters);
                    tokio::spawn(async move {
                        let conn = hyper_util::rt::TokioIo::new(conn);
                        let service = service_fn(move |req: Request<body::Incoming>| {
                            let response = script.respond(&req, &counters);
                            async move { Ok::<_, Infallible>(response) }
                        });
                        if let Err(e) = hyper::server::conn::http1::Builder::new()
                            .serve_connection(conn, service)
                            .await
                        {
                            tracing::trace!(error = %e, "mock connection ended");
                        }
                    });
                }
            }
        });

        Ok(RunningMock {
            addr,
            counters,
            server,
        })
    }

    fn respond(&self, req: &Request<body::Incoming>, counters: &Counters) -> Response<Full<Bytes>> {
        let mut params: HashMap<String, String> = HashMap::new();
        for (k, v) in form_urlencoded::parse(req.uri().query().unwrap_or("").as_bytes()) {
            params.insert(k.into_owned(), v.into_owned());
        }
        let param = |name: &str| params.get(name).cloned().unwrap_or_default();

        let (pages, id) = match req.uri().path() {
            "/commentThreads" => {
                counters.threads.fetch_add(1, Ordering::SeqCst);
                (&self.thread_pages, param("videoId"))
            }
            "/comments" => {
                counters.replies.fetch_add(1, Ordering::SeqCst);
                (&self.reply_pages, param("parentId"))
            }
            _ => return reply(Self::error_body(404, "notFound")),
        };

        if param("key") == "invalid" {
            return reply(Self::error_body(400, KEY_INVALID));
        }

        match pages.get(&(id, param("pageToken"))) {
            Some(body) => reply(body.clone()),
            None => reply(Self::error_body(404, "commentNotFound")),
        }
    }
}

fn reply(body: Value) -> Response<Full<Bytes>> {
    let status = body
        .pointer("/error/code")
        .and_then(Value::as_u64)
        .and_then(|code| StatusCode::from_u16(code as u16).ok())
        .unwrap_or(StatusCode::OK);
    let mut response = Response::new(Full::new(Bytes::from(body.to_string())));
    *response.status_mut() = status;
    response
}

impl RunningMock {
    pub(crate) fn endpoints(&self) -> Endpoints {
        Endpoints {
            comment_threads: format!("http://{}/commentThreads", self.addr),
            comments: format!("http://{}/comments", self.addr),
        }
    }

    pub(crate) fn client(&self) -> YouTubeClient {
        YouTubeClient::new(self.endpoints(), reqwest::Client::new())
    }

    pub(crate) fn thread_requests(&self) -> usize {
        self.counters.threads.load(Ordering::SeqCst)
    }

    pub(crate) fn reply_requests(&self) -> usize {
        self.counters.replies.load(Ordering::SeqCst)
    }
}

impl Drop for RunningMock {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// One page of a list response.
pub(crate) fn page(items: Vec<Value>, next_page_token: Option<&str>) -> Value {
    let mut page = json!({
        "kind": "youtube#commentListResponse",
        "pageInfo": {"totalResults": items.len(), "resultsPerPage": 100},
        "items": items,
    });
    if let Some(token) = next_page_token {
        page["nextPageToken"] = json!(token);
    }
    page
}

fn snippet(author: &str, text: &str, published_at: &str) -> Value {
    json!({
        "authorDisplayName": author,
        "authorProfileImageUrl": "https://yt3.ggpht.com/mock",
        "authorChannelUrl": format!("http://www.youtube.com/channel/UC{author}"),
        "authorChannelId": {"value": format!("UC{author}")},
        "textDisplay": text,
        "textOriginal": text,
        "canRate": true,
        "viewerRating": "none",
        "likeCount": 1,
        "publishedAt": published_at,
        "updatedAt": published_at,
    })
}

/// A `comment` resource for a reply. `id` must be of the form `<parent>.<reply>`.
pub(crate) fn reply_json(id: &str, author: &str, text: &str, published_at: &str) -> Value {
    let mut snippet = snippet(author, text, published_at);
    if let Some((parent, _)) = id.split_once('.') {
        snippet["parentId"] = json!(parent);
    }
    json!({"kind": "youtube#comment", "id": id, "snippet": snippet})
}

/// A `commentThread` resource claiming `total_replies` replies, of which `embedded` are
/// included.
pub(crate) fn thread_json(
    id: &str,
    author: &str,
    text: &str,
    published_at: &str,
    total_replies: u32,
    embedded: Vec<Value>,
) -> Value {
    let mut thread = json!({
        "kind": "youtube#commentThread",
        "id": id,
        "snippet": {
            "videoId": "mock",
            "topLevelComment": {
                "kind": "youtube#comment",
                "id": id,
                "snippet": snippet(author, text, published_at),
            },
            "canReply": true,
            "totalReplyCount": total_replies,
            "isPublic": true,
        },
    });
    if !embedded.is_empty() {
        thread["replies"] = json!({"comments": embedded});
    }
    thread
}
