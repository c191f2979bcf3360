use crate::comments::CommentAggregator;
use crate::config::Config;
use crate::youtube_api::YouTubeClient;
use eyre::Context;

pub mod comments;
pub mod config;
pub mod quota;
pub mod server;
pub mod youtube_api;

#[cfg(test)]
mod mock;

pub use comments::{CommentItem, CommentsRequest, CommentsResponse, Failure, FilterStage};

/// Builds the aggregator both binaries run, talking to the endpoints in `config`.
pub fn setup_aggregator(config: &Config) -> eyre::Result<CommentAggregator> {
    let http = reqwest::ClientBuilder::new()
        // the API key is in the query string, so don't let it follow redirects elsewhere
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .context("build HTTP client")?;
    let client = YouTubeClient::new(config.endpoints.clone(), http);
    Ok(CommentAggregator::new(client, config.workers))
}
