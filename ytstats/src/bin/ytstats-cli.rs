use eyre::Context;
use std::io::IsTerminal;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use ytstats::config::Config;
use ytstats::{CommentsRequest, FilterStage, setup_aggregator};

const USAGE: &str = "usage: ytstats-cli <video-id> [filters.json]";

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();

    let mut args = std::env::args().skip(1);
    let Some(video_id) = args.next() else {
        eyre::bail!(USAGE);
    };
    let filters: Vec<FilterStage> = match args.next() {
        Some(path) => {
            let json = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("read filters from {path}"))?;
            serde_json::from_str(&json).with_context(|| format!("parse filters in {path}"))?
        }
        None => Vec::new(),
    };
    let key = std::env::var("YTSTATS_API_KEY").context("read API key from YTSTATS_API_KEY")?;

    let config = Config::from_env().context("load configuration")?;
    let aggregator = setup_aggregator(&config)?;
    let request = CommentsRequest {
        video_id,
        key,
        filters,
    };

    let json = match aggregator.aggregate(&request).await {
        Ok(response) => serde_json::to_string_pretty(&response),
        Err(failure) => {
            eprintln!("==> {failure}");
            serde_json::to_string_pretty(&failure)
        }
    }
    .context("serialize result")?;
    println!("{json}");

    Ok(())
}
