//! Service configuration, read from the environment.

use crate::comments::replies::DEFAULT_WORKERS;
use crate::youtube_api::Endpoints;
use eyre::Context;
use std::net::SocketAddr;

pub const LISTEN_ADDR_VAR: &str = "YTSTATS_LISTEN_ADDR";
pub const WORKERS_VAR: &str = "YTSTATS_WORKERS";
pub const COMMENT_THREADS_URL_VAR: &str = "YTSTATS_COMMENT_THREADS_URL";
pub const COMMENTS_URL_VAR: &str = "YTSTATS_COMMENTS_URL";

const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Where the HTTP server listens.
    pub listen_addr: SocketAddr,
    /// Size of the reply resolver pool. Always at least 1.
    pub workers: usize,
    pub endpoints: Endpoints,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            workers: DEFAULT_WORKERS,
            endpoints: Endpoints::default(),
        }
    }
}

impl Config {
    /// Reads the configuration from the process environment.
    ///
    /// Unset variables fall back to their defaults.
    pub fn from_env() -> eyre::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from whatever `lookup` returns for each variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> eyre::Result<Self> {
        let mut config = Self::default();

        let listen_addr = lookup(LISTEN_ADDR_VAR).unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        config.listen_addr = listen_addr
            .parse()
            .with_context(|| format!("parse {LISTEN_ADDR_VAR} '{listen_addr}'"))?;

        if let Some(workers) = lookup(WORKERS_VAR) {
            let workers: usize = workers
                .trim()
                .parse()
                .with_context(|| format!("parse {WORKERS_VAR} '{workers}'"))?;
            if workers == 0 {
                eyre::bail!("{WORKERS_VAR} must be at least 1");
            }
            config.workers = workers;
        }

        if let Some(url) = lookup(COMMENT_THREADS_URL_VAR) {
            config.endpoints.comment_threads = url;
        }
        if let Some(url) = lookup(COMMENTS_URL_VAR) {
            config.endpoints.comments = url;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> eyre::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.listen_addr.to_string(), DEFAULT_LISTEN_ADDR);
        assert_eq!(config.workers, 10);
        assert_eq!(
            config.endpoints.comments,
            "https://www.googleapis.com/youtube/v3/comments"
        );
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            (LISTEN_ADDR_VAR, "0.0.0.0:9000"),
            (WORKERS_VAR, " 3 "),
            (COMMENT_THREADS_URL_VAR, "http://localhost:1/threads"),
            (COMMENTS_URL_VAR, "http://localhost:1/comments"),
        ])
        .unwrap();
        assert_eq!(config.listen_addr.port(), 9000);
        assert_eq!(config.workers, 3);
        assert_eq!(
            config.endpoints,
            Endpoints {
                comment_threads: "http://localhost:1/threads".to_string(),
                comments: "http://localhost:1/comments".to_string(),
            }
        );
    }

    #[test]
    fn test_invalid_values() {
        let e = load(&[(WORKERS_VAR, "0")]).unwrap_err();
        assert!(e.to_string().contains("at least 1"), "{e:#}");

        let e = load(&[(WORKERS_VAR, "many")]).unwrap_err();
        assert!(e.to_string().contains(WORKERS_VAR), "{e:#}");

        let e = load(&[(LISTEN_ADDR_VAR, "localhost")]).unwrap_err();
        assert!(e.to_string().contains(LISTEN_ADDR_VAR), "{e:#}");
    }
}
