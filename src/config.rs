use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use crate::cache::DEFAULT_CACHE_TTL;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Resolves video links and relays the media through a local proxy.
#[derive(Debug, Clone, Parser)]
#[command(name = "video-stream-relay", version, about)]
pub struct Config {
    /// Address the HTTP server binds to
    #[arg(long, env = "RELAY_LISTEN", default_value = "0.0.0.0:5000")]
    pub listen: SocketAddr,

    /// Number of resolved streams kept in memory
    #[arg(long, env = "RELAY_CACHE_CAPACITY", default_value = "100")]
    pub cache_capacity: NonZeroUsize,

    /// Seconds a resolved stream stays valid in the cache
    #[arg(long, env = "RELAY_CACHE_TTL_SECS", default_value_t = DEFAULT_CACHE_TTL.as_secs())]
    pub cache_ttl_secs: u64,

    /// Maximum number of requests handled at once
    #[arg(long, env = "RELAY_MAX_CONNECTIONS", default_value = "100")]
    pub max_connections: NonZeroUsize,

    /// Path to the yt-dlp binary (searched for when unset)
    #[arg(long, env = "RELAY_YTDLP_PATH")]
    pub ytdlp_path: Option<PathBuf>,

    /// Upper bound for one extraction run, in seconds
    #[arg(long, env = "RELAY_EXTRACT_TIMEOUT_SECS", default_value_t = 60)]
    pub extract_timeout_secs: u64,

    /// Socket timeout for outbound connections, in seconds
    #[arg(long, env = "RELAY_SOCKET_TIMEOUT_SECS", default_value_t = 30)]
    pub socket_timeout_secs: u64,

    /// Log level or EnvFilter directive (RUST_LOG takes precedence)
    #[arg(long, env = "RELAY_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[arg(long, env = "RELAY_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

impl Config {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn extract_timeout(&self) -> Duration {
        Duration::from_secs(self.extract_timeout_secs)
    }

    pub fn socket_timeout(&self) -> Duration {
        Duration::from_secs(self.socket_timeout_secs)
    }
}
