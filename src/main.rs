use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing::info;
use video_stream_relay::config::Config;
use video_stream_relay::extract::{MediaExtractor, YtDlp};
use video_stream_relay::logging::init_logging;
use video_stream_relay::proxy::{shutdown_on, AppState, ProxyServer, Relay};
use video_stream_relay::resolver::StreamResolver;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    init_logging(&config.log_level, config.log_format)?;

    let extractor = YtDlp::new(
        config.ytdlp_path.clone(),
        config.extract_timeout(),
        config.socket_timeout(),
    );
    info!(extractor = extractor.name(), program = %extractor.program().display(), "extraction tool selected");

    let state = AppState {
        resolver: StreamResolver::new(Arc::new(extractor), config.cache_capacity, config.cache_ttl()),
        relay: Relay::new(config.socket_timeout()).context("building upstream http client")?,
    };

    let server = ProxyServer::bind(config.listen, state, config.max_connections)
        .await
        .with_context(|| format!("binding {}", config.listen))?;
    server
        .run(shutdown_on(tokio::signal::ctrl_c()))
        .await?;

    Ok(())
}
