use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use super::options::ExtractOptions;
use super::traits::{MediaExtractor, VideoInfo};
use crate::error::ExtractError;

const COMMON_PATHS: &[&str] = &[
    "/opt/homebrew/bin/yt-dlp",
    "/usr/local/bin/yt-dlp",
    "/usr/bin/yt-dlp",
];

/// Extractor backed by the `yt-dlp` command line tool.
pub struct YtDlp {
    program: PathBuf,
    timeout: Duration,
    socket_timeout: Duration,
}

impl YtDlp {
    pub fn new(program: Option<PathBuf>, timeout: Duration, socket_timeout: Duration) -> Self {
        Self {
            program: program.unwrap_or_else(Self::locate),
            timeout,
            socket_timeout,
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Well-known install locations first, then whatever `PATH` resolves.
    fn locate() -> PathBuf {
        COMMON_PATHS
            .iter()
            .map(Path::new)
            .find(|p| p.exists())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("yt-dlp"))
    }

    pub fn build_args(&self, url: &str, options: &ExtractOptions) -> Vec<String> {
        let mut args = vec![
            "--dump-json".to_string(),
            "--skip-download".to_string(),
            "--format".to_string(),
            options.format.clone(),
            "--socket-timeout".to_string(),
            self.socket_timeout.as_secs().to_string(),
            "--user-agent".to_string(),
            options.user_agent.clone(),
        ];

        if options.no_playlist {
            args.push("--no-playlist".to_string());
        }
        if options.quiet {
            args.push("--quiet".to_string());
            args.push("--no-warnings".to_string());
        }
        if !options.player_clients.is_empty() {
            args.push("--extractor-args".to_string());
            args.push(format!("youtube:player_client={}", options.player_client_arg()));
        }
        for (name, value) in &options.headers {
            args.push("--add-header".to_string());
            args.push(format!("{name}:{value}"));
        }

        args.push(url.to_string());
        args
    }
}

#[async_trait]
impl MediaExtractor for YtDlp {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn extract_info(
        &self,
        url: &str,
        options: &ExtractOptions,
    ) -> Result<VideoInfo, ExtractError> {
        let args = self.build_args(url, options);
        debug!(program = %self.program.display(), ?args, "running extraction tool");

        let child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ExtractError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;

        let output = timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| ExtractError::Timeout(self.timeout))?
            .map_err(|source| ExtractError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(ExtractError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(serde_json::from_slice(&output.stdout)?)
    }
}
