use rand::seq::SliceRandom;
use std::fmt;

/// Desktop browser signatures rotated across primary extraction attempts.
pub const DESKTOP_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_4_1) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4.1 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
];

/// Signature of the official Android app, used by the fallback attempt.
pub const ANDROID_USER_AGENT: &str =
    "com.google.android.youtube/19.09.37 (Linux; U; Android 11) gzip";

pub const ORIGIN_REFERER: &str = "https://www.youtube.com/";

const PRIMARY_FORMAT: &str = "best[ext=mp4]/best[height<=1080]";
const FALLBACK_FORMAT: &str = "best[ext=mp4]/best";

/// Client identity the extraction tool presents to the origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerClient {
    Web,
    Android,
}

impl fmt::Display for PlayerClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Web => write!(f, "web"),
            Self::Android => write!(f, "android"),
        }
    }
}

/// Preferences passed to the extraction tool for one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    pub format: String,
    pub no_playlist: bool,
    pub quiet: bool,
    pub player_clients: Vec<PlayerClient>,
    pub user_agent: String,
    pub headers: Vec<(String, String)>,
}

impl ExtractOptions {
    /// Web and Android clients with a desktop user agent drawn from the pool.
    pub fn primary() -> Self {
        let user_agent = DESKTOP_USER_AGENTS
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(DESKTOP_USER_AGENTS[0]);

        Self {
            format: PRIMARY_FORMAT.to_string(),
            no_playlist: true,
            quiet: true,
            player_clients: vec![PlayerClient::Web, PlayerClient::Android],
            user_agent: user_agent.to_string(),
            headers: vec![
                ("Referer".to_string(), ORIGIN_REFERER.to_string()),
                ("Accept-Language".to_string(), "en-US,en;q=0.9".to_string()),
            ],
        }
    }

    /// Android-only client with the mobile app signature and a looser format.
    pub fn fallback() -> Self {
        Self {
            format: FALLBACK_FORMAT.to_string(),
            no_playlist: true,
            quiet: true,
            player_clients: vec![PlayerClient::Android],
            user_agent: ANDROID_USER_AGENT.to_string(),
            headers: vec![("Accept-Language".to_string(), "en-US,en;q=0.9".to_string())],
        }
    }

    /// Value for `--extractor-args youtube:player_client=...`.
    pub fn player_client_arg(&self) -> String {
        self.player_clients
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}
