use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

use crate::error::InvalidLink;

pub const VIDEO_ID_LEN: usize = 11;

const WATCH_URL_BASE: &str = "https://www.youtube.com/watch?v=";

// Optional scheme and subdomains, anchored so the host itself must be one of
// the platform domains.
const HOST_PREFIX: &str = r"^(?:https?://)?(?:[\w-]+\.)*";
// Exactly eleven id characters, not followed by another one.
const ID_CAPTURE: &str = r"([0-9A-Za-z_-]{11})(?:[^0-9A-Za-z_-]|$)";

static LINK_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // watch
        r"youtube\.com/watch\?(?:[^#\s]*&)?v=",
        // short link
        r"youtu\.be/",
        // shorts
        r"youtube\.com/shorts/",
        // embed
        r"youtube(?:-nocookie)?\.com/embed/",
        // live
        r"youtube\.com/live/",
    ]
    .into_iter()
    .map(|path| {
        Regex::new(&format!("{HOST_PREFIX}{path}{ID_CAPTURE}")).expect("link pattern must compile")
    })
    .collect()
});

/// The 11-character token naming a single video.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VideoId(String);

impl VideoId {
    /// Extracts the identifier from a user-supplied link.
    ///
    /// Patterns are tried in a fixed order and the first capture wins. The
    /// input is only trimmed; no scheme or host repair is attempted.
    pub fn parse(input: &str) -> Result<Self, InvalidLink> {
        let input = input.trim();

        LINK_PATTERNS
            .iter()
            .find_map(|re| re.captures(input))
            .and_then(|caps| caps.get(1))
            .map(|m| Self(m.as_str().to_string()))
            .ok_or_else(|| InvalidLink(input.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical watch page URL handed to the extraction tool.
    pub fn watch_url(&self) -> String {
        format!("{}{}", WATCH_URL_BASE, self.0)
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
