use async_trait::async_trait;
use serde::Deserialize;

use super::options::ExtractOptions;
use crate::error::ExtractError;

/// One entry of the `formats` list reported by the extraction tool.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MediaFormat {
    #[serde(default)]
    pub format_id: String,
    #[serde(default)]
    pub ext: String,
    pub url: Option<String>,
    pub vcodec: Option<String>,
    pub acodec: Option<String>,
    pub height: Option<u32>,
}

impl MediaFormat {
    /// Carries both a video and an audio track.
    pub fn is_muxed(&self) -> bool {
        let has = |codec: &Option<String>| codec.as_deref().is_some_and(|c| c != "none");
        has(&self.vcodec) && has(&self.acodec)
    }
}

/// Subset of the extraction tool's info dictionary this service reads.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct VideoInfo {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    /// Direct URL of the selected format, absent when the selection is merged.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub formats: Vec<MediaFormat>,
}

impl VideoInfo {
    pub const DEFAULT_TITLE: &'static str = "YouTube Video";

    /// The playable URL: the selected one, else the last muxed format.
    pub fn stream_url(&self) -> Option<&str> {
        self.url.as_deref().filter(|u| !u.is_empty()).or_else(|| {
            self.formats
                .iter()
                .rev()
                .filter(|f| f.is_muxed())
                .find_map(|f| f.url.as_deref())
        })
    }

    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(Self::DEFAULT_TITLE)
    }
}

/// Black-box capability that turns a watch page URL into media locations.
#[async_trait]
pub trait MediaExtractor: Send + Sync {
    /// Name of the extractor (for logging)
    fn name(&self) -> &'static str;

    async fn extract_info(
        &self,
        url: &str,
        options: &ExtractOptions,
    ) -> Result<VideoInfo, ExtractError>;
}
