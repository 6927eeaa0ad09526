use serde::Serialize;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::cache::{Cache, SharedCache};
use crate::error::{ExtractError, ResolveError};
use crate::extract::{ExtractOptions, MediaExtractor, VideoId};

/// A playable media location and its display title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamResult {
    pub stream_url: String,
    pub title: String,
}

/// Turns video ids into direct media URLs through the extractor, caching
/// successes.
pub struct StreamResolver {
    extractor: Arc<dyn MediaExtractor>,
    cache: SharedCache,
}

impl StreamResolver {
    pub fn new(
        extractor: Arc<dyn MediaExtractor>,
        cache_capacity: NonZeroUsize,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            extractor,
            cache: Arc::new(Mutex::new(Cache::new(cache_capacity, cache_ttl))),
        }
    }

    pub async fn resolve(&self, id: &VideoId) -> Result<StreamResult, ResolveError> {
        if let Some(hit) = self.cache.lock().await.get(id) {
            info!(video_id = %id, "cache hit");
            return Ok(hit);
        }

        let watch_url = id.watch_url();
        let result = match self.attempt(&watch_url, &ExtractOptions::primary()).await {
            Ok(result) => result,
            Err(err) => {
                warn!(video_id = %id, error = %err, "primary extraction failed, retrying with android client");
                self.attempt(&watch_url, &ExtractOptions::fallback())
                    .await
                    .map_err(|source| ResolveError::Unavailable {
                        id: id.to_string(),
                        source,
                    })?
            }
        };

        self.cache.lock().await.put(id.clone(), result.clone());
        info!(video_id = %id, title = %result.title, "stream resolved");
        Ok(result)
    }

    async fn attempt(
        &self,
        watch_url: &str,
        options: &ExtractOptions,
    ) -> Result<StreamResult, ExtractError> {
        let info = self.extractor.extract_info(watch_url, options).await?;
        let stream_url = info
            .stream_url()
            .ok_or_else(|| ExtractError::NoStream(info.id.clone()))?
            .to_string();

        Ok(StreamResult {
            stream_url,
            title: info.display_title().to_string(),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::extract::{PlayerClient, VideoInfo};
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;

    /// Scripted extractor: pops one outcome per call and records the options.
    pub(crate) struct StubExtractor {
        outcomes: StdMutex<Vec<Result<VideoInfo, ExtractError>>>,
        pub(crate) calls: StdMutex<Vec<(String, ExtractOptions)>>,
    }

    impl StubExtractor {
        pub(crate) fn new(mut outcomes: Vec<Result<VideoInfo, ExtractError>>) -> Self {
            outcomes.reverse();
            Self {
                outcomes: StdMutex::new(outcomes),
                calls: StdMutex::new(Vec::new()),
            }
        }

        pub(crate) fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl MediaExtractor for StubExtractor {
        fn name(&self) -> &'static str {
            "stub"
        }

        async fn extract_info(
            &self,
            url: &str,
            options: &ExtractOptions,
        ) -> Result<VideoInfo, ExtractError> {
            self.calls
                .lock()
                .unwrap()
                .push((url.to_string(), options.clone()));
            self.outcomes
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(ExtractError::NoStream("stub exhausted".into())))
        }
    }

    pub(crate) fn info(url: &str, title: &str) -> VideoInfo {
        VideoInfo {
            id: "dQw4w9WgXcQ".into(),
            title: Some(title.into()),
            url: Some(url.into()),
            formats: Vec::new(),
        }
    }

    pub(crate) fn failure() -> ExtractError {
        ExtractError::Failed {
            status: "exit status: 1".into(),
            stderr: "ERROR: Sign in to confirm you're not a bot".into(),
        }
    }

    fn resolver(stub: Arc<StubExtractor>) -> StreamResolver {
        StreamResolver::new(stub, NonZeroUsize::new(8).unwrap(), Duration::from_secs(60))
    }

    fn video_id() -> VideoId {
        VideoId::parse("https://youtu.be/dQw4w9WgXcQ").unwrap()
    }

    #[tokio::test]
    async fn resolves_through_canonical_watch_url() {
        let stub = Arc::new(StubExtractor::new(vec![Ok(info("https://cdn/a", "A"))]));
        let result = resolver(stub.clone()).resolve(&video_id()).await.unwrap();

        assert_eq!(result.stream_url, "https://cdn/a");
        assert_eq!(result.title, "A");
        let calls = stub.calls.lock().unwrap();
        assert_eq!(calls[0].0, "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
        assert_eq!(calls[0].1.player_clients, vec![PlayerClient::Web, PlayerClient::Android]);
    }

    #[tokio::test]
    async fn second_resolve_is_served_from_cache() {
        let stub = Arc::new(StubExtractor::new(vec![Ok(info("https://cdn/a", "A"))]));
        let resolver = resolver(stub.clone());

        let first = resolver.resolve(&video_id()).await.unwrap();
        let second = resolver.resolve(&video_id()).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(stub.call_count(), 1);
    }

    #[tokio::test]
    async fn primary_failure_triggers_one_fallback() {
        let stub = Arc::new(StubExtractor::new(vec![
            Err(failure()),
            Ok(info("https://cdn/android", "B")),
        ]));
        let result = resolver(stub.clone()).resolve(&video_id()).await.unwrap();

        assert_eq!(result.stream_url, "https://cdn/android");
        let calls = stub.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].1, ExtractOptions::fallback());
    }

    #[tokio::test]
    async fn fallback_failure_surfaces_unavailable_after_two_calls() {
        let stub = Arc::new(StubExtractor::new(vec![
            Err(failure()),
            Err(failure()),
            Ok(info("https://cdn/never", "C")),
        ]));
        let err = resolver(stub.clone()).resolve(&video_id()).await.unwrap_err();

        assert!(matches!(err, ResolveError::Unavailable { ref id, .. } if id == "dQw4w9WgXcQ"));
        assert_eq!(stub.call_count(), 2);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let stub = Arc::new(StubExtractor::new(vec![
            Err(failure()),
            Err(failure()),
            Ok(info("https://cdn/later", "D")),
        ]));
        let resolver = resolver(stub.clone());

        assert!(resolver.resolve(&video_id()).await.is_err());
        let result = resolver.resolve(&video_id()).await.unwrap();
        assert_eq!(result.stream_url, "https://cdn/later");
        assert_eq!(stub.call_count(), 3);
    }

    #[tokio::test]
    async fn result_without_stream_counts_as_failure() {
        let mut empty = info("", "E");
        empty.url = None;
        let stub = Arc::new(StubExtractor::new(vec![
            Ok(empty),
            Ok(info("https://cdn/e", "E")),
        ]));
        let result = resolver(stub.clone()).resolve(&video_id()).await.unwrap();

        assert_eq!(result.stream_url, "https://cdn/e");
        assert_eq!(stub.call_count(), 2);
    }
}
