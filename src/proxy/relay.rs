use bytes::{Bytes, BytesMut};
use futures_util::{stream, Stream, TryStreamExt};
use http::header::{REFERER, USER_AGENT};
use http_body_util::{combinators::UnsyncBoxBody, BodyExt, StreamBody};
use hyper::body::Frame;
use std::io;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::io::StreamReader;
use tracing::debug;

use super::{BoxError, CHUNK_SIZE};
use crate::error::RelayError;
use crate::extract::{DESKTOP_USER_AGENTS, ORIGIN_REFERER};

/// Pulls upstream media and hands it back as a chunked body.
#[derive(Clone)]
pub struct Relay {
    client: reqwest::Client,
}

impl Relay {
    pub fn new(socket_timeout: Duration) -> Result<Self, RelayError> {
        let client = reqwest::Client::builder()
            .connect_timeout(socket_timeout)
            .read_timeout(socket_timeout)
            .build()?;
        Ok(Self { client })
    }

    /// Starts the upstream GET under a browser disguise. The returned body
    /// yields frames of exactly `CHUNK_SIZE` bytes; only the last is shorter.
    pub async fn open(&self, url: &str) -> Result<UnsyncBoxBody<Bytes, BoxError>, RelayError> {
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, DESKTOP_USER_AGENTS[0])
            .header(REFERER, ORIGIN_REFERER)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::Status(status));
        }
        debug!(%status, content_length = ?response.content_length(), "upstream stream opened");

        let reader = StreamReader::new(Box::pin(response.bytes_stream().map_err(io::Error::other)));
        let chunks = fixed_chunks(reader, CHUNK_SIZE)
            .map_ok(Frame::data)
            .map_err(BoxError::from);

        Ok(StreamBody::new(chunks).boxed_unsync())
    }
}

/// Re-slices a byte source into `size`-byte chunks regardless of how the
/// upstream frames its reads.
fn fixed_chunks<R>(reader: R, size: usize) -> impl Stream<Item = io::Result<Bytes>>
where
    R: AsyncRead + Unpin,
{
    stream::try_unfold(reader, move |mut reader| async move {
        let mut chunk = BytesMut::with_capacity(size);
        while chunk.len() < size {
            let want = (size - chunk.len()) as u64;
            if (&mut reader).take(want).read_buf(&mut chunk).await? == 0 {
                break;
            }
        }

        if chunk.is_empty() {
            Ok::<_, io::Error>(None)
        } else {
            Ok(Some((chunk.freeze(), reader)))
        }
    })
}
