use bytes::Bytes;
use http::header::{HeaderValue, ALLOW, CACHE_CONTROL, CONTENT_TYPE};
use http::{Method, Request, Response, StatusCode, Uri};
use http_body_util::{combinators::UnsyncBoxBody, BodyExt, Full, Limited};
use hyper::body::Body;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Serialize;
use std::convert::Infallible;
use tracing::{error, info, warn};

use super::models::{ErrorResponse, StreamRequest, StreamResponse};
use super::relay::Relay;
use super::BoxError;
use crate::error::RelayError;
use crate::extract::VideoId;
use crate::resolver::StreamResolver;

pub type ResponseBody = UnsyncBoxBody<Bytes, BoxError>;

const INDEX_HTML: &str = include_str!("../../static/index.html");
const MAX_REQUEST_BODY: usize = 16 * 1024;
const MEDIA_CONTENT_TYPE: &str = "video/mp4";

const MSG_EMPTY_LINK: &str = "Please paste a YouTube link";
const MSG_BAD_BODY: &str = "Invalid request body";
const MSG_INVALID_LINK: &str = "Not a valid YouTube link. Please check the URL.";
const MSG_UNAVAILABLE: &str =
    "This video cannot be streamed (private, live, or blocked). Please try again.";

// Same safe set as a conventional URL quote: unreserved characters and '/'.
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

/// Shared by every connection.
pub struct AppState {
    pub resolver: StreamResolver,
    pub relay: Relay,
}

/// Path of the local proxy endpoint relaying `upstream`.
pub fn proxy_path(upstream: &str) -> String {
    format!("/proxy?url={}", utf8_percent_encode(upstream, QUERY_VALUE))
}

pub async fn handle_request<B>(
    req: Request<B>,
    state: std::sync::Arc<AppState>,
) -> Result<Response<ResponseBody>, Infallible>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = match (&method, path.as_str()) {
        (&Method::GET, "/") => html(INDEX_HTML),
        (&Method::GET, "/health") => text(StatusCode::OK, "ok"),
        (&Method::POST, "/stream") => handle_stream(req, &state).await,
        (&Method::GET, "/proxy") => handle_proxy(proxy_target(req.uri()), &state).await,
        (_, "/" | "/health" | "/proxy") => method_not_allowed("GET"),
        (_, "/stream") => method_not_allowed("POST"),
        _ => text(StatusCode::NOT_FOUND, "Not Found"),
    };
    Ok(response)
}

async fn handle_stream<B>(req: Request<B>, state: &AppState) -> Response<ResponseBody>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    let body = match Limited::new(req.into_body(), MAX_REQUEST_BODY).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) => {
            warn!(error = %err, "failed to read request body");
            return json(StatusCode::BAD_REQUEST, &ErrorResponse::new(MSG_BAD_BODY));
        }
    };

    let raw_url = match serde_json::from_slice::<StreamRequest>(&body) {
        Ok(request) => request.url.trim().to_string(),
        Err(err) => {
            warn!(error = %err, "malformed stream request");
            return json(StatusCode::BAD_REQUEST, &ErrorResponse::new(MSG_BAD_BODY));
        }
    };
    if raw_url.is_empty() {
        return json(StatusCode::BAD_REQUEST, &ErrorResponse::new(MSG_EMPTY_LINK));
    }
    info!(input = %raw_url, "stream requested");

    let id = match VideoId::parse(&raw_url) {
        Ok(id) => id,
        Err(err) => {
            info!(error = %err, "rejected link");
            return json(StatusCode::BAD_REQUEST, &ErrorResponse::new(MSG_INVALID_LINK));
        }
    };

    match state.resolver.resolve(&id).await {
        Ok(result) => json(
            StatusCode::OK,
            &StreamResponse {
                stream_url: proxy_path(&result.stream_url),
                title: result.title,
            },
        ),
        Err(err) => {
            error!(video_id = %id, error = %err, cause = ?std::error::Error::source(&err), "stream unavailable");
            json(StatusCode::BAD_REQUEST, &ErrorResponse::new(MSG_UNAVAILABLE))
        }
    }
}

/// Decoded `url` query parameter, if present and non-empty.
fn proxy_target(uri: &Uri) -> Option<String> {
    let query = uri.query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "url")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

async fn handle_proxy(target: Option<String>, state: &AppState) -> Response<ResponseBody> {
    let Some(target) = target else {
        return text(StatusCode::BAD_REQUEST, "Missing URL");
    };

    match url::Url::parse(&target) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
        _ => return text(StatusCode::BAD_REQUEST, "Invalid URL"),
    }

    match state.relay.open(&target).await {
        Ok(body) => Response::builder()
            .status(StatusCode::OK)
            .header(CONTENT_TYPE, MEDIA_CONTENT_TYPE)
            .header(CACHE_CONTROL, "no-cache")
            .body(body)
            .unwrap_or_else(|_| internal_error()),
        Err(err) => {
            warn!(error = %err, "relay failed");
            let status = match err {
                RelayError::Upstream(ref e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
                _ => StatusCode::BAD_GATEWAY,
            };
            text(status, "Upstream unavailable")
        }
    }
}

fn full(bytes: impl Into<Bytes>) -> ResponseBody {
    Full::new(bytes.into())
        .map_err(|never| match never {})
        .boxed_unsync()
}

fn internal_error() -> Response<ResponseBody> {
    let mut response = Response::new(full(Bytes::new()));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
}

fn build(status: StatusCode, content_type: &'static str, body: impl Into<Bytes>) -> Response<ResponseBody> {
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, HeaderValue::from_static(content_type))
        .body(full(body))
        .unwrap_or_else(|_| internal_error())
}

fn text(status: StatusCode, body: &'static str) -> Response<ResponseBody> {
    build(status, "text/plain; charset=utf-8", body)
}

fn html(body: &'static str) -> Response<ResponseBody> {
    build(StatusCode::OK, "text/html; charset=utf-8", body)
}

fn json<T: Serialize>(status: StatusCode, value: &T) -> Response<ResponseBody> {
    match serde_json::to_vec(value) {
        Ok(body) => build(status, "application/json", body),
        Err(err) => {
            error!(error = %err, "failed to serialize response");
            internal_error()
        }
    }
}

fn method_not_allowed(allow: &'static str) -> Response<ResponseBody> {
    let mut response = text(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
    response
        .headers_mut()
        .insert(ALLOW, HeaderValue::from_static(allow));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::tests::{failure, info, StubExtractor};
    use std::num::NonZeroUsize;
    use std::sync::Arc;
    use std::time::Duration;

    const UPSTREAM: &str = "https://rr3.googlevideo.com/videoplayback?expire=1700000000&id=o-AB+c&mime=video/mp4";

    fn state(stub: Arc<StubExtractor>) -> Arc<AppState> {
        Arc::new(AppState {
            resolver: StreamResolver::new(stub, NonZeroUsize::new(4).unwrap(), Duration::from_secs(60)),
            relay: Relay::new(Duration::from_secs(5)).unwrap(),
        })
    }

    fn request(method: Method, uri: &str, body: &str) -> Request<Full<Bytes>> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Full::new(Bytes::from(body.to_string())))
            .unwrap()
    }

    async fn send(state: &Arc<AppState>, req: Request<Full<Bytes>>) -> (StatusCode, Bytes) {
        let response = handle_request(req, state.clone()).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, body)
    }

    #[test]
    fn proxy_path_quotes_upstream_url() {
        assert_eq!(
            proxy_path("https://cdn.example/v?id=1&mime=video/mp4"),
            "/proxy?url=https%3A//cdn.example/v%3Fid%3D1%26mime%3Dvideo/mp4"
        );
        assert_eq!(proxy_path("a b+c~d"), "/proxy?url=a%20b%2Bc~d");
    }

    #[tokio::test]
    async fn stream_returns_encoded_proxy_url() {
        let stub = Arc::new(StubExtractor::new(vec![Ok(info(UPSTREAM, "Clip"))]));
        let state = state(stub);

        let (status, body) = send(
            &state,
            request(Method::POST, "/stream", r#"{"url":"https://youtu.be/dQw4w9WgXcQ"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let response: StreamResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(response.title, "Clip");
        assert_eq!(response.stream_url, proxy_path(UPSTREAM));
        assert!(response.stream_url.contains("o-AB%2Bc"));

        let query = response.stream_url.trim_start_matches("/proxy?");
        let decoded = url::form_urlencoded::parse(query.as_bytes())
            .find(|(k, _)| k == "url")
            .map(|(_, v)| v.into_owned());
        assert_eq!(decoded.as_deref(), Some(UPSTREAM));
    }

    #[tokio::test]
    async fn stream_rejects_empty_and_unrecognised_links() {
        let stub = Arc::new(StubExtractor::new(Vec::new()));
        let state = state(stub.clone());

        let (status, body) = send(&state, request(Method::POST, "/stream", r#"{"url":"  "}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(serde_json::from_slice::<ErrorResponse>(&body).unwrap().error, MSG_EMPTY_LINK);

        let (status, body) = send(&state, request(Method::POST, "/stream", "{}")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(serde_json::from_slice::<ErrorResponse>(&body).unwrap().error, MSG_EMPTY_LINK);

        let (status, body) = send(
            &state,
            request(Method::POST, "/stream", r#"{"url":"https://vimeo.com/1"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(serde_json::from_slice::<ErrorResponse>(&body).unwrap().error, MSG_INVALID_LINK);

        let (status, _) = send(&state, request(Method::POST, "/stream", "not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        assert_eq!(stub.call_count(), 0);
    }

    #[tokio::test]
    async fn stream_reports_generic_error_after_fallback() {
        let stub = Arc::new(StubExtractor::new(vec![Err(failure()), Err(failure())]));
        let state = state(stub.clone());

        let (status, body) = send(
            &state,
            request(Method::POST, "/stream", r#"{"url":"https://www.youtube.com/shorts/dQw4w9WgXcQ"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(serde_json::from_slice::<ErrorResponse>(&body).unwrap().error, MSG_UNAVAILABLE);
        assert_eq!(stub.call_count(), 2);
    }

    #[tokio::test]
    async fn proxy_without_url_is_bad_request() {
        let stub = Arc::new(StubExtractor::new(Vec::new()));
        let state = state(stub);

        for uri in ["/proxy", "/proxy?url=", "/proxy?other=1"] {
            let (status, body) = send(&state, request(Method::GET, uri, "")).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(&body[..], b"Missing URL");
        }
    }

    #[tokio::test]
    async fn proxy_rejects_non_http_targets() {
        let state = state(Arc::new(StubExtractor::new(Vec::new())));
        let (status, _) = send(&state, request(Method::GET, "/proxy?url=file%3A///etc/passwd", "")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn routes_index_health_and_unknown_paths() {
        let state = state(Arc::new(StubExtractor::new(Vec::new())));

        let (status, body) = send(&state, request(Method::GET, "/", "")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(String::from_utf8_lossy(&body).contains("/stream"));

        let (status, body) = send(&state, request(Method::GET, "/health", "")).await;
        assert_eq!((status, &body[..]), (StatusCode::OK, &b"ok"[..]));

        let (status, _) = send(&state, request(Method::GET, "/stream", "")).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

        let (status, _) = send(&state, request(Method::GET, "/nope", "")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
