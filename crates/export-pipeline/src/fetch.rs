//! Media fetching.
//!
//! Each EDL media segment carries a source reference that resolves to raw
//! bytes one of two ways: `blob:` URIs hit the in-memory [`BlobStore`]
//! directly, while remote http(s) URLs are relayed through the server-side
//! media proxy because the upstream CDNs enforce cross-origin restrictions.
//! Any other scheme is unreachable.
//!
//! A failed segment never aborts the batch; it is logged and dropped from
//! the outgoing file set. The caller escalates only when nothing at all
//! could be fetched.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use clipflow_common::{ClipflowError, ClipflowResult};

use crate::blob::{BlobStore, BLOB_SCHEME};

/// Maximum in-flight segment downloads. Downloads fan out up to this many
/// workers, but results are merged back in request order so the observable
/// behavior matches a sequential fetch.
pub const FETCH_CONCURRENCY: usize = 4;

/// Per-segment fetch failure. Recoverable: the segment is dropped from the
/// render file set and the batch continues.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    #[error("unreachable source: {url}")]
    Unreachable { url: String },

    #[error("media proxy rejected {url} with status {status}")]
    ProxyRejected { url: String, status: u16 },

    #[error("empty response for {url}")]
    Empty { url: String },
}

/// How a source URL is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceRoute {
    /// In-memory blob reference; fetched directly, no proxy.
    Blob,
    /// Remote URL; relayed through the media proxy.
    Proxy,
    /// Unknown scheme; nothing can resolve it.
    Unsupported,
}

impl SourceRoute {
    pub fn classify(url: &str) -> Self {
        if url.starts_with(BLOB_SCHEME) {
            SourceRoute::Blob
        } else if url.starts_with("http://") || url.starts_with("https://") {
            SourceRoute::Proxy
        } else {
            SourceRoute::Unsupported
        }
    }
}

/// Resolves a segment source reference to raw bytes.
///
/// Implementations must be cheap to clone; batch fetching clones one handle
/// per download task.
pub trait MediaSource: Clone + Send + Sync + 'static {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, FetchError>> + Send;
}

/// One segment to fetch.
#[derive(Debug, Clone)]
pub struct MediaRequest {
    pub segment_id: String,
    pub filename: String,
    pub source_url: String,
    pub kind: String,
    pub name: String,
}

/// Successfully fetched segment bytes, ready to attach to the render
/// request.
#[derive(Debug, Clone)]
pub struct FetchedMedia {
    pub segment_id: String,
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Fetch a batch of media segments with bounded fan-out.
///
/// `on_progress` is invoked with `(completed, total)` as each download
/// settles; completions only ever increase, so progress derived from them
/// is monotone. The returned successes preserve request order. Failures are
/// logged and omitted; deciding whether an empty result is fatal is the
/// caller's policy.
pub async fn fetch_media_batch<F: MediaSource>(
    fetcher: &F,
    requests: Vec<MediaRequest>,
    mut on_progress: impl FnMut(usize, usize),
) -> Vec<FetchedMedia> {
    let total = requests.len();
    if total == 0 {
        return Vec::new();
    }

    let semaphore = Arc::new(Semaphore::new(FETCH_CONCURRENCY));
    let mut tasks = JoinSet::new();
    for (index, request) in requests.into_iter().enumerate() {
        let fetcher = fetcher.clone();
        let semaphore = Arc::clone(&semaphore);
        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            let result = fetcher.fetch(&request.source_url).await;
            (index, request, result)
        });
    }

    let mut completed = 0usize;
    let mut slots: Vec<Option<FetchedMedia>> = (0..total).map(|_| None).collect();
    while let Some(joined) = tasks.join_next().await {
        completed += 1;
        match joined {
            Ok((index, request, Ok(bytes))) => {
                tracing::debug!(
                    segment = %request.segment_id,
                    kind = %request.kind,
                    bytes = bytes.len(),
                    "Fetched media segment"
                );
                slots[index] = Some(FetchedMedia {
                    segment_id: request.segment_id,
                    filename: request.filename,
                    bytes,
                });
            }
            Ok((_, request, Err(err))) => {
                tracing::warn!(
                    segment = %request.segment_id,
                    kind = %request.kind,
                    name = %request.name,
                    error = %err,
                    "Dropping media segment from render file set"
                );
            }
            Err(err) => {
                tracing::warn!(error = %err, "Media fetch task failed");
            }
        }
        on_progress(completed, total);
    }

    slots.into_iter().flatten().collect()
}

#[derive(Debug, Serialize)]
struct ProxyRequest<'a> {
    url: &'a str,
}

/// Production media source: blob store for `blob:` URIs, media proxy for
/// remote URLs.
#[derive(Debug, Clone)]
pub struct HttpMediaSource {
    client: reqwest::Client,
    proxy_url: String,
    blobs: BlobStore,
}

impl HttpMediaSource {
    pub fn new(
        proxy_url: impl Into<String>,
        blobs: BlobStore,
        request_timeout: Duration,
    ) -> ClipflowResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| ClipflowError::config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            proxy_url: proxy_url.into(),
            blobs,
        })
    }

    async fn fetch_via_proxy(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .post(&self.proxy_url)
            .json(&ProxyRequest { url })
            .send()
            .await
            .map_err(|err| {
                tracing::warn!(url, error = %err, "Media proxy unreachable");
                FetchError::Unreachable {
                    url: url.to_string(),
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::ProxyRejected {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(|_| FetchError::Unreachable {
            url: url.to_string(),
        })?;
        if bytes.is_empty() {
            return Err(FetchError::Empty {
                url: url.to_string(),
            });
        }
        Ok(bytes.to_vec())
    }
}

impl MediaSource for HttpMediaSource {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, FetchError>> + Send {
        async move {
            match SourceRoute::classify(url) {
                SourceRoute::Blob => {
                    let bytes = self.blobs.get(url).ok_or_else(|| FetchError::Unreachable {
                        url: url.to_string(),
                    })?;
                    if bytes.is_empty() {
                        return Err(FetchError::Empty {
                            url: url.to_string(),
                        });
                    }
                    Ok(bytes.as_ref().clone())
                }
                SourceRoute::Proxy => self.fetch_via_proxy(url).await,
                SourceRoute::Unsupported => Err(FetchError::Unreachable {
                    url: url.to_string(),
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_routing() {
        assert_eq!(SourceRoute::classify("blob:abc"), SourceRoute::Blob);
        assert_eq!(
            SourceRoute::classify("http://cdn.example.com/a.mp4"),
            SourceRoute::Proxy
        );
        assert_eq!(
            SourceRoute::classify("https://cdn.example.com/a.mp4"),
            SourceRoute::Proxy
        );
        assert_eq!(
            SourceRoute::classify("file:///tmp/a.mp4"),
            SourceRoute::Unsupported
        );
        assert_eq!(SourceRoute::classify(""), SourceRoute::Unsupported);
    }

    #[derive(Clone)]
    struct FlakyFetcher;

    impl MediaSource for FlakyFetcher {
        fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, FetchError>> + Send {
            let url = url.to_string();
            async move {
                if url.ends_with("bad") {
                    Err(FetchError::Unreachable { url })
                } else {
                    Ok(url.into_bytes())
                }
            }
        }
    }

    fn request(id: &str, url: &str) -> MediaRequest {
        MediaRequest {
            segment_id: id.to_string(),
            filename: format!("{id}.mp4"),
            source_url: url.to_string(),
            kind: "video".to_string(),
            name: id.to_string(),
        }
    }

    #[tokio::test]
    async fn test_batch_preserves_request_order() {
        let requests = vec![
            request("a", "blob:1"),
            request("b", "blob:2"),
            request("c", "blob:3"),
        ];
        let fetched = fetch_media_batch(&FlakyFetcher, requests, |_, _| {}).await;
        let ids: Vec<_> = fetched.iter().map(|f| f.segment_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_batch_drops_failures_and_reports_progress() {
        let requests = vec![
            request("a", "blob:good"),
            request("b", "blob:bad"),
            request("c", "blob:good"),
        ];
        let mut updates = Vec::new();
        let fetched = fetch_media_batch(&FlakyFetcher, requests, |done, total| {
            updates.push((done, total));
        })
        .await;

        assert_eq!(fetched.len(), 2);
        assert_eq!(updates, vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[tokio::test]
    async fn test_empty_batch_is_a_no_op() {
        let fetched = fetch_media_batch(&FlakyFetcher, Vec::new(), |_, _| {
            panic!("no progress expected")
        })
        .await;
        assert!(fetched.is_empty());
    }

    #[tokio::test]
    async fn test_blob_source_fetches_without_proxy() {
        let blobs = BlobStore::new();
        let uri = store_bytes(&blobs, "clip", vec![7, 7, 7]);
        let source = HttpMediaSource::new(
            "http://localhost:0/api/media-proxy",
            blobs,
            Duration::from_secs(1),
        )
        .unwrap();

        let bytes = source.fetch(&uri).await.unwrap();
        assert_eq!(bytes, vec![7, 7, 7]);
    }

    #[tokio::test]
    async fn test_missing_blob_is_unreachable() {
        let source = HttpMediaSource::new(
            "http://localhost:0/api/media-proxy",
            BlobStore::new(),
            Duration::from_secs(1),
        )
        .unwrap();
        let err = source.fetch("blob:missing").await.unwrap_err();
        assert!(matches!(err, FetchError::Unreachable { .. }));
    }

    #[tokio::test]
    async fn test_empty_blob_is_empty_response() {
        let blobs = BlobStore::new();
        let uri = store_bytes(&blobs, "void", Vec::new());
        let source = HttpMediaSource::new(
            "http://localhost:0/api/media-proxy",
            blobs,
            Duration::from_secs(1),
        )
        .unwrap();
        let err = source.fetch(&uri).await.unwrap_err();
        assert!(matches!(err, FetchError::Empty { .. }));
    }

    fn store_bytes(blobs: &BlobStore, id: &str, bytes: Vec<u8>) -> String {
        blobs.insert(id, bytes)
    }
}
