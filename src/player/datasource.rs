//! Cache-aware data source chain: disk cache first, upstream on miss
//!
//! A miss streams from the upstream while teeing every chunk into a cache writer; the entry
//! is committed once the upstream stream ends. With `ignore_cache_on_error` set, any cache
//! failure flips the source into upstream-only mode for the rest of its life instead of
//! failing the read.

use std::fmt;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;
use futures::future::BoxFuture;
use futures::stream::{self, BoxStream};
use futures::{FutureExt, StreamExt};

use super::cache::{CacheWriter, MediaCache};
use super::config::CacheFlags;
use super::error::{PlayerError, PlayerResult};

pub type ByteStream = BoxStream<'static, PlayerResult<Bytes>>;

pub const USER_AGENT: &str = concat!("reels-rs/", env!("CARGO_PKG_VERSION"));

/// Where bytes come from on a cache miss.
pub trait Upstream: Send + Sync {
    fn open<'a>(&'a self, url: &'a str) -> BoxFuture<'a, PlayerResult<ByteStream>>;
}

/// Plain HTTP(S) fetch.
pub struct HttpUpstream {
    client: reqwest::Client,
}

impl HttpUpstream {
    pub fn new() -> PlayerResult<Self> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { client })
    }
}

impl Upstream for HttpUpstream {
    fn open<'a>(&'a self, url: &'a str) -> BoxFuture<'a, PlayerResult<ByteStream>> {
        async move {
            tracing::debug!(url, "Upstream fetch started");
            let response = self.client.get(url).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(PlayerError::HttpStatus {
                    status: status.as_u16(),
                    url: url.to_string(),
                });
            }
            let body = response
                .bytes_stream()
                .map(|chunk| chunk.map_err(PlayerError::from));
            Ok(body.boxed())
        }
        .boxed()
    }
}

pub struct CacheDataSource {
    cache: Arc<MediaCache>,
    upstream: Arc<dyn Upstream>,
    flags: CacheFlags,
    bypass: Arc<AtomicBool>,
}

impl CacheDataSource {
    pub fn new(cache: Arc<MediaCache>, upstream: Arc<dyn Upstream>, flags: CacheFlags) -> Self {
        Self {
            cache,
            upstream,
            flags,
            bypass: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn cache(&self) -> &Arc<MediaCache> {
        &self.cache
    }

    /// True once a cache failure has switched this source to upstream-only.
    pub fn is_bypassing(&self) -> bool {
        self.bypass.load(Ordering::Relaxed)
    }

    fn on_cache_error(&self, url: &str, operation: &'static str, error: io::Error) -> PlayerResult<()> {
        if self.flags.ignore_cache_on_error {
            tracing::warn!(url, operation, error = %error, "Cache failed, bypassing cache");
            self.bypass.store(true, Ordering::Relaxed);
            Ok(())
        } else {
            Err(PlayerError::Cache(error))
        }
    }

    pub async fn open(&self, url: &str) -> PlayerResult<ByteStream> {
        if !self.is_bypassing() {
            match self.cache.read(url).await {
                Ok(Some(data)) => {
                    tracing::debug!(url, bytes = data.len(), "Cache hit");
                    return Ok(stream::once(async move { Ok(data) }).boxed());
                }
                Ok(None) => tracing::debug!(url, "Cache miss"),
                Err(e) => self.on_cache_error(url, "read", e)?,
            }
        }

        let upstream = self.upstream.open(url).await?;
        if self.is_bypassing() {
            return Ok(upstream);
        }

        let writer = match self.cache.writer(url).await {
            Ok(writer) => writer,
            Err(e) => {
                self.on_cache_error(url, "open writer", e)?;
                return Ok(upstream);
            }
        };

        Ok(tee_into_cache(TeeState {
            url: url.to_string(),
            inner: upstream,
            writer: Some(writer),
            cache: Arc::clone(&self.cache),
            bypass: Arc::clone(&self.bypass),
            ignore_errors: self.flags.ignore_cache_on_error,
        }))
    }
}

struct TeeState {
    url: String,
    inner: ByteStream,
    writer: Option<CacheWriter>,
    cache: Arc<MediaCache>,
    bypass: Arc<AtomicBool>,
    ignore_errors: bool,
}

fn tee_into_cache(state: TeeState) -> ByteStream {
    stream::unfold(Some(state), |state| async move {
        let mut state = state?;

        match state.inner.next().await {
            Some(Ok(chunk)) => {
                let written = match state.writer.as_mut() {
                    Some(writer) => writer.write(&chunk).await,
                    None => Ok(()),
                };
                if let Err(e) = written {
                    if let Some(writer) = state.writer.take() {
                        writer.abandon();
                    }
                    if !state.ignore_errors {
                        return Some((Err(PlayerError::Cache(e)), None));
                    }
                    tracing::warn!(url = %state.url, error = %e, "Cache write failed, bypassing cache");
                    state.bypass.store(true, Ordering::Relaxed);
                }
                Some((Ok(chunk), Some(state)))
            }
            Some(Err(e)) => {
                if let Some(writer) = state.writer.take() {
                    writer.abandon();
                }
                Some((Err(e), None))
            }
            None => {
                if let Some(writer) = state.writer.take() {
                    if let Err(e) = state.cache.commit(writer).await {
                        if !state.ignore_errors {
                            return Some((Err(PlayerError::Cache(e)), None));
                        }
                        tracing::warn!(url = %state.url, error = %e, "Cache commit failed, bypassing cache");
                        state.bypass.store(true, Ordering::Relaxed);
                    }
                }
                None
            }
        }
    })
    .boxed()
}

/// One playlist entry: a URL bound to the data source it is read through.
#[derive(Clone)]
pub struct MediaSource {
    url: String,
    data_source: Arc<CacheDataSource>,
}

impl MediaSource {
    pub fn new(url: impl Into<String>, data_source: Arc<CacheDataSource>) -> Self {
        Self {
            url: url.into(),
            data_source,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn open(&self) -> PlayerResult<ByteStream> {
        self.data_source.open(&self.url).await
    }
}

impl fmt::Debug for MediaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaSource").field("url", &self.url).finish()
    }
}
