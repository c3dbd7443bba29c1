//! HTTP fetcher
//!
//! Crawl tasks run on plain worker threads, so the fetcher owns a small
//! tokio runtime and blocks on it for each request. The body is buffered
//! completely before it is handed to the scanner.

use crate::config::FetcherConfig;
use crate::crawler::{DocumentId, Fetcher};
use crate::{FetchError, SiteMapError};
use reqwest::Client;
use std::io::{Cursor, Read};
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};
use tracing::debug;
use url::Url;

/// Threads driving HTTP I/O; requests are issued from the worker pool
const RUNTIME_THREADS: usize = 2;

/// Builds an HTTP client with the configured user agent and timeouts
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &FetcherConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// [`Fetcher`] requesting documents over HTTP(S)
///
/// Redirects are followed by the client. Any response that does not end in
/// a 2xx status is reported as a failed fetch.
///
/// The fetcher must not be created or dropped from inside an async context.
pub struct HttpFetcher {
    client: Client,
    runtime: Runtime,
}

impl HttpFetcher {
    pub fn new(config: &FetcherConfig) -> Result<Self, SiteMapError> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(RUNTIME_THREADS)
            .thread_name("http-fetcher")
            .enable_all()
            .build()
            .map_err(SiteMapError::Runtime)?;

        let client = {
            let _guard = runtime.enter();
            build_http_client(config)?
        };

        Ok(Self { client, runtime })
    }

    async fn get(&self, id: &DocumentId, url: Url) -> Result<Vec<u8>, FetchError> {
        let http_error = |source| FetchError::Http {
            id: id.to_string(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(http_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                id: id.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(http_error)?;
        Ok(body.to_vec())
    }
}

impl Fetcher for HttpFetcher {
    fn request(&self, doc_id: &DocumentId) -> Result<Box<dyn Read + Send>, FetchError> {
        let url = Url::parse(doc_id.as_str()).map_err(|e| FetchError::InvalidId {
            id: doc_id.to_string(),
            reason: e.to_string(),
        })?;

        let body = self.runtime.block_on(self.get(doc_id, url))?;
        debug!(doc = %doc_id, bytes = body.len(), "Fetched document");

        Ok(Box::new(Cursor::new(body)))
    }
}
