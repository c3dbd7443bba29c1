use serde::Deserialize;

/// Default number of concurrent fetch/scan workers
pub const DEFAULT_WORKERS: usize = 6;

/// Default capacity of the queue between scanners and the result loop
pub const DEFAULT_RESULTS_BUFFER: usize = crate::crawler::DEFAULT_RESULTS_BUFFER;

/// Default number of links a scanner groups into one message
pub const DEFAULT_LINK_BATCH_SIZE: usize = 20;

/// Main configuration structure for Sitemapper
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Number of documents fetched and scanned concurrently
    pub workers: usize,

    /// Capacity of the scan results queue
    #[serde(rename = "results-buffer")]
    pub results_buffer: usize,

    /// Maximum number of links per scanner message
    #[serde(rename = "link-batch-size")]
    pub link_batch_size: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            results_buffer: DEFAULT_RESULTS_BUFFER,
            link_batch_size: DEFAULT_LINK_BATCH_SIZE,
        }
    }
}

/// HTTP fetcher configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// User agent sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Whole-request timeout in seconds
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Connection establishment timeout in seconds
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("sitemapper/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}
