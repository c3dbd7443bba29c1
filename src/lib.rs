//! Sitemapper: a concurrent site mapper
//!
//! This crate crawls a linked document graph from a single entry point,
//! scanning every reachable document exactly once on a bounded worker pool,
//! and reports one completed record per document.

pub mod config;
pub mod crawler;
pub mod pool;
pub mod sitemap;

use thiserror::Error;

/// Main error type for Sitemapper operations
#[derive(Debug, Error)]
pub enum SiteMapError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Worker pool error: {0}")]
    Pool(#[from] PoolError),

    #[error("Starting point {locator} is not valid: {reason}")]
    InvalidStart { locator: String, reason: String },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to build async runtime: {0}")]
    Runtime(std::io::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Crawl thread terminated abnormally")]
    CrawlThread,
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Worker pool construction errors
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("Capacity should be a positive number, got {0}")]
    InvalidCapacity(usize),

    #[error("Failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Errors returned by a fetcher for a single document
///
/// These never abort a crawl; the document is completed with the error
/// recorded as its failure reason.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request for {id} failed: {source}")]
    Http { id: String, source: reqwest::Error },

    #[error("Request for {id} returned HTTP {status}")]
    Status { id: String, status: u16 },

    #[error("Document id {id} cannot be requested: {reason}")]
    InvalidId { id: String, reason: String },

    #[error("{0}")]
    Other(String),
}

/// Result type alias for Sitemapper operations
pub type Result<T> = std::result::Result<T, SiteMapError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlStats, Crawler, DocumentId, DocumentRecord, Locator};
pub use pool::{ElasticPool, FixedPool, WorkerPool};
pub use sitemap::SiteMap;
