//! Crawl orchestration
//!
//! This module contains the crawl engine, including:
//! - Document ids, locators, records and scan messages
//! - The fetcher, resolver and scanner interfaces the engine is built on
//! - The document registry owned by the result loop (internal)
//! - The coordinator running the submission and result loops

mod coordinator;
mod registry;
mod sink;
mod types;

pub use coordinator::{CrawlStats, Crawler, CrawlerOptions, DEFAULT_RESULTS_BUFFER};
pub use sink::MessageSink;
pub use types::{
    DocReader, DocumentId, DocumentRecord, Fetcher, Locator, Resolver, ScanMessage, ScanPayload,
    Scanner, DEFAULT_TITLE,
};
