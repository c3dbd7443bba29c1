//! Configuration module for Sitemapper
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key is optional; a missing file section falls back to the defaults.
//!
//! # Example
//!
//! ```no_run
//! use sitemapper::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("sitemapper.toml")).unwrap();
//! println!("Crawling with {} workers", config.crawler.workers);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, FetcherConfig, DEFAULT_LINK_BATCH_SIZE, DEFAULT_RESULTS_BUFFER,
    DEFAULT_WORKERS,
};

// Re-export parser functions
pub use parser::{load_config, parse_config};
pub use validation::validate;
