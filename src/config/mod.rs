//! Configuration module
//!
//! This module handles loading, parsing, and validating the TOML crawler
//! configuration. The configuration is read once at startup and then passed
//! by reference to every component; nothing here is global.
//!
//! # Example
//!
//! ```no_run
//! use job_crawl::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawler.toml")).unwrap();
//! println!("Strategy: {}", config.crawler.strategy.as_str());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlStrategy, CrawlerConfig, PaginationConfig, PaginationType, SeedMode,
    SelectorConfig, StoreBackend, StoreConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
