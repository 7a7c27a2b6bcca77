//! Configuration module for Image-Finder
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every field has a default, so a missing section falls back to the built-in
//! crawl and enrichment settings.
//!
//! # Example
//!
//! ```no_run
//! use image_finder::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("image-finder.toml")).unwrap();
//! println!("Crawler will use {} workers", config.crawler.workers);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, EnrichmentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
