//! Configuration module for Registry-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use registry_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Rows per term: {}", config.crawl.max_rows_per_term);
//! ```

mod parser;
mod types;
mod validation;

pub use types::{BrowserConfig, Config, CrawlConfig, OutputConfig, PortalConfig, TimingConfig};

pub use parser::{compute_config_hash, load_config, parse_config};
pub use validation::validate;
