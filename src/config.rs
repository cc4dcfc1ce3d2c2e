//! Configuration for the MID storage engine
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{MidError, Result};

/// Default retention before the oldest page may be purged (31 days)
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(31 * 24 * 60 * 60);

/// Default number of rotating pages
pub const DEFAULT_MAX_PAGES: u32 = 128;

/// Upper bound on pages; page ids are 16 bits
pub const MAX_PAGES_LIMIT: u32 = 1 << 16;

/// Main configuration for a MID log instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Directory holding the page files
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── 0.ms
    ///     ├── 1.ms
    ///     └── ...       (one file per page, lowercase hex id)
    pub data_dir: PathBuf,

    /// Number of pages in the rotation, ids are `[0, max_pages)`
    pub max_pages: u32,

    // -------------------------------------------------------------------------
    // Retention Configuration
    // -------------------------------------------------------------------------
    /// Minimum age of the newest reading in a page before it may be purged
    pub max_age: Duration,

    // -------------------------------------------------------------------------
    // Diagnostics
    // -------------------------------------------------------------------------
    /// Log every written and replayed record at debug level
    pub trace_records: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./mid_data"),
            max_pages: DEFAULT_MAX_PAGES,
            max_age: DEFAULT_MAX_AGE,
            trace_records: false,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check the values the engine relies on
    pub fn validate(&self) -> Result<()> {
        if self.max_pages == 0 || self.max_pages > MAX_PAGES_LIMIT {
            return Err(MidError::Config(format!(
                "max_pages must be in 1..={}, got {}",
                MAX_PAGES_LIMIT, self.max_pages
            )));
        }
        Ok(())
    }

    /// Retention limit in milliseconds
    pub fn max_age_ms(&self) -> u64 {
        self.max_age.as_millis() as u64
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the number of rotating pages
    pub fn max_pages(mut self, pages: u32) -> Self {
        self.config.max_pages = pages;
        self
    }

    /// Set the retention age required before purge
    pub fn max_age(mut self, age: Duration) -> Self {
        self.config.max_age = age;
        self
    }

    /// Enable per-record debug logging
    pub fn trace_records(mut self, enabled: bool) -> Self {
        self.config.trace_records = enabled;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
