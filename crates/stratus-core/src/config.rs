//! Segmented operation configuration.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Largest page size storage services accept for a single segment.
pub const MAX_PAGE_SIZE: u32 = 5000;

// Default values
const DEFAULT_PAGE_SIZE: u32 = 1000;

/// Configuration shared by segmented listings and queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct SegmentConfig {
    /// Maximum number of results requested per segment
    #[cfg_attr(
        feature = "config",
        arg(long = "page-size", env = "STRATUS_PAGE_SIZE", default_value_t = DEFAULT_PAGE_SIZE)
    )]
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Per-segment fetch timeout in seconds (optional)
    #[cfg_attr(
        feature = "config",
        arg(long = "fetch-timeout", env = "STRATUS_FETCH_TIMEOUT_SECS")
    )]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetch_timeout_secs: Option<u64>,
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            fetch_timeout_secs: None,
        }
    }
}

impl SegmentConfig {
    /// Creates a configuration with the given page size and no timeout.
    pub fn new(page_size: u32) -> Self {
        Self {
            page_size,
            fetch_timeout_secs: None,
        }
    }

    /// Returns the per-segment fetch timeout, if set.
    #[inline]
    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch_timeout_secs.map(Duration::from_secs)
    }

    /// Set the page size.
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set the per-segment fetch timeout in seconds.
    #[must_use]
    pub fn with_fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.fetch_timeout_secs = Some(secs);
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validate_page_size(self.page_size)?;

        if self.fetch_timeout_secs == Some(0) {
            return Err(Error::configuration("fetch timeout must be at least one second"));
        }

        Ok(())
    }
}

/// Checks that a page size is within what storage services accept.
pub fn validate_page_size(page_size: u32) -> Result<()> {
    if page_size == 0 || page_size > MAX_PAGE_SIZE {
        return Err(Error::invalid_input(format!(
            "page size must be between 1 and {MAX_PAGE_SIZE}, got {page_size}"
        )));
    }

    Ok(())
}
