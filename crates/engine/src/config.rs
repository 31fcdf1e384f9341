//! Coordinator configuration
//!
//! # Watch Modes
//!
//! | Mode | Observer wakes on | Latency to report a new head |
//! |------|-------------------|------------------------------|
//! | Notify | Every prepend, seal, or `poll_interval` timeout | Immediate |
//! | Poll | Every `poll_interval` | Up to `poll_interval` |
//!
//! `Notify` is the default. `Poll` reproduces the sleep-then-peek observer
//! and can miss intermediate heads when input arrives faster than the
//! interval; the final head is always reported either way.
//!
//! # Oversize Input
//!
//! Lines longer than `max_line_len` characters are either truncated on a
//! character boundary (default) or rejected with a fatal
//! [`Error::InputTooLong`].
//!
//! # File Format
//!
//! ```toml
//! poll_interval_ms = 2000
//! watch_mode = "notify"
//! max_line_len = 18
//! oversize = "truncate"
//! ```

use crate::input::LinePolicy;
use duolog_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default observer interval in milliseconds
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;

/// Default maximum line length in characters
///
/// A 20-byte read buffer holds 18 characters plus the newline and terminator.
pub const DEFAULT_MAX_LINE_LEN: usize = 18;

/// How the observer waits for new entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchMode {
    /// Block on the store's condition variable
    #[default]
    Notify,
    /// Sleep for the poll interval, then peek
    Poll,
}

/// What to do with lines longer than `max_line_len`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OversizePolicy {
    /// Keep the first `max_line_len` characters
    #[default]
    Truncate,
    /// Fail the producer with `InputTooLong`
    Reject,
}

/// Coordinator options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoordinatorConfig {
    /// Observer interval in milliseconds
    pub poll_interval_ms: u64,
    /// How the observer waits for new entries
    pub watch_mode: WatchMode,
    /// Maximum characters kept per input line
    pub max_line_len: usize,
    /// Policy for lines longer than `max_line_len`
    pub oversize: OversizePolicy,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        CoordinatorConfig {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            watch_mode: WatchMode::Notify,
            max_line_len: DEFAULT_MAX_LINE_LEN,
            oversize: OversizePolicy::Truncate,
        }
    }
}

impl CoordinatorConfig {
    /// Sleep-then-peek observer with the default two second interval
    pub fn polling() -> Self {
        CoordinatorConfig {
            watch_mode: WatchMode::Poll,
            ..Default::default()
        }
    }

    /// Strict input handling: oversize lines are fatal
    pub fn strict() -> Self {
        CoordinatorConfig {
            oversize: OversizePolicy::Reject,
            ..Default::default()
        }
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: CoordinatorConfig =
            toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    /// Check option ranges
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(Error::Config(
                "poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.max_line_len == 0 {
            return Err(Error::Config(
                "max_line_len must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Observer interval
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Input line policy derived from this configuration
    pub fn line_policy(&self) -> LinePolicy {
        LinePolicy::new(self.max_line_len, self.oversize)
    }
}
