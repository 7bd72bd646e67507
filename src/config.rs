//! Client configuration from `TACKPAD_*` environment variables.
//!
//! Numeric values that fail to parse fall back to their defaults with a
//! warning. Only an empty base URL is rejected outright, since nothing can
//! work without one.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ErrorCode;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3000/api";
pub const DEFAULT_SAVE_DEBOUNCE_MS: u64 = 1000;
pub const DEFAULT_HISTORY_DEBOUNCE_MS: u64 = 500;
pub const DEFAULT_HISTORY_CAPACITY: usize = canvas::consts::HISTORY_CAPACITY;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_BOOKMARKS_PATH: &str = "tackpad-boards.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must not be empty")]
    EmptyBaseUrl { var: &'static str },
}

impl ErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyBaseUrl { .. } => "E_CONFIG_BASE_URL",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Board API root, without a trailing slash.
    pub base_url: String,
    pub save_debounce: Duration,
    pub history_debounce: Duration,
    pub history_capacity: usize,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub bookmarks_path: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            save_debounce: Duration::from_millis(DEFAULT_SAVE_DEBOUNCE_MS),
            history_debounce: Duration::from_millis(DEFAULT_HISTORY_DEBOUNCE_MS),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            bookmarks_path: PathBuf::from(DEFAULT_BOOKMARKS_PATH),
        }
    }
}

impl ClientConfig {
    /// Build a config from the process environment.
    ///
    /// - `TACKPAD_BASE_URL`: Board API root (default `http://127.0.0.1:3000/api`)
    /// - `TACKPAD_SAVE_DEBOUNCE_MS`: quiet period before a save (default 1000)
    /// - `TACKPAD_HISTORY_DEBOUNCE_MS`: quiet period before an undo step (default 500)
    /// - `TACKPAD_HISTORY_CAPACITY`: undo depth (default 50)
    /// - `TACKPAD_REQUEST_TIMEOUT_SECS` / `TACKPAD_CONNECT_TIMEOUT_SECS`
    /// - `TACKPAD_BOOKMARKS_PATH`: local board registry file
    ///
    /// # Errors
    ///
    /// Returns an error if `TACKPAD_BASE_URL` is set but empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] over an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is set but empty.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let base_url = match lookup("TACKPAD_BASE_URL") {
            Some(raw) => normalize_base_url(&raw).ok_or(ConfigError::EmptyBaseUrl { var: "TACKPAD_BASE_URL" })?,
            None => defaults.base_url,
        };

        let millis = |key: &str, default: u64| Duration::from_millis(parse_or(&lookup, key, default));
        let secs = |key: &str, default: u64| Duration::from_secs(parse_or(&lookup, key, default));

        Ok(Self {
            base_url,
            save_debounce: millis("TACKPAD_SAVE_DEBOUNCE_MS", DEFAULT_SAVE_DEBOUNCE_MS),
            history_debounce: millis("TACKPAD_HISTORY_DEBOUNCE_MS", DEFAULT_HISTORY_DEBOUNCE_MS),
            history_capacity: parse_or(&lookup, "TACKPAD_HISTORY_CAPACITY", DEFAULT_HISTORY_CAPACITY),
            request_timeout: secs("TACKPAD_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_timeout: secs("TACKPAD_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
            bookmarks_path: lookup("TACKPAD_BOOKMARKS_PATH")
                .filter(|p| !p.trim().is_empty())
                .map_or(defaults.bookmarks_path, PathBuf::from),
        })
    }

    /// Replace the base URL, e.g. from a command-line flag.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is empty.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, ConfigError> {
        self.base_url = normalize_base_url(base_url).ok_or(ConfigError::EmptyBaseUrl { var: "--base-url" })?;
        Ok(self)
    }
}

fn normalize_base_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

fn parse_or<T: FromStr + Copy + std::fmt::Display>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    let Some(raw) = lookup(key) else {
        return default;
    };
    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            tracing::warn!(var = key, value = %raw, %default, "unparseable config value, using default");
            default
        }
    }
}
