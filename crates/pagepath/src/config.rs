//! Engine configuration.
//!
//! Options are fixed when the engine is initialized and apply to every polled
//! step for the lifetime of that engine.

use crate::result::{PathError, PathResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default timeout for polled steps (2 seconds)
pub const DEFAULT_TIMEOUT_MS: u64 = 2_000;

/// Default interval between re-queries of a collection (500ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// Environment variable overriding [`EngineOptions::timeout_ms`]
pub const TIMEOUT_ENV: &str = "PAGEPATH_TIMEOUT_MS";

/// Environment variable overriding [`EngineOptions::poll_interval_ms`]
pub const POLL_INTERVAL_ENV: &str = "PAGEPATH_POLL_INTERVAL_MS";

/// Options recognized by [`crate::PathEngine::init`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// How long a polled step waits before degrading to the sentinel
    #[serde(alias = "timeout")]
    pub timeout_ms: u64,
    /// Interval between re-queries while polling
    pub poll_interval_ms: u64,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl EngineOptions {
    /// Create options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration (never zero)
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// Parse options from YAML
    pub fn from_yaml_str(yaml: &str) -> PathResult<Self> {
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    /// Parse options from JSON
    pub fn from_json_str(json: &str) -> PathResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load options from a `.json`, `.yaml` or `.yml` file
    pub fn from_file(path: impl AsRef<Path>) -> PathResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&contents),
            Some("yaml" | "yml") => Self::from_yaml_str(&contents),
            other => Err(PathError::config(format!(
                "unsupported options file extension {other:?} for {}",
                path.display()
            ))),
        }
    }

    /// Apply `PAGEPATH_TIMEOUT_MS` / `PAGEPATH_POLL_INTERVAL_MS` if set
    pub fn with_env_overrides(self) -> PathResult<Self> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    fn with_overrides_from<F>(mut self, lookup: F) -> PathResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(TIMEOUT_ENV) {
            self.timeout_ms = parse_millis(TIMEOUT_ENV, &raw)?;
        }
        if let Some(raw) = lookup(POLL_INTERVAL_ENV) {
            self.poll_interval_ms = parse_millis(POLL_INTERVAL_ENV, &raw)?;
        }
        Ok(self)
    }
}

fn parse_millis(key: &str, raw: &str) -> PathResult<u64> {
    raw.trim()
        .parse()
        .map_err(|_| PathError::config(format!("{key} must be milliseconds, got {raw:?}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let options = EngineOptions::default();
        assert_eq!(options.timeout_ms, 2_000);
        assert_eq!(options.poll_interval_ms, 500);
        assert_eq!(options.timeout(), Duration::from_secs(2));
    }

    #[test]
    fn test_builder() {
        let options = EngineOptions::new()
            .with_timeout(5_000)
            .with_poll_interval(100);
        assert_eq!(options.timeout(), Duration::from_secs(5));
        assert_eq!(options.poll_interval(), Duration::from_millis(100));
    }

    #[test]
    fn test_zero_poll_interval_is_clamped() {
        let options = EngineOptions::new().with_poll_interval(0);
        assert_eq!(options.poll_interval(), Duration::from_millis(1));
    }

    #[test]
    fn test_yaml_partial() {
        let options = EngineOptions::from_yaml_str("timeout: 750\n").unwrap();
        assert_eq!(options.timeout_ms, 750);
        assert_eq!(options.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
    }

    #[test]
    fn test_json() {
        let options =
            EngineOptions::from_json_str(r#"{"timeout_ms": 10, "poll_interval_ms": 2}"#).unwrap();
        assert_eq!(options, EngineOptions::new().with_timeout(10).with_poll_interval(2));
    }

    #[test]
    fn test_bad_yaml() {
        let err = EngineOptions::from_yaml_str("timeout: soon").unwrap_err();
        assert!(matches!(err, PathError::Yaml(_)));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pagepath.yml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "timeout_ms: 3000").unwrap();
        writeln!(file, "poll_interval_ms: 250").unwrap();

        let options = EngineOptions::from_file(&path).unwrap();
        assert_eq!(options.timeout_ms, 3000);
        assert_eq!(options.poll_interval_ms, 250);
    }

    #[test]
    fn test_from_file_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pagepath.toml");
        std::fs::write(&path, "timeout_ms = 1").unwrap();
        let err = EngineOptions::from_file(&path).unwrap_err();
        assert!(matches!(err, PathError::Config { .. }));
    }

    #[test]
    fn test_overrides() {
        let options = EngineOptions::new()
            .with_overrides_from(|key| (key == TIMEOUT_ENV).then(|| " 900 ".to_string()))
            .unwrap();
        assert_eq!(options.timeout_ms, 900);
        assert_eq!(options.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
    }

    #[test]
    fn test_bad_override() {
        let err = EngineOptions::new()
            .with_overrides_from(|key| (key == POLL_INTERVAL_ENV).then(|| "fast".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains(POLL_INTERVAL_ENV));
    }
}
