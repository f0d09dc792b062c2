use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::constants::*;
use super::retry::RetryPolicy;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to read settings from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse settings in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write settings to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not determine config directory")]
    NoConfigDir,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeSettings {
    pub window_chars: usize,
    pub anchor_sentences: usize,
    pub threshold: f64,
}

impl Default for MergeSettings {
    fn default() -> Self {
        Self {
            window_chars: DEFAULT_MERGE_WINDOW_CHARS,
            anchor_sentences: DEFAULT_MERGE_ANCHOR_SENTENCES,
            threshold: DEFAULT_MERGE_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupSettings {
    pub boundary_threshold: f64,
    pub general_threshold: f64,
    pub lookahead: usize,
    pub max_removal_fraction: f64,
    pub marker_max_removal_fraction: f64,
    pub marker: String,
}

impl Default for DedupSettings {
    fn default() -> Self {
        Self {
            boundary_threshold: DEFAULT_BOUNDARY_THRESHOLD,
            general_threshold: DEFAULT_GENERAL_THRESHOLD,
            lookahead: DEFAULT_DEDUP_LOOKAHEAD,
            max_removal_fraction: DEFAULT_MAX_REMOVAL_FRACTION,
            marker_max_removal_fraction: DEFAULT_MARKER_MAX_REMOVAL_FRACTION,
            marker: DEFAULT_DUP_MARKER.to_string(),
        }
    }
}

/// Fuzzy-matching gates. The bounds are empirical; tune them against a
/// labelled mention/ticker set before tightening or loosening.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverSettings {
    pub persistence_floor: f64,
    pub short_ticker_len: usize,
    pub latin_threshold: f64,
    pub general_threshold: f64,
    pub ambiguity_margin: f64,
    pub context_window: usize,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            persistence_floor: DEFAULT_PERSISTENCE_FLOOR,
            short_ticker_len: DEFAULT_SHORT_TICKER_LEN,
            latin_threshold: DEFAULT_LATIN_THRESHOLD,
            general_threshold: DEFAULT_FUZZY_THRESHOLD,
            ambiguity_margin: DEFAULT_AMBIGUITY_MARGIN,
            context_window: DEFAULT_CONTEXT_WINDOW_CHARS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketSettings {
    pub ttl_hours: i64,
    pub lookback_days: i64,
    pub tolerance: f64,
    pub symbol_suffix: String,
}

impl Default for MarketSettings {
    fn default() -> Self {
        Self {
            ttl_hours: DEFAULT_MARKET_TTL_HOURS,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            tolerance: DEFAULT_PRICE_TOLERANCE,
            symbol_suffix: DEFAULT_SYMBOL_SUFFIX.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExternalSettings {
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub search_enabled: bool,
    pub search_query_suffix: String,
}

impl Default for ExternalSettings {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_EXTERNAL_TIMEOUT_SECS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
            search_enabled: false,
            search_query_suffix: DEFAULT_SEARCH_QUERY_SUFFIX.to_string(),
        }
    }
}

impl ExternalSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub merge: MergeSettings,
    pub dedup: DedupSettings,
    pub resolver: ResolverSettings,
    pub market: MarketSettings,
    pub external: ExternalSettings,
    pub workers: usize,
    pub request_budget: usize,
    pub knowledge_base: Option<PathBuf>,
    pub finance_terms: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            merge: MergeSettings::default(),
            dedup: DedupSettings::default(),
            resolver: ResolverSettings::default(),
            market: MarketSettings::default(),
            external: ExternalSettings::default(),
            workers: DEFAULT_WORKERS,
            request_budget: DEFAULT_REQUEST_BUDGET,
            knowledge_base: None,
            finance_terms: None,
        }
    }
}

impl Settings {
    /// Platform config location, e.g. `~/.config/FinScribe/settings.json`.
    pub fn default_path() -> Result<PathBuf, SettingsError> {
        dirs::config_dir()
            .map(|d| d.join(APP_DIR_NAME).join(SETTINGS_FILE_NAME))
            .ok_or(SettingsError::NoConfigDir)
    }

    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path).map_err(|e| SettingsError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&json).map_err(|e| SettingsError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Load settings, falling back to defaults when the file is missing or
    /// unreadable.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::default_path() {
                Ok(p) => p,
                Err(_) => return Self::default(),
            },
        };
        if !path.exists() {
            return Self::default();
        }
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!("{e}; using default settings");
            Self::default()
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| SettingsError::Write {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| SettingsError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        fs::write(path, json).map_err(|e| SettingsError::Write {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Worker count clamped to what the speech provider tolerates.
    pub fn worker_count(&self) -> usize {
        self.workers.clamp(1, MAX_WORKERS)
    }
}

/// Platform-specific cache directory for persisted alias and market caches.
///
/// - macOS: `~/Library/Application Support/FinScribe/cache/`
/// - Linux: `$XDG_CACHE_HOME/FinScribe/` or `~/.cache/FinScribe/`
/// - Windows: `%LOCALAPPDATA%/FinScribe/`
pub fn cache_dir() -> Option<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        dirs::data_dir().map(|d| d.join(APP_DIR_NAME).join("cache"))
    }
    #[cfg(not(target_os = "macos"))]
    {
        dirs::cache_dir().map(|d| d.join(APP_DIR_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_match_documented_values() {
        let s = Settings::default();
        assert_eq!(s.merge.window_chars, 1500);
        assert_eq!(s.merge.anchor_sentences, 3);
        assert_eq!(s.dedup.marker, "[DUP]");
        assert_eq!(s.resolver.short_ticker_len, 3);
        assert_eq!(s.market.ttl_hours, 24);
        assert_eq!(s.request_budget, 50);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let s: Settings =
            serde_json::from_str(r#"{"merge": {"threshold": 0.8}, "workers": 2}"#).unwrap();
        assert_eq!(s.merge.threshold, 0.8);
        assert_eq!(s.merge.window_chars, 1500);
        assert_eq!(s.workers, 2);
        assert_eq!(s.dedup, DedupSettings::default());
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("settings.json");
        let mut s = Settings::default();
        s.resolver.general_threshold = 0.88;
        s.knowledge_base = Some(PathBuf::from("kb.json"));
        s.save(&path).unwrap();

        assert_eq!(Settings::load(&path).unwrap(), s);
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            Settings::load(&path),
            Err(SettingsError::Parse { .. })
        ));
    }

    #[test]
    fn test_load_or_default_survives_bad_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("settings.json");
        fs::write(&path, "[]").unwrap();
        assert_eq!(Settings::load_or_default(Some(&path)), Settings::default());
    }

    #[test]
    fn test_worker_count_is_clamped() {
        let mut s = Settings::default();
        s.workers = 0;
        assert_eq!(s.worker_count(), 1);
        s.workers = 64;
        assert_eq!(s.worker_count(), 10);
    }

    #[test]
    fn test_retry_policy_from_settings() {
        let policy = ExternalSettings::default().retry_policy();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.base_delay, Duration::from_secs(1));
        assert_eq!(policy.max_delay, Duration::from_secs(30));
    }
}
