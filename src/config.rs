use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the ISL Bible navigator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Catalog and marker data locations
    pub data: DataConfig,

    /// Player polling and seek lock settings
    pub playback: PlaybackConfig,

    /// Navigation behaviour
    pub navigation: NavigationConfig,

    /// Search box settings
    pub search: SearchConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Catalog JSON file (books and chapter videos)
    pub catalog_path: PathBuf,

    /// Directory holding `{Book}_{chapter}.csv` / `.json` verse marker files
    pub markers_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Interval between player time samples while playing (ms)
    pub poll_interval_ms: u64,

    /// Fallback expiry of the manual-seek lock when the player never confirms a seek (ms)
    pub seek_lock_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationConfig {
    /// Select the first verse marker when a chapter is selected
    pub auto_select_first_verse: bool,

    /// Move to the next chapter when a chapter video ends
    pub advance_on_end: bool,

    /// Upper bound for loading a chapter's markers during resolve-and-jump (ms)
    pub step_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Quiet period before typeahead input is processed (ms)
    pub debounce_ms: u64,

    /// Maximum number of typeahead suggestions
    pub max_suggestions: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level used when RUST_LOG is not set
    pub log_level: String,
}

impl PlaybackConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn seek_lock_timeout(&self) -> Duration {
        Duration::from_millis(self.seek_lock_timeout_ms)
    }
}

impl NavigationConfig {
    pub fn step_timeout(&self) -> Duration {
        Duration::from_millis(self.step_timeout_ms)
    }
}

impl SearchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Config {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        let config_paths = [
            "isl-navigator.toml",
            "config/isl-navigator.toml",
            "/etc/isl-navigator/config.toml",
        ];

        for path in &config_paths {
            if let Ok(config_str) = std::fs::read_to_string(path) {
                match toml::from_str(&config_str) {
                    Ok(config) => {
                        tracing::info!("📄 Loaded configuration from: {}", path);
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config file {}: {}", path, e);
                    }
                }
            }
        }

        Self::from_env()
    }

    /// Load configuration from environment variables on top of the defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(catalog) = std::env::var("ISL_NAV_CATALOG") {
            config.data.catalog_path = PathBuf::from(catalog);
        }

        if let Ok(markers_dir) = std::env::var("ISL_NAV_MARKERS_DIR") {
            config.data.markers_dir = PathBuf::from(markers_dir);
        }

        if let Ok(poll) = std::env::var("ISL_NAV_POLL_MS") {
            config.playback.poll_interval_ms = poll.parse().unwrap_or(500);
        }

        if let Ok(lock) = std::env::var("ISL_NAV_SEEK_LOCK_MS") {
            config.playback.seek_lock_timeout_ms = lock.parse().unwrap_or(500);
        }

        if let Ok(debounce) = std::env::var("ISL_NAV_DEBOUNCE_MS") {
            config.search.debounce_ms = debounce.parse().unwrap_or(300);
        }

        if let Ok(log_level) = std::env::var("ISL_NAV_LOG_LEVEL") {
            config.logging.log_level = log_level;
        }

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &str) -> Result<()> {
        let config_str = toml::to_string_pretty(self)?;
        std::fs::write(path, config_str)?;
        tracing::info!("💾 Configuration saved to: {}", path);
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.playback.poll_interval_ms == 0 {
            return Err(anyhow!("poll_interval_ms must be greater than 0"));
        }

        if self.playback.seek_lock_timeout_ms == 0 {
            return Err(anyhow!("seek_lock_timeout_ms must be greater than 0"));
        }

        if self.navigation.step_timeout_ms == 0 {
            return Err(anyhow!("step_timeout_ms must be greater than 0"));
        }

        if self.search.max_suggestions == 0 {
            return Err(anyhow!("max_suggestions must be greater than 0"));
        }

        if self.data.markers_dir.exists() && !self.data.markers_dir.is_dir() {
            return Err(anyhow!(
                "markers_dir is not a directory: {}",
                self.data.markers_dir.display()
            ));
        }

        if !self.data.catalog_path.exists() {
            tracing::warn!(
                "Catalog file not found yet: {}",
                self.data.catalog_path.display()
            );
        }

        tracing::info!("✅ Configuration validation passed");
        Ok(())
    }

    /// Get runtime configuration summary
    pub fn summary(&self) -> String {
        format!(
            "ISL Bible Navigator Configuration:\n\
            - Catalog: {}\n\
            - Markers Directory: {}\n\
            - Poll Interval: {}ms\n\
            - Seek Lock Timeout: {}ms\n\
            - Search Debounce: {}ms\n\
            - Auto-select First Verse: {}\n\
            - Advance On End: {}",
            self.data.catalog_path.display(),
            self.data.markers_dir.display(),
            self.playback.poll_interval_ms,
            self.playback.seek_lock_timeout_ms,
            self.search.debounce_ms,
            self.navigation.auto_select_first_verse,
            self.navigation.advance_on_end
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data: DataConfig {
                catalog_path: PathBuf::from("data/catalog.json"),
                markers_dir: PathBuf::from("data/markers"),
            },
            playback: PlaybackConfig {
                poll_interval_ms: 500,
                seek_lock_timeout_ms: 500,
            },
            navigation: NavigationConfig {
                auto_select_first_verse: true,
                advance_on_end: false,
                step_timeout_ms: 2000,
            },
            search: SearchConfig {
                debounce_ms: 300,
                max_suggestions: 8,
            },
            logging: LoggingConfig {
                log_level: "info".to_string(),
            },
        }
    }
}

/// Configuration builder for programmatic config creation
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_catalog(mut self, path: PathBuf) -> Self {
        self.config.data.catalog_path = path;
        self
    }

    pub fn with_markers_dir(mut self, dir: PathBuf) -> Self {
        self.config.data.markers_dir = dir;
        self
    }

    pub fn with_poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.playback.poll_interval_ms = ms;
        self
    }

    pub fn with_seek_lock_timeout_ms(mut self, ms: u64) -> Self {
        self.config.playback.seek_lock_timeout_ms = ms;
        self
    }

    pub fn with_debounce_ms(mut self, ms: u64) -> Self {
        self.config.search.debounce_ms = ms;
        self
    }

    pub fn auto_select_first_verse(mut self, enable: bool) -> Self {
        self.config.navigation.auto_select_first_verse = enable;
        self
    }

    pub fn advance_on_end(mut self, enable: bool) -> Self {
        self.config.navigation.advance_on_end = enable;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
