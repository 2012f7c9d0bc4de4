//! Application settings management

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// General settings
    #[serde(default)]
    pub general: GeneralSettings,

    /// Feedback service connection
    #[serde(default)]
    pub server: ServerSettings,

    /// Gallery thumbnail behaviour
    #[serde(default)]
    pub gallery: GallerySettings,

    /// TUI settings
    #[serde(default)]
    pub tui: TuiSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralSettings {
    /// Data directory for logs
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Base URL of the feedback service, without a trailing slash
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Timeout for list, thumbnail and chat requests
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Timeout for uploads; the service indexes the clip before replying
    #[serde(default = "default_upload_timeout_secs")]
    pub upload_timeout_secs: u64,
}

/// How thumbnail generation requests share debounce timers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DebounceScope {
    /// One timer for every video; later requests replace earlier ones
    Global,
    /// One timer per video id
    #[default]
    PerVideo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GallerySettings {
    /// Trailing-edge debounce window for thumbnail generation
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Whether the debounce timer is shared or per video
    #[serde(default)]
    pub debounce_scope: DebounceScope,

    /// File name the service uses for its stand-in thumbnail
    #[serde(default = "default_placeholder_thumbnail")]
    pub placeholder_thumbnail: String,

    /// Number of summary words shown in listings
    #[serde(default = "default_summary_words")]
    pub summary_words: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TuiSettings {
    /// Event poll interval
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,

    /// Show start/end seconds next to chapter titles
    #[serde(default = "default_true")]
    pub show_chapter_times: bool,
}

// Default value functions

fn default_data_dir() -> PathBuf {
    ProjectDirs::from("com", "clipcoach", "clipcoach")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.local/share/clipcoach"))
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_base_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_upload_timeout_secs() -> u64 {
    600
}

fn default_debounce_ms() -> u64 {
    1000
}

fn default_placeholder_thumbnail() -> String {
    "placeholder.png".to_string()
}

fn default_summary_words() -> usize {
    10
}

fn default_tick_ms() -> u64 {
    100
}

fn default_true() -> bool {
    true
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            upload_timeout_secs: default_upload_timeout_secs(),
        }
    }
}

impl Default for GallerySettings {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            debounce_scope: DebounceScope::default(),
            placeholder_thumbnail: default_placeholder_thumbnail(),
            summary_words: default_summary_words(),
        }
    }
}

impl Default for TuiSettings {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            show_chapter_times: true,
        }
    }
}

impl Settings {
    /// Load settings from the configuration file
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            tracing::debug!("No config file found, using defaults");
            let mut settings = Self::default();
            settings.apply_env_overrides();
            return Ok(settings);
        }

        let mut settings = Self::load_from(&config_path)?;
        settings.apply_env_overrides();

        Ok(settings)
    }

    /// Load settings from an explicit file, without environment overrides
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("CLIPCOACH_SERVER_URL") {
            if !url.trim().is_empty() {
                self.server.base_url = url;
            }
        }
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("com", "clipcoach", "clipcoach")
            .context("Could not determine config directory")?;

        let config_dir = dirs.config_dir();
        Ok(config_dir.join("config.toml"))
    }

    /// Write default configuration to a file
    pub fn write_default(path: &PathBuf) -> Result<()> {
        let settings = Self::default();
        let content = toml::to_string_pretty(&settings)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Base URL with any trailing slash removed
    pub fn base_url(&self) -> &str {
        self.server.base_url.trim().trim_end_matches('/')
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }

    pub fn upload_timeout(&self) -> Duration {
        Duration::from_secs(self.server.upload_timeout_secs)
    }

    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.gallery.debounce_ms)
    }

    /// Log file used while the TUI owns the terminal
    pub fn log_path(&self) -> PathBuf {
        self.general.data_dir.join("clipcoach.log")
    }

    /// Ensure all required directories exist
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.general.data_dir)?;
        Ok(())
    }
}
