//! User configuration.
//!
//! Settings come from a TOML file, first found wins:
//! 1. `$OLKARCHIVE_CONFIG` (environment variable)
//! 2. `~/.config/olkarchive/config.toml` (Linux/macOS)
//!    `%APPDATA%\olkarchive\config.toml` (Windows)
//! 3. Built-in defaults

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::archive::{ArchiveFormat, DateOptions, TimeZoneChoice};
use crate::olk15::format::FormatProfile;

/// Contents of `config.toml`. Every section and key is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    /// Container layout constants.
    pub decoder: FormatProfile,
    /// Archive output settings.
    pub archive: ArchiveConfig,
    /// Performance tuning.
    pub performance: PerformanceConfig,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Where `olkarchive.log` is written. Defaults to the user cache dir.
    pub cache_dir: Option<PathBuf>,
    /// Default filter when neither `RUST_LOG` nor `-v` is given.
    pub log_level: String,
}

/// Archive output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Directory the archive is written to.
    pub output_dir: PathBuf,
    /// Default output format.
    pub format: ArchiveFormat,
    /// `strftime` format for dates shown in archived mails.
    pub date_format: String,
    /// Time zone for date buckets and display.
    pub time_zone: TimeZoneChoice,
    /// Stylesheet copied into the archive instead of the built-in one.
    pub stylesheet: Option<PathBuf>,
}

/// Performance tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    /// Extraction worker threads (0 = one per CPU).
    pub workers: usize,
    /// Jobs buffered ahead of the workers.
    pub queue_depth: usize,
}

// ── Defaults ────────────────────────────────────────────────────

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            log_level: "warn".to_string(),
        }
    }
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        let dates = DateOptions::default();
        Self {
            output_dir: PathBuf::from("MailArchive"),
            format: ArchiveFormat::Html,
            date_format: dates.date_format,
            time_zone: dates.time_zone,
            stylesheet: None,
        }
    }
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            queue_depth: 64,
        }
    }
}

impl ArchiveConfig {
    /// Date options handed to the archivers.
    pub fn date_options(&self) -> DateOptions {
        DateOptions {
            time_zone: self.time_zone,
            date_format: self.date_format.clone(),
        }
    }
}

// ── Load / save ─────────────────────────────────────────────────

/// Load configuration from `$OLKARCHIVE_CONFIG` or the user config directory.
///
/// A missing file gives the defaults silently. An unreadable, malformed or
/// invalid file is logged and also gives the defaults, so a broken config
/// never blocks an archive run.
pub fn load_config() -> Config {
    let Some(path) = config_file_path().filter(|p| p.exists()) else {
        return Config::default();
    };
    match read_config(&path) {
        Ok(cfg) => {
            tracing::info!(path = %path.display(), "Config loaded");
            cfg
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Ignoring config file");
            Config::default()
        }
    }
}

/// Parse and validate one config file.
pub fn read_config(path: &Path) -> anyhow::Result<Config> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let cfg: Config = toml::from_str(&text)?;
    cfg.decoder
        .validate()
        .map_err(|reason| anyhow::anyhow!("[decoder] {reason}"))?;
    Ok(cfg)
}

/// Write `config` as TOML to the standard location and return that path.
pub fn save_config(config: &Config) -> anyhow::Result<PathBuf> {
    let path = config_file_path().context("no config directory on this platform")?;
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(&path, toml::to_string_pretty(config)?)?;
    tracing::info!(path = %path.display(), "Config written");
    Ok(path)
}

/// Config file location: `$OLKARCHIVE_CONFIG`, else `<config dir>/olkarchive/config.toml`.
pub fn config_file_path() -> Option<PathBuf> {
    std::env::var_os("OLKARCHIVE_CONFIG")
        .map(PathBuf::from)
        .or_else(|| dirs::config_dir().map(|d| d.join("olkarchive").join("config.toml")))
}

/// Directory holding the log file.
pub fn cache_dir(config: &Config) -> PathBuf {
    match &config.general.cache_dir {
        Some(dir) => dir.clone(),
        None => dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("olkarchive"),
    }
}

/// `olkarchive.log` inside [`cache_dir`].
pub fn log_file_path(config: &Config) -> PathBuf {
    cache_dir(config).join("olkarchive.log")
}
