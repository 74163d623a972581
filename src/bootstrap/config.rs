//! # Configuration Loader / 配置加载器
//!
//! Reads the TOML settings file and maps it onto [`Settings`]. Missing
//! sections and fields take their defaults from `tv-core`; this module does
//! no validation of its own.
//! 缺失的配置段与字段使用 `tv-core` 中的默认值。

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{info, warn};
use tv_core::Settings;

/// Environment variable naming the settings file.
pub const CONFIG_ENV: &str = "TOKENVIEW_CONFIG";

/// Load settings from a TOML file
/// 从 TOML 文件加载设置
///
/// # Errors / 错误
///
/// Returns error if the file cannot be read or is not valid settings TOML.
pub fn load_settings(config_path: &Path) -> anyhow::Result<Settings> {
    let content = std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
    Settings::from_toml_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", config_path.display()))
}

/// Where the effective settings came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsSource {
    Defaults,
    File(PathBuf),
    /// A file was configured but does not exist; defaults are in effect.
    MissingFile(PathBuf),
}

#[derive(Debug, Clone)]
pub struct ResolvedSettings {
    pub settings: Settings,
    pub source: SettingsSource,
}

impl ResolvedSettings {
    /// Reports the settings source. Call once the subscriber is installed;
    /// resolution itself runs before logging exists.
    /// 在日志初始化之后调用。
    pub fn log_source(&self) {
        match &self.source {
            SettingsSource::Defaults => info!("no config file configured, using defaults"),
            SettingsSource::File(path) => info!(path = %path.display(), "settings loaded"),
            SettingsSource::MissingFile(path) => {
                warn!(path = %path.display(), "config file not found, using defaults")
            }
        }
    }
}

/// Picks the settings file (explicit path, then `TOKENVIEW_CONFIG`) and loads
/// it. No file configured, or a configured file that does not exist, yields
/// the defaults; a file that exists but does not parse is an error.
pub fn resolve_settings(explicit: Option<PathBuf>) -> anyhow::Result<ResolvedSettings> {
    let path = explicit.or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));
    let resolved = match path {
        None => ResolvedSettings {
            settings: Settings::default(),
            source: SettingsSource::Defaults,
        },
        Some(path) if !path.exists() => ResolvedSettings {
            settings: Settings::default(),
            source: SettingsSource::MissingFile(path),
        },
        Some(path) => ResolvedSettings {
            settings: load_settings(&path)?,
            source: SettingsSource::File(path),
        },
    };
    Ok(resolved)
}
