//! Menu configuration

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::icon::IconSize;

/// Configuration for icon resolution and row presentation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MenuConfig {
    /// Shell icon size class used for every lookup.
    pub icon_size: IconSize,
    /// Include hidden filesystem entries (rendered with the overlay).
    pub show_hidden: bool,
    /// Clicks within this window after a context menu closes are ignored.
    pub context_menu_debounce_ms: u64,
    /// Keep "no icon available" outcomes in the cache instead of retrying
    /// the OS on every menu open.
    pub cache_missing_icons: bool,
}

impl Default for MenuConfig {
    fn default() -> Self {
        Self {
            icon_size: IconSize::Small,
            show_hidden: false,
            context_menu_debounce_ms: 200,
            cache_missing_icons: true,
        }
    }
}

impl MenuConfig {
    /// Load configuration from the default location, falling back to
    /// defaults when absent.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from an explicit path.
    pub fn load_from(config_path: &std::path::Path) -> anyhow::Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Self = toml::from_str(&content)?;
            tracing::info!("Configuration loaded from {:?}", config_path);
            Ok(config)
        } else {
            tracing::info!("Using default configuration");
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to an explicit path.
    pub fn save_to(&self, config_path: &std::path::Path) -> anyhow::Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;

        tracing::info!("Configuration saved to {:?}", config_path);
        Ok(())
    }

    pub fn context_menu_debounce(&self) -> Duration {
        Duration::from_millis(self.context_menu_debounce_ms)
    }

    /// Get the configuration file path
    pub fn config_path() -> PathBuf {
        ProjectDirs::from("com", "TrayMenu", "TrayMenu")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("./config.toml"))
    }
}
