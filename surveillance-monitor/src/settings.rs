//! Preferences for the monitor grid
//!
//! Stored as XML in the platform config directory. Calibration parameter
//! sets are owned by the dewarping engine and are not part of this file.

use quick_xml::de::from_str;
use quick_xml::se::to_string;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::monitor::PreviewConfig;
use crate::session::MediaSource;

/// Application preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "SurveillancePreferences")]
pub struct MonitorPreferences {
    /// Width of each monitor tile's display, in pixels
    #[serde(rename = "tileWidth", default = "default_tile_width")]
    pub tile_width: u32,

    /// Width of the previews in the setup dialog
    #[serde(rename = "previewWidth", default = "default_preview_width")]
    pub preview_width: u32,

    /// Stretch frames to fill the widget instead of keeping aspect ratio
    #[serde(rename = "scaleContent", default)]
    pub scale_content: bool,

    /// Frame rate of synthetic test sources (1-120)
    #[serde(rename = "syntheticFps", default = "default_synthetic_fps")]
    pub synthetic_fps: u32,

    /// Last media source picked by the user
    #[serde(rename = "lastSource", default, skip_serializing_if = "Option::is_none")]
    pub last_source: Option<MediaSource>,
}

fn default_tile_width() -> u32 {
    300
}

fn default_preview_width() -> u32 {
    320
}

fn default_synthetic_fps() -> u32 {
    30
}

impl Default for MonitorPreferences {
    fn default() -> Self {
        Self {
            tile_width: default_tile_width(),
            preview_width: default_preview_width(),
            scale_content: false,
            synthetic_fps: default_synthetic_fps(),
            last_source: None,
        }
    }
}

impl MonitorPreferences {
    /// Get the preferences file path
    fn get_prefs_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("SurveillanceMonitor");
            p.push("preferences.xml");
            p
        })
    }

    /// Load preferences from the config directory, falling back to defaults
    pub fn load() -> Self {
        let Some(path) = Self::get_prefs_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match Self::load_from_file(&path) {
            Ok(prefs) => prefs,
            Err(e) => {
                tracing::warn!("Failed to load preferences from {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Load preferences from an explicit path
    pub fn load_from_file(path: &Path) -> Result<Self, SettingsError> {
        let contents = fs::read_to_string(path)?;
        Self::from_xml(&contents)
    }

    /// Parse preferences XML
    pub fn from_xml(xml: &str) -> Result<Self, SettingsError> {
        let mut prefs: Self = from_str(xml)?;
        prefs.clamp();
        Ok(prefs)
    }

    /// Save preferences to the config directory
    pub fn save(&self) -> Result<(), SettingsError> {
        let path = Self::get_prefs_path().ok_or(SettingsError::NoConfigDir)?;
        self.save_to_file(&path)
    }

    /// Save preferences to an explicit path, creating parent directories
    pub fn save_to_file(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let xml = to_string(self)?;
        let formatted = format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{}", xml);
        fs::write(path, formatted)?;
        Ok(())
    }

    /// Keep values inside usable ranges
    pub fn clamp(&mut self) {
        self.tile_width = self.tile_width.clamp(64, 1920);
        self.preview_width = self.preview_width.clamp(64, 1920);
        self.synthetic_fps = self.synthetic_fps.clamp(1, 120);
    }

    /// Display settings for the setup dialog previews
    pub fn preview_config(&self) -> PreviewConfig {
        PreviewConfig {
            width: self.preview_width,
            scale_content: self.scale_content,
        }
    }
}

/// Settings-related errors
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML parse error: {0}")]
    XmlParse(#[from] quick_xml::DeError),

    #[error("XML write error: {0}")]
    XmlWrite(#[from] quick_xml::SeError),

    #[error("Could not find config directory")]
    NoConfigDir,
}
