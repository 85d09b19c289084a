use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use crate::modules::image_converter::{ConflictResolution, ConversionSettings, ConvertPolicy, QualitySettings, clamp_quality};

pub const STORAGE_KEY: &str = "rimgcvt-settings";
pub const DEFAULT_QUALITY: u8 = 85;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to access settings file: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid settings file: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    #[default]
    System,
    Light,
    Dark,
}

/// Fields missing from the stored record fall back to their defaults.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct AppSettings {
    pub theme: ThemePreference,
    pub output_path: String,
    pub file_prefix: String,
    pub conflict_resolution: ConflictResolution,
    pub default_quality: u8,
    pub convert_policy: ConvertPolicy,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            theme: ThemePreference::System,
            output_path: default_output_path(),
            file_prefix: String::new(),
            conflict_resolution: ConflictResolution::Numbering,
            default_quality: DEFAULT_QUALITY,
            convert_policy: ConvertPolicy::Strict,
        }
    }
}

/// `<Pictures>/imgcvt`, falling back to `~/Pictures/imgcvt` when the platform
/// reports no picture folder.
pub fn default_output_path() -> String {
    dirs::picture_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Pictures")))
        .map(|dir| dir.join("imgcvt").to_string_lossy().to_string())
        .unwrap_or_default()
}

impl AppSettings {
    pub fn load() -> Self {
        Self::load_from(&Self::get_config_path())
    }

    pub fn load_from(path: &Path) -> Self {
        match Self::read_from(path) {
            Ok(settings) => settings,
            Err(SettingsError::Io(e)) if e.kind() == io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                log::error!("Failed to load settings: {}", e);
                Self::default()
            }
        }
    }

    pub fn read_from(path: &Path) -> Result<Self, SettingsError> {
        let contents = fs::read_to_string(path)?;
        let settings: AppSettings = serde_json::from_str(&contents)?;
        Ok(settings.normalized())
    }

    pub fn save(&self) {
        if let Err(e) = self.save_to(&Self::get_config_path()) {
            log::error!("Failed to save settings: {}", e);
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn get_config_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("imgcvt");
        path.push(format!("{}.json", STORAGE_KEY));
        path
    }

    /// Output folder for a run. A blank field means the default folder.
    pub fn effective_output_path(&self) -> String {
        if self.output_path.trim().is_empty() {
            default_output_path()
        } else {
            self.output_path.clone()
        }
    }

    /// Snapshot of the output options for one conversion run.
    pub fn conversion_settings(&self, quality: &QualitySettings) -> ConversionSettings {
        ConversionSettings {
            output_path: self.effective_output_path(),
            file_prefix: self.file_prefix.clone(),
            conflict_resolution: self.conflict_resolution,
            quality: quality.quality(),
            lossless: quality.lossless(),
        }
    }

    pub fn normalized(mut self) -> Self {
        self.default_quality = clamp_quality(self.default_quality);
        self.output_path = self.effective_output_path();
        self
    }
}
