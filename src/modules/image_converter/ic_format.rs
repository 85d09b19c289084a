use serde::{Deserialize, Serialize};
use super::ic_registry::SelectedFile;

/// Extensions the local decoder can read. AVIF and HEIC are output-only.
pub const SUPPORTED_INPUT_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetFormat {
    #[default]
    Webp,
    Png,
    Jpg,
    Avif,
}

impl TargetFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetFormat::Webp => "WEBP",
            TargetFormat::Png => "PNG",
            TargetFormat::Jpg => "JPG",
            TargetFormat::Avif => "AVIF",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            TargetFormat::Webp => "webp",
            TargetFormat::Png => "png",
            TargetFormat::Jpg => "jpg",
            TargetFormat::Avif => "avif",
        }
    }

    pub fn all() -> Vec<TargetFormat> {
        vec![
            TargetFormat::Webp,
            TargetFormat::Png,
            TargetFormat::Jpg,
            TargetFormat::Avif,
        ]
    }

    pub fn parse(value: &str) -> Option<TargetFormat> {
        match value.to_lowercase().as_str() {
            "webp" => Some(TargetFormat::Webp),
            "png" => Some(TargetFormat::Png),
            "jpg" | "jpeg" => Some(TargetFormat::Jpg),
            "avif" => Some(TargetFormat::Avif),
            _ => None,
        }
    }

    /// JPEG has no lossless mode.
    pub fn supports_lossless(&self) -> bool {
        !matches!(self, TargetFormat::Jpg)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictResolution {
    Overwrite,
    #[default]
    Numbering,
}

impl ConflictResolution {
    pub fn label(&self) -> &'static str {
        match self {
            ConflictResolution::Overwrite => "Overwrite existing files",
            ConflictResolution::Numbering => "Add a number to the file name",
        }
    }
}

pub fn clamp_quality(quality: u8) -> u8 {
    quality.clamp(1, 100)
}

/// Per-batch quality choice. `lossless` can only be true for formats that
/// have a lossless mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualitySettings {
    quality: u8,
    lossless: bool,
}

impl QualitySettings {
    pub fn new(quality: u8) -> Self {
        Self {
            quality: clamp_quality(quality),
            lossless: false,
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    pub fn lossless(&self) -> bool {
        self.lossless
    }

    pub fn set_quality(&mut self, quality: u8) {
        self.quality = clamp_quality(quality);
    }

    pub fn set_lossless(&mut self, lossless: bool, target: TargetFormat) {
        self.lossless = lossless && target.supports_lossless();
    }

    /// Call whenever the target format changes.
    pub fn apply_format(&mut self, target: TargetFormat) {
        if !target.supports_lossless() {
            self.lossless = false;
        }
    }
}

/// Lowercased text after the last `.` of a file name.
pub fn file_extension(name: &str) -> Option<String> {
    let (_, ext) = name.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}

pub fn is_same_format(extension: &str, target: TargetFormat) -> bool {
    match target {
        TargetFormat::Jpg => extension == "jpg" || extension == "jpeg",
        _ => extension == target.extension(),
    }
}

pub fn is_supported_input(path: &str) -> bool {
    let name = super::ic_registry::file_name_of(path);
    file_extension(name)
        .map(|ext| SUPPORTED_INPUT_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Decides whether converting a file to a target format is meaningful.
///
/// The same policy value must be used for the selection count, the action
/// bar and the batch filter, otherwise the progress bar and the run disagree
/// on which files belong to the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConvertPolicy {
    /// Skip files already in the target format.
    #[default]
    Strict,
    /// Allow same-format recompression.
    Permissive,
}

impl ConvertPolicy {
    pub fn label(&self) -> &'static str {
        match self {
            ConvertPolicy::Strict => "Skip files already in the target format",
            ConvertPolicy::Permissive => "Re-encode them as well",
        }
    }

    pub fn can_convert(&self, file: &SelectedFile, target: TargetFormat) -> bool {
        self.can_convert_name(&file.name, target)
    }

    pub fn can_convert_name(&self, name: &str, target: TargetFormat) -> bool {
        let Some(ext) = file_extension(name) else {
            return false;
        };
        match self {
            ConvertPolicy::Strict => !is_same_format(&ext, target),
            ConvertPolicy::Permissive => true,
        }
    }
}
