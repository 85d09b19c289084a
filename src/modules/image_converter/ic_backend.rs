//! Command boundary between the conversion workflow and whatever performs
//! the actual decode/encode work.

use std::path::Path;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use super::ic_format::{ConflictResolution, TargetFormat};
use super::ic_registry::SelectedFile;

pub const SUPPORTED_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp", "image/avif"];

/// Output options handed to the backend for every file of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionSettings {
    pub output_path: String,
    pub file_prefix: String,
    pub conflict_resolution: ConflictResolution,
    pub quality: u8,
    pub lossless: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionResult {
    pub source_path: String,
    pub output_path: Option<String>,
    pub success: bool,
    pub error: Option<String>,
}

impl ConversionResult {
    pub fn succeeded(source_path: impl Into<String>, output_path: impl Into<String>) -> Self {
        Self {
            source_path: source_path.into(),
            output_path: Some(output_path.into()),
            success: true,
            error: None,
        }
    }

    pub fn failed(source_path: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            source_path: source_path.into(),
            output_path: None,
            success: false,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub size: u64,
    pub mime_type: String,
}

/// Failure of the call itself, as opposed to a per-file failure reported in
/// a `ConversionResult`.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
    #[error("Backend returned no result for {0}")]
    EmptyResponse(String),
    #[error("Backend panicked: {0}")]
    Panicked(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub trait ConversionBackend: Send + Sync {
    fn convert_images(
        &self,
        paths: &[String],
        target: TargetFormat,
        settings: &ConversionSettings,
    ) -> Result<Vec<ConversionResult>, BackendError>;
}

pub trait MetadataProbe {
    fn file_metadata(&self, path: &str) -> Result<FileMetadata, BackendError>;
}

/// MIME type guessed from the file extension, empty when unknown.
pub fn mime_type_for(path: &str) -> String {
    image::ImageFormat::from_path(Path::new(path))
        .map(|format| format.to_mime_type().to_string())
        .unwrap_or_default()
}

/// Turns picked or dropped paths into selection entries.
///
/// A failed metadata lookup still admits the file with size 0. Paths whose
/// MIME type is not a supported image are dropped.
pub fn resolve_paths(probe: &dyn MetadataProbe, paths: &[String]) -> Vec<SelectedFile> {
    paths
        .iter()
        .filter_map(|path| {
            let metadata = probe.file_metadata(path).unwrap_or_else(|e| {
                log::warn!("Failed to read metadata for {}: {}", path, e);
                FileMetadata {
                    size: 0,
                    mime_type: mime_type_for(path),
                }
            });

            if !SUPPORTED_MIME_TYPES.contains(&metadata.mime_type.as_str()) {
                log::debug!("Skipping {} ({})", path, metadata.mime_type);
                return None;
            }

            Some(SelectedFile::new(path.as_str(), metadata.size))
        })
        .collect()
}
