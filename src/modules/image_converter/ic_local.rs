use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use image::DynamicImage;
use image::codecs::avif::AvifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use thiserror::Error;
use super::ic_backend::{
    BackendError, ConversionBackend, ConversionResult, ConversionSettings, FileMetadata, MetadataProbe,
    mime_type_for,
};
use super::ic_format::{ConflictResolution, TargetFormat};

const AVIF_SPEED: u8 = 6;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Failed to open image: {0}")]
    Open(#[source] image::ImageError),
    #[error("Failed to encode {format}: {source}")]
    Encode {
        format: &'static str,
        #[source]
        source: image::ImageError,
    },
    #[error("Failed to encode WEBP: {0}")]
    WebP(String),
    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

/// In-process backend that decodes with the `image` crate. WebP goes
/// through libwebp, everything else through the `image` encoders.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalBackend;

impl LocalBackend {
    pub fn new() -> Self {
        Self
    }
}

impl MetadataProbe for LocalBackend {
    fn file_metadata(&self, path: &str) -> Result<FileMetadata, BackendError> {
        let metadata = fs::metadata(path)?;
        Ok(FileMetadata {
            size: metadata.len(),
            mime_type: mime_type_for(path),
        })
    }
}

impl ConversionBackend for LocalBackend {
    fn convert_images(
        &self,
        paths: &[String],
        target: TargetFormat,
        settings: &ConversionSettings,
    ) -> Result<Vec<ConversionResult>, BackendError> {
        let results = paths
            .iter()
            .map(|path| match convert_image(Path::new(path), target, settings) {
                Ok(output) => ConversionResult::succeeded(path.as_str(), output.to_string_lossy()),
                Err(e) => ConversionResult::failed(path.as_str(), e.to_string()),
            })
            .collect();
        Ok(results)
    }
}

/// `<output>/<prefix><stem>.<ext>`, or the first free `<prefix><stem>_<n>.<ext>`
/// when numbering is on and the plain name is taken.
pub fn output_path_for(source: &Path, target: TargetFormat, settings: &ConversionSettings) -> PathBuf {
    let stem = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image");
    let ext = target.extension();
    let output_dir = PathBuf::from(&settings.output_path);

    let mut output_path = output_dir.join(format!("{}{}.{}", settings.file_prefix, stem, ext));
    if settings.conflict_resolution == ConflictResolution::Numbering {
        let mut count = 1;
        while output_path.exists() {
            output_path = output_dir.join(format!("{}{}_{}.{}", settings.file_prefix, stem, count, ext));
            count += 1;
        }
    }
    output_path
}

/// Encodes fully in memory so a failed encode never leaves a partial file
/// behind.
pub fn convert_image(source: &Path, target: TargetFormat, settings: &ConversionSettings) -> Result<PathBuf, ConvertError> {
    let img = image::open(source).map_err(ConvertError::Open)?;
    let bytes = encode(&img, target, settings)?;

    let output_path = output_path_for(source, target, settings);
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&output_path, bytes)?;

    log::debug!("Wrote {}", output_path.display());
    Ok(output_path)
}

pub fn encode(img: &DynamicImage, target: TargetFormat, settings: &ConversionSettings) -> Result<Vec<u8>, ConvertError> {
    let encode_err = |source| ConvertError::Encode {
        format: target.as_str(),
        source,
    };
    let mut buffer = Cursor::new(Vec::new());

    match target {
        TargetFormat::Jpg => {
            let encoder = JpegEncoder::new_with_quality(&mut buffer, settings.quality);
            DynamicImage::ImageRgb8(img.to_rgb8())
                .write_with_encoder(encoder)
                .map_err(encode_err)?;
        }
        TargetFormat::Png => {
            let compression = if settings.lossless {
                CompressionType::Best
            } else {
                CompressionType::Default
            };
            let encoder = PngEncoder::new_with_quality(&mut buffer, compression, FilterType::Adaptive);
            img.write_with_encoder(encoder).map_err(encode_err)?;
        }
        TargetFormat::Webp => return encode_webp(img, settings),
        TargetFormat::Avif => {
            let quality = if settings.lossless { 100 } else { settings.quality };
            let encoder = AvifEncoder::new_with_speed_quality(&mut buffer, AVIF_SPEED, quality);
            DynamicImage::ImageRgba8(img.to_rgba8())
                .write_with_encoder(encoder)
                .map_err(encode_err)?;
        }
    }

    Ok(buffer.into_inner())
}

fn encode_webp(img: &DynamicImage, settings: &ConversionSettings) -> Result<Vec<u8>, ConvertError> {
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    let encoder = webp::Encoder::from_rgba(rgba.as_raw(), width, height);
    let memory = encoder
        .encode_simple(settings.lossless, settings.quality as f32)
        .map_err(|e| ConvertError::WebP(format!("{:?}", e)))?;
    Ok(memory.to_vec())
}
