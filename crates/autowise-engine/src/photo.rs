use std::fs;
use std::path::Path;

use autowise_contracts::request::ImageAttachment;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, Rgb, RgbImage};

use crate::error::AssistError;

pub const DEFAULT_MAX_DIM: u32 = 1536;
const JPEG_QUALITY: u8 = 90;
const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// Reads a photo for upload: flattened onto white, downscaled to fit
/// `max_dim`, re-encoded as JPEG. Undecodable files are sent as-is.
pub fn load_attachment(path: &Path, max_dim: u32) -> Result<ImageAttachment, AssistError> {
    let ext = extension(path);
    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(AssistError::UnsupportedImage(if ext.is_empty() {
            path.display().to_string()
        } else {
            ext
        }));
    }
    let label = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    let bytes = fs::read(path)?;
    match image::load_from_memory(&bytes) {
        Ok(decoded) => Ok(ImageAttachment {
            mime_type: "image/jpeg".to_string(),
            bytes: encode_jpeg(&decoded, max_dim)?,
            label,
        }),
        Err(_) => Ok(ImageAttachment {
            mime_type: guess_image_mime(path).to_string(),
            bytes,
            label,
        }),
    }
}

fn encode_jpeg(decoded: &DynamicImage, max_dim: u32) -> Result<Vec<u8>, AssistError> {
    let dim = max_dim.max(128);
    let rgba = decoded.to_rgba8();
    let mut flattened = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let alpha = u16::from(pixel[3]);
        let blend =
            |channel: u8| -> u8 { (((u16::from(channel) * alpha) + (255 * (255 - alpha))) / 255) as u8 };
        flattened.put_pixel(x, y, Rgb([blend(pixel[0]), blend(pixel[1]), blend(pixel[2])]));
    }

    let mut image = DynamicImage::ImageRgb8(flattened);
    if image.width() > dim || image.height() > dim {
        image = image.resize(dim, dim, FilterType::Triangle);
    }

    let mut bytes = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY);
    encoder.encode_image(&image)?;
    Ok(bytes)
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|value| value.to_str())
        .map(|value| value.to_ascii_lowercase())
        .unwrap_or_default()
}

fn guess_image_mime(path: &Path) -> &'static str {
    match extension(path).as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        _ => "image/png",
    }
}
