use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, GenericImageView, ImageFormat, RgbaImage};
use image::codecs::jpeg::JpegEncoder;

use crate::error::{GenerationError, Result};

const BYTES_PER_PIXEL: usize = 4;
pub const JPEG_QUALITY: u8 = 92;

/// Encoded image bytes plus their MIME type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RasterImage {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl RasterImage {
    pub fn new(mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Decodes the base64 transport form used by `inlineData` parts.
    pub fn from_base64(mime_type: &str, data: &str) -> Result<Self> {
        let bytes = STANDARD
            .decode(data.trim())
            .map_err(|err| GenerationError::image(format!("invalid base64 image data: {err}")))?;
        let mime_type = detect_mime_type(&bytes).unwrap_or(mime_type);
        Ok(Self::new(mime_type, bytes))
    }

    /// Parses `data:<mime>;base64,<payload>`.
    pub fn from_data_url(url: &str) -> Option<Self> {
        let rest = url.trim().strip_prefix("data:")?;
        let (meta, payload) = rest.split_once(',')?;
        let mime_type = meta.strip_suffix(";base64")?;
        if !mime_type.starts_with("image/") {
            return None;
        }
        Self::from_base64(mime_type, payload).ok()
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }

    pub fn dimensions(&self) -> Result<(u32, u32)> {
        get_dimensions(&self.bytes, &self.mime_type)
    }

    pub fn extension(&self) -> &'static str {
        get_extension_from_mime_type(&self.mime_type)
    }
}

pub fn decode_image(bytes: &[u8], mime_type: &str) -> Result<(Vec<u8>, u32, u32)> {
    let format = mime_to_format(mime_type)?;
    let image = image::load_from_memory_with_format(bytes, format)
        .map_err(|err| GenerationError::image(format!("decode image failed: {err}")))?
        .to_rgba8();
    let (width, height) = image.dimensions();
    Ok((image.into_raw(), width, height))
}

fn rgba_image(pixels: Vec<u8>, width: u32, height: u32) -> Result<RgbaImage> {
    let expected = (width as usize)
        .saturating_mul(height as usize)
        .saturating_mul(BYTES_PER_PIXEL);
    if pixels.len() != expected {
        return Err(GenerationError::image("invalid rgba buffer"));
    }
    RgbaImage::from_raw(width, height, pixels).ok_or_else(|| GenerationError::image("invalid rgba buffer"))
}

pub fn encode_png(pixels: Vec<u8>, width: u32, height: u32) -> Result<Vec<u8>> {
    let rgba = rgba_image(pixels, width, height)?;
    let mut output = Vec::new();
    DynamicImage::ImageRgba8(rgba)
        .write_to(&mut std::io::Cursor::new(&mut output), ImageFormat::Png)
        .map_err(|err| GenerationError::image(format!("encode png failed: {err}")))?;
    Ok(output)
}

/// JPEG has no alpha channel; pixels are flattened to RGB first.
pub fn encode_jpeg(pixels: Vec<u8>, width: u32, height: u32, quality: u8) -> Result<Vec<u8>> {
    let rgb = DynamicImage::ImageRgba8(rgba_image(pixels, width, height)?).to_rgb8();
    let mut output = Vec::new();
    JpegEncoder::new_with_quality(&mut output, quality.clamp(1, 100))
        .encode_image(&rgb)
        .map_err(|err| GenerationError::image(format!("encode jpeg failed: {err}")))?;
    Ok(output)
}

pub fn get_dimensions(bytes: &[u8], mime_type: &str) -> Result<(u32, u32)> {
    let format = mime_to_format(mime_type)?;
    let image = image::load_from_memory_with_format(bytes, format)
        .map_err(|err| GenerationError::image(format!("decode image failed: {err}")))?;
    Ok(image.dimensions())
}

pub fn detect_mime_type(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some("image/png");
    }
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("image/jpeg");
    }
    if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        return Some("image/gif");
    }
    if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        return Some("image/webp");
    }
    if bytes.starts_with(b"BM") {
        return Some("image/bmp");
    }
    None
}

pub fn mime_to_format(mime_type: &str) -> Result<ImageFormat> {
    match mime_type {
        "image/png" => Ok(ImageFormat::Png),
        "image/jpeg" | "image/jpg" => Ok(ImageFormat::Jpeg),
        "image/gif" => Ok(ImageFormat::Gif),
        "image/webp" => Ok(ImageFormat::WebP),
        "image/bmp" => Ok(ImageFormat::Bmp),
        _ => Err(GenerationError::UnsupportedFile(mime_type.to_string())),
    }
}

pub fn get_extension_from_mime_type(mime_type: &str) -> &'static str {
    match mime_type.to_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        "image/bmp" => "bmp",
        _ => "bin",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_png(width: u32, height: u32) -> Vec<u8> {
        let pixels = [10u8, 20, 30, 255].repeat((width * height) as usize);
        encode_png(pixels, width, height).unwrap()
    }

    #[test]
    fn sniffs_png_and_jpeg() {
        let png = solid_png(2, 2);
        assert_eq!(detect_mime_type(&png), Some("image/png"));
        let (pixels, w, h) = decode_image(&png, "image/png").unwrap();
        let jpeg = encode_jpeg(pixels, w, h, JPEG_QUALITY).unwrap();
        assert_eq!(detect_mime_type(&jpeg), Some("image/jpeg"));
        assert_eq!(detect_mime_type(b"hello"), None);
    }

    #[test]
    fn data_url_round_trip_keeps_bytes() {
        let image = RasterImage::new("image/png", solid_png(3, 1));
        let parsed = RasterImage::from_data_url(&image.to_data_url()).unwrap();
        assert_eq!(parsed, image);
        assert_eq!(parsed.dimensions().unwrap(), (3, 1));
        assert!(RasterImage::from_data_url("data:text/plain;base64,aGk=").is_none());
    }

    #[test]
    fn base64_mime_is_corrected_by_sniffing() {
        let png = solid_png(1, 1);
        let encoded = STANDARD.encode(&png);
        let image = RasterImage::from_base64("image/jpeg", &encoded).unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.extension(), "png");
    }

    #[test]
    fn mismatched_buffer_is_rejected() {
        assert!(encode_png(vec![0; 3], 1, 1).is_err());
    }
}
