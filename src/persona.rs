use crate::error::{GenerationError, MAX_PERSONA_BYTES, Result};
use crate::image_processing::{RasterImage, detect_mime_type};

/// A user-supplied reference photo that steers the character in generated
/// thumbnails. Lives only in session memory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PersonaImage {
    pub file_name: String,
    pub image: RasterImage,
}

impl PersonaImage {
    pub fn from_upload(file_name: &str, declared_mime: Option<&str>, bytes: Vec<u8>) -> Result<Self> {
        let declared = declared_mime
            .map(|value| value.split(';').next().unwrap_or(value).trim().to_ascii_lowercase())
            .unwrap_or_default();
        if !declared.starts_with("image/") {
            return Err(GenerationError::UnsupportedFile(if declared.is_empty() {
                "unknown".to_string()
            } else {
                declared
            }));
        }
        if bytes.len() > MAX_PERSONA_BYTES {
            return Err(GenerationError::FileTooLarge(bytes.len()));
        }
        if bytes.is_empty() {
            return Err(GenerationError::UnsupportedFile("empty file".to_string()));
        }
        let mime_type = detect_mime_type(&bytes)
            .map(str::to_string)
            .unwrap_or(declared);
        Ok(Self {
            file_name: file_name.to_string(),
            image: RasterImage::new(mime_type, bytes),
        })
    }

    pub fn mime_type(&self) -> &str {
        &self.image.mime_type
    }

    pub fn base64_data(&self) -> String {
        self.image.to_base64()
    }
}
