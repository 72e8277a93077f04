#[cfg(test)]
#[path = "upload_test.rs"]
mod tests;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::ImageFormat;

use super::ActivityError;

/// A student upload that decoded as a supported image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadedImage {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
}

impl UploadedImage {
    /// Detects the format from the content, not the file name, and fully
    /// decodes the bytes so truncated or renamed files are rejected.
    pub fn decode(bytes: Vec<u8>) -> Result<UploadedImage, ActivityError> {
        let format = image::guess_format(&bytes).map_err(|_| return ActivityError::InvalidImage)?;
        if format != ImageFormat::Jpeg && format != ImageFormat::Png {
            return Err(ActivityError::InvalidImage);
        }

        if let Err(err) = image::load_from_memory_with_format(&bytes, format) {
            tracing::debug!(error = ?err, "uploaded image failed to decode");
            return Err(ActivityError::InvalidImage);
        }

        return Ok(UploadedImage { bytes, format });
    }

    pub fn mime_type(&self) -> &'static str {
        return self.format.to_mime_type();
    }

    pub fn extension(&self) -> &'static str {
        return self.format.extensions_str().first().copied().unwrap_or("bin");
    }

    pub fn to_base64(&self) -> String {
        return STANDARD.encode(&self.bytes);
    }

    pub fn data_uri(&self) -> String {
        return format!("data:{};base64,{}", self.mime_type(), self.to_base64());
    }
}
