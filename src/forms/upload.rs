use super::error;
use axum::body::Bytes;
use image::ImageFormat;
use validator::ValidationError;

pub const MAX_IMAGE_SIZE: usize = 5 * 1024 * 1024;

pub const INVALID_IMAGE: &str = "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";
pub const IMAGE_TOO_LARGE: &str = "Ensure this file is smaller than 5 MB.";
pub const EMPTY_FILE: &str = "The submitted file is empty.";

/// A file part received from a multipart form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl UploadedFile {
    /// Browsers send an unnamed empty part when no file was chosen.
    pub fn is_absent(&self) -> bool {
        self.data.is_empty() && self.file_name.as_deref().unwrap_or("").is_empty()
    }
}

/// Decode the payload and return the file extension to store it under.
/// The declared content type and file name are ignored.
pub fn image_extension(data: &[u8]) -> Option<&'static str> {
    let format = image::guess_format(data).ok()?;
    let ext = match format {
        ImageFormat::Png => "png",
        ImageFormat::Jpeg => "jpg",
        ImageFormat::Gif => "gif",
        ImageFormat::WebP => "webp",
        _ => return None,
    };
    image::load_from_memory_with_format(data, format).ok()?;
    Some(ext)
}

/// Size and format checks for an uploaded image; yields the extension to
/// store it under.
pub fn validate_image(file: &UploadedFile) -> Result<&'static str, ValidationError> {
    if file.data.is_empty() {
        return Err(error("empty", EMPTY_FILE));
    }
    if file.data.len() > MAX_IMAGE_SIZE {
        return Err(error("file_size", IMAGE_TOO_LARGE));
    }
    image_extension(&file.data).ok_or_else(|| error("invalid_image", INVALID_IMAGE))
}
