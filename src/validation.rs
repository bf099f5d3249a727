use axum::http::HeaderMap;
use image::ImageFormat;
use std::net::SocketAddr;

use crate::error::ApiError;

/// Maximum accepted image payload: 5 MiB.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Minimum digit count for an order-form phone number, counted after stripping
/// all non-digit characters.
pub const MIN_PHONE_DIGITS: usize = 13;

/// File extensions accepted for uploads, checked independently of the declared
/// content type.
const ALLOWED_EXTENSIONS: [&str; 6] = ["jpeg", "jpg", "png", "gif", "bmp", "webp"];

/// SniffedImage
///
/// The outcome of a successful image validation: the format positively
/// identified from the file's magic bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SniffedImage {
    /// Canonical lowercase format name (e.g. "jpeg", "png").
    pub format: &'static str,
}

/// validate_image
///
/// Validates an uploaded file as a real image. Checks run in order, each
/// short-circuiting on failure:
///
/// 1. file presence (non-empty payload);
/// 2. the declared content type must start with `image/`;
/// 3. the file extension must be in the accepted set;
/// 4. magic-byte sniffing must positively identify jpeg/png/gif/bmp/webp — a
///    mismatch between the sniffed format and the declared type or extension is
///    not itself an error as long as the sniffed format is allowed;
/// 5. the payload must not exceed 5 MiB.
///
/// The caller keeps ownership of the full byte buffer, so downstream consumers
/// (the object store upload) still see the complete contents.
pub fn validate_image(
    filename: &str,
    declared_content_type: Option<&str>,
    bytes: &[u8],
) -> Result<SniffedImage, ApiError> {
    if bytes.is_empty() {
        return Err(ApiError::MissingFile);
    }

    match declared_content_type {
        Some(ct) if ct.starts_with("image/") => {}
        _ => return Err(ApiError::Validation("File must be an image.".to_string())),
    }

    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(ApiError::Validation(format!(
            "Invalid image file: extension '{}' is not allowed. Allowed extensions: {}.",
            extension,
            ALLOWED_EXTENSIONS.join(", ")
        )));
    }

    let format = match image::guess_format(bytes) {
        Ok(f) => f,
        Err(_) => {
            return Err(ApiError::Validation(
                "File does not contain valid image data.".to_string(),
            ));
        }
    };

    let format = match format {
        ImageFormat::Jpeg => "jpeg",
        ImageFormat::Png => "png",
        ImageFormat::Gif => "gif",
        ImageFormat::Bmp => "bmp",
        ImageFormat::WebP => "webp",
        other => {
            return Err(ApiError::Validation(format!(
                "Image format '{}' is not supported. Allowed formats: jpeg, jpg, png, gif, bmp, webp.",
                other.extensions_str().first().unwrap_or(&"unknown")
            )));
        }
    };

    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(ApiError::Validation(
            "Image file size must be under 5MB.".to_string(),
        ));
    }

    Ok(SniffedImage { format })
}

/// normalize_phone
///
/// Strips all non-digit characters from a raw phone number and enforces the
/// minimum digit count. The returned digit-only string is the value that gets
/// persisted.
pub fn normalize_phone(raw: &str) -> Result<String, ApiError> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.len() < MIN_PHONE_DIGITS {
        return Err(ApiError::Validation(format!(
            "Phone number must have at least {} digits",
            MIN_PHONE_DIGITS
        )));
    }

    Ok(digits)
}

/// client_ip
///
/// Resolves the originating client address for a request: the first entry of the
/// `x-forwarded-for` header when present (the address a trusted proxy saw),
/// otherwise the direct peer address of the connection.
pub fn client_ip(headers: &HeaderMap, peer: SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
        .unwrap_or_else(|| peer.ip().to_string())
}
