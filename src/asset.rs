//! Image assets: raw bytes with their transmission and display encodings.

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose;
use image::ImageFormat;

/// Errors returned when building an [`ImageAsset`].
#[derive(Debug)]
pub enum ImageError {
    /// The MIME type does not describe an image.
    UnsupportedMimeType(String),
    /// The bytes do not start with a known image header.
    UnknownFormat,
    /// The base64 payload could not be decoded.
    InvalidBase64(base64::DecodeError),
    /// The string is not a `data:<mime>;base64,<payload>` URI.
    InvalidDataUri,
    /// Reading the image from disk failed.
    Io(std::io::Error),
}

impl std::fmt::Display for ImageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedMimeType(mime_type) => {
                write!(f, "Unsupported MIME type for an image: {mime_type}")
            }
            Self::UnknownFormat => write!(f, "Unrecognised image format"),
            Self::InvalidBase64(err) => write!(f, "Invalid base64 image payload: {err}"),
            Self::InvalidDataUri => write!(f, "Not a base64 data URI"),
            Self::Io(err) => write!(f, "Failed to read image: {err}"),
        }
    }
}

impl std::error::Error for ImageError {}

impl From<std::io::Error> for ImageError {
    fn from(err: std::io::Error) -> Self {
        ImageError::Io(err)
    }
}

/// An image and the two encodings derived from its bytes.
///
/// The encodings are computed once at construction. There are no setters;
/// a different image means a new asset.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ImageAsset {
    bytes: Vec<u8>,
    mime_type: String,
    base64: String,
    data_uri: String,
}

impl ImageAsset {
    /// Builds an asset from raw bytes and their MIME type.
    pub fn from_bytes(bytes: Vec<u8>, mime_type: &str) -> Result<Self, ImageError> {
        let mime_type = mime_type.trim().to_ascii_lowercase();
        if !mime_type.starts_with("image/") {
            return Err(ImageError::UnsupportedMimeType(mime_type));
        }
        let base64 = general_purpose::STANDARD.encode(&bytes);
        let data_uri = data_uri(&mime_type, &base64);
        Ok(Self {
            bytes,
            mime_type,
            base64,
            data_uri,
        })
    }

    /// Decodes a base64 payload, eg one returned by the provider.
    pub fn from_base64(payload: &str, mime_type: &str) -> Result<Self, ImageError> {
        let bytes = general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(ImageError::InvalidBase64)?;
        Self::from_bytes(bytes, mime_type)
    }

    /// Builds an asset from uploaded bytes, sniffing the format from the header.
    pub fn from_upload(bytes: Vec<u8>) -> Result<Self, ImageError> {
        let format = image::guess_format(&bytes).map_err(|_| ImageError::UnknownFormat)?;
        Self::from_bytes(bytes, format.to_mime_type())
    }

    /// Reads an image file.
    pub fn from_path(path: &Path) -> Result<Self, ImageError> {
        let bytes = std::fs::read(path)?;
        Self::from_upload(bytes)
    }

    /// Parses a `data:<mime>;base64,<payload>` URI.
    pub fn from_data_uri(uri: &str) -> Result<Self, ImageError> {
        let rest = uri.strip_prefix("data:").ok_or(ImageError::InvalidDataUri)?;
        let (header, payload) = rest.split_once(',').ok_or(ImageError::InvalidDataUri)?;
        let mime_type = header
            .strip_suffix(";base64")
            .ok_or(ImageError::InvalidDataUri)?;
        Self::from_base64(payload, mime_type)
    }

    /// Raw image bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// MIME type, lowercased.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Standard base64 of the bytes, for transmission.
    pub fn base64(&self) -> &str {
        &self.base64
    }

    /// `data:` URI of the bytes, for display.
    pub fn data_uri(&self) -> &str {
        &self.data_uri
    }

    /// Conventional file extension for the MIME type, `bin` when unknown.
    pub fn file_extension(&self) -> &'static str {
        ImageFormat::from_mime_type(&self.mime_type)
            .and_then(|format| format.extensions_str().first().copied())
            .unwrap_or("bin")
    }
}

/// Formats a displayable `data:` URI.
pub fn data_uri(mime_type: &str, base64: &str) -> String {
    format!("data:{mime_type};base64,{base64}")
}
