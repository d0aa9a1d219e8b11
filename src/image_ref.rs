//! Immutable encoded image values shared by capture, generation and storage.

use std::fmt;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use thiserror::Error;

pub const MIME_JPEG: &str = "image/jpeg";
pub const MIME_PNG: &str = "image/png";
pub const MIME_OCTET_STREAM: &str = "application/octet-stream";

const DATA_URI_SCHEME: &str = "data:";
const BASE64_MARKER: &str = ";base64";

#[derive(Debug, Error)]
pub enum ImageRefError {
    #[error("data uri is missing the ',' payload separator")]
    MissingPayloadSeparator,
    #[error("data uri is not base64 encoded")]
    NotBase64,
    #[error("invalid base64 image payload: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Encoded image bytes plus their MIME type.
///
/// Cloning is cheap; the bytes are shared and never mutated after creation.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageRef {
    mime_type: String,
    bytes: Arc<[u8]>,
}

impl ImageRef {
    pub fn new(mime_type: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn jpeg(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self::new(MIME_JPEG, bytes)
    }

    pub fn png(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self::new(MIME_PNG, bytes)
    }

    /// Parses `data:<mime>;base64,<payload>`. A bare base64 string without the
    /// `data:` prefix is accepted and treated as JPEG.
    pub fn from_data_uri(value: &str) -> Result<Self, ImageRefError> {
        let value = value.trim();
        let Some(rest) = value.strip_prefix(DATA_URI_SCHEME) else {
            let bytes = BASE64.decode(value.as_bytes())?;
            return Ok(Self::jpeg(bytes));
        };

        let (header, payload) = rest
            .split_once(',')
            .ok_or(ImageRefError::MissingPayloadSeparator)?;
        let mime_type = header
            .strip_suffix(BASE64_MARKER)
            .ok_or(ImageRefError::NotBase64)?;
        let mime_type = if mime_type.is_empty() {
            MIME_OCTET_STREAM
        } else {
            mime_type
        };
        let bytes = BASE64.decode(payload.as_bytes())?;
        Ok(Self::new(mime_type, bytes))
    }

    pub fn to_data_uri(&self) -> String {
        format!(
            "{DATA_URI_SCHEME}{}{BASE64_MARKER},{}",
            self.mime_type,
            self.to_base64()
        )
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.bytes)
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn file_extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            MIME_JPEG => "jpg",
            MIME_PNG => "png",
            "image/webp" => "webp",
            "image/gif" => "gif",
            "image/bmp" => "bmp",
            _ => "bin",
        }
    }
}

// Image payloads are large; keep them out of debug logs.
impl fmt::Debug for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageRef")
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}
