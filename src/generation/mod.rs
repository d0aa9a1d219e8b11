//! Outbound image generation.

use thiserror::Error;

use crate::image_ref::ImageRef;

pub mod gemini;
pub mod wire;

pub use gemini::GeminiClient;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const ASPECT_RATIO: &str = "1:1";
/// Environment variables consulted for the API key, in order.
pub const API_KEY_ENV_VARS: [&str; 2] = ["API_KEY", "GEMINI_API_KEY"];

pub const GYM_PROMPT: &str = "Analyze the person in this photo. Generate a new photo of this \
EXACT SAME person immediately after a high-intensity gym workout. They should look visibly \
sweaty with glistening skin, have a noticeable muscular 'pump', and be wearing athletic \
fitness apparel. The setting should be a professional, modern gym with weights and machines \
in the background. Maintain the person's unique facial features and identity perfectly.";

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("generation endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to parse generation response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("generated image is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("generation response did not contain an image")]
    NoImageInResponse,
}

pub type GenerationResult<T> = std::result::Result<T, GenerationError>;

/// Turns one photo into its post-workout version.
///
/// Called from a worker thread, hence `Send + Sync`.
pub trait GenerationClient: Send + Sync {
    fn generate(&self, image: &ImageRef) -> GenerationResult<ImageRef>;
}

/// Returns the payload after the first comma of a data URI, or the input
/// unchanged when there is no comma.
pub fn strip_data_uri_prefix(encoded: &str) -> &str {
    encoded
        .split_once(',')
        .map_or(encoded, |(_, payload)| payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_data_uri_prefix_keeps_text_after_first_comma() {
        assert_eq!(strip_data_uri_prefix("data:image/jpeg;base64,AQID"), "AQID");
        assert_eq!(strip_data_uri_prefix("a,b,c"), "b,c");
    }

    #[test]
    fn strip_data_uri_prefix_passes_bare_payload_through() {
        assert_eq!(strip_data_uri_prefix("AQID"), "AQID");
        assert_eq!(strip_data_uri_prefix(""), "");
    }

    #[test]
    fn prompt_asks_for_same_person_after_workout() {
        assert!(GYM_PROMPT.contains("EXACT SAME person"));
        assert!(GYM_PROMPT.contains("gym workout"));
        assert!(!GYM_PROMPT.contains("  "));
    }
}
