//! JSON bodies of the `generateContent` endpoint.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use super::{strip_data_uri_prefix, GenerationError, GenerationResult, ASPECT_RATIO, GYM_PROMPT};
use crate::image_ref::{ImageRef, MIME_JPEG};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Content {
    pub parts: Vec<RequestPart>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RequestPart {
    Image {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
    Text {
        text: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    #[serde(default)]
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub image_config: ImageConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageConfig {
    pub aspect_ratio: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsePart {
    pub inline_data: Option<InlineData>,
    pub text: Option<String>,
}

/// Builds the request for one photo. `encoded` may be bare base64 or a data
/// URI; both produce the same body.
pub fn build_request(encoded: &str) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content {
            parts: vec![
                RequestPart::Image {
                    inline_data: InlineData {
                        mime_type: MIME_JPEG.to_string(),
                        data: strip_data_uri_prefix(encoded).to_string(),
                    },
                },
                RequestPart::Text {
                    text: GYM_PROMPT.to_string(),
                },
            ],
        }],
        generation_config: GenerationConfig {
            image_config: ImageConfig {
                aspect_ratio: ASPECT_RATIO.to_string(),
            },
        },
    }
}

/// Returns the first inline image of the first candidate as PNG.
pub fn extract_image(response: GenerateContentResponse) -> GenerationResult<ImageRef> {
    let parts = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| content.parts)
        .unwrap_or_default();

    let mut skipped_text = 0usize;
    for part in parts {
        if let Some(inline) = part.inline_data.filter(|inline| !inline.data.is_empty()) {
            let bytes = BASE64.decode(inline.data.as_bytes())?;
            tracing::debug!(
                bytes = bytes.len(),
                reported_mime = %inline.mime_type,
                skipped_text,
                "found generated image in response"
            );
            return Ok(ImageRef::png(bytes));
        }
        if part.text.is_some() {
            skipped_text += 1;
        }
    }

    Err(GenerationError::NoImageInResponse)
}
