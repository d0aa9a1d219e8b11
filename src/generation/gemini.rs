use std::time::{Duration, Instant};

use reqwest::blocking::Client;

use super::wire::{build_request, extract_image, GenerateContentResponse};
use super::{GenerationClient, GenerationError, GenerationResult, API_KEY_ENV_VARS};
use crate::image_ref::ImageRef;

const API_KEY_HEADER: &str = "x-goog-api-key";
const ERROR_BODY_LOG_LIMIT: usize = 512;

/// Gemini `generateContent` client. One attempt per call, no retry.
pub struct GeminiClient {
    http: Client,
    endpoint: String,
    api_key: String,
}

impl GeminiClient {
    /// Reads the API key from the environment once.
    pub fn from_env(api_base: &str, model: &str) -> GenerationResult<Self> {
        let api_key = api_key_from_env(|name| std::env::var(name).ok());
        if api_key.is_empty() {
            tracing::warn!(
                vars = ?API_KEY_ENV_VARS,
                "no API key in environment; generation requests will be rejected"
            );
        }
        Self::with_api_key(api_base, model, api_key)
    }

    pub fn with_api_key(
        api_base: &str,
        model: &str,
        api_key: impl Into<String>,
    ) -> GenerationResult<Self> {
        let http = Client::builder().timeout(None::<Duration>).build()?;
        Ok(Self {
            http,
            endpoint: endpoint_url(api_base, model),
            api_key: api_key.into(),
        })
    }
}

impl GenerationClient for GeminiClient {
    fn generate(&self, image: &ImageRef) -> GenerationResult<ImageRef> {
        let request = build_request(&image.to_data_uri());
        let started = Instant::now();
        tracing::info!(endpoint = %self.endpoint, bytes = image.len(), "sending generation request");

        let response = self
            .http
            .post(&self.endpoint)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request)
            .send()?;
        let status = response.status();
        let body = response.text()?;
        tracing::debug!(
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "generation response received"
        );

        if !status.is_success() {
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body)?;
        let generated = extract_image(parsed)?;
        tracing::info!(bytes = generated.len(), "generation finished");
        Ok(generated)
    }
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("endpoint", &self.endpoint)
            .field("has_api_key", &!self.api_key.is_empty())
            .finish()
    }
}

fn endpoint_url(api_base: &str, model: &str) -> String {
    format!(
        "{}/models/{}:generateContent",
        api_base.trim_end_matches('/'),
        model.trim()
    )
}

fn api_key_from_env(lookup: impl Fn(&str) -> Option<String>) -> String {
    API_KEY_ENV_VARS
        .iter()
        .filter_map(|name| lookup(name))
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
        .unwrap_or_default()
}

fn truncate_body(body: &str) -> String {
    match body.char_indices().nth(ERROR_BODY_LOG_LIMIT) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::{DEFAULT_API_BASE, DEFAULT_MODEL};

    #[test]
    fn endpoint_joins_base_and_model() {
        assert_eq!(
            endpoint_url(DEFAULT_API_BASE, DEFAULT_MODEL),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash-image:generateContent"
        );
        assert_eq!(
            endpoint_url("http://localhost:8080/", "custom-model"),
            "http://localhost:8080/models/custom-model:generateContent"
        );
    }

    #[test]
    fn api_key_prefers_api_key_then_gemini_api_key() {
        let both = |name: &str| match name {
            "API_KEY" => Some("primary".to_string()),
            "GEMINI_API_KEY" => Some("secondary".to_string()),
            _ => None,
        };
        let fallback = |name: &str| (name == "GEMINI_API_KEY").then(|| "secondary".to_string());
        let blank_primary = |name: &str| match name {
            "API_KEY" => Some("   ".to_string()),
            _ => Some("secondary".to_string()),
        };

        assert_eq!(api_key_from_env(both), "primary");
        assert_eq!(api_key_from_env(fallback), "secondary");
        assert_eq!(api_key_from_env(blank_primary), "secondary");
        assert_eq!(api_key_from_env(|_| None), "");
    }

    #[test]
    fn debug_output_hides_api_key() {
        let client = GeminiClient::with_api_key(DEFAULT_API_BASE, DEFAULT_MODEL, "secret-key")
            .expect("client should build");

        let debug = format!("{client:?}");

        assert!(!debug.contains("secret-key"));
        assert!(debug.contains("has_api_key: true"));
    }

    #[test]
    fn truncate_body_limits_long_error_bodies() {
        let long = "x".repeat(ERROR_BODY_LOG_LIMIT + 10);
        let truncated = truncate_body(&long);
        assert_eq!(truncated.len(), ERROR_BODY_LOG_LIMIT + 3);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncate_body("short"), "short");
    }
}
