//! Response providers for pet chat replies.
//!
//! A provider turns a user message and the pet's mood into a short reply.
//! Providers never fail from the caller's point of view: a missing API key
//! or any backend problem degrades to a fixed in-character string.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::pet::Mood;

/// Reply used when no API key is configured.
pub const MISSING_KEY_REPLY: &str = "Meow? (API Key missing)";

/// Reply used when the backend returns no text.
pub const EMPTY_REPLY: &str = "Purr...";

/// Reply used when the backend cannot be reached or answers with an error.
pub const CONNECTION_ERROR_REPLY: &str = "Hiss... (Connection error)";

/// Something that can answer the user on the pet's behalf.
#[async_trait]
pub trait ResponseProvider: Send + Sync {
    /// Produce a reply to `message` in the given mood.
    ///
    /// May take arbitrarily long. Must not panic; failures are expressed as
    /// reply text.
    async fn generate(&self, message: &str, mood: Mood) -> String;
}

/// Provider backed by the Gemini `generateContent` REST endpoint.
#[derive(Debug, Clone)]
pub struct GeminiProvider {
    client: Client,
    config: ProviderConfig,
}

impl GeminiProvider {
    /// Create a provider from an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error::Http` if the HTTP client cannot be built.
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self { client, config })
    }

    /// The configuration this provider was built with.
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// The persona instruction sent with every request.
    pub fn system_instruction(&self, mood: Mood) -> String {
        format!(
            "You are a small, cute, virtual pixel cat living in an iPhone Dynamic Island.\n\
             Your name is \"{name}\".\n\
             Current Mood: {mood}.\n\
             \n\
             Traits:\n\
             - You speak briefly (max 1-2 sentences).\n\
             - You use cat puns or sounds like \"Meow\", \"Purr\".\n\
             - You are sometimes sassy, sometimes sweet.\n\
             - You love digital fish.\n\
             \n\
             Reply directly to the user's text as the cat.",
            name = self.config.pet_name,
            mood = mood,
        )
    }

    fn build_request(&self, message: &str, mood: Mood) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(message.to_string()),
                }],
            }],
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: Some(self.system_instruction(mood)),
                }],
            },
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
                max_output_tokens: self.config.max_output_tokens,
            },
        }
    }

    /// Issue one request and return the trimmed reply text, if any.
    async fn request(&self, api_key: &str, message: &str, mood: Mood) -> Result<Option<String>> {
        let request = self.build_request(message, mood);

        let response = self
            .client
            .post(self.config.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(Error::api(status.as_u16(), body));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body)?;
        Ok(parsed.text())
    }
}

#[async_trait]
impl ResponseProvider for GeminiProvider {
    async fn generate(&self, message: &str, mood: Mood) -> String {
        let Some(api_key) = self.config.usable_api_key() else {
            tracing::debug!("no API key configured, answering with placeholder");
            return MISSING_KEY_REPLY.to_string();
        };

        match self.request(api_key, message, mood).await {
            Ok(Some(text)) => text,
            Ok(None) => EMPTY_REPLY.to_string(),
            Err(err) => {
                tracing::warn!(model = %self.config.model, "pet reply failed: {}", err);
                CONNECTION_ERROR_REPLY.to_string()
            }
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    system_instruction: Content,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    max_output_tokens: u32,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate, trimmed. `None` if blank.
    fn text(&self) -> Option<String> {
        let candidate = self.candidates.first()?;
        let text: String = candidate
            .content
            .parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();
        let text = text.trim();
        if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(config: ProviderConfig) -> GeminiProvider {
        GeminiProvider::new(config).unwrap()
    }

    #[test]
    fn test_system_instruction_interpolates_name_and_mood() {
        let p = provider(ProviderConfig::new());
        let happy = p.system_instruction(Mood::Happy);
        assert!(happy.contains("Your name is \"Mochi\""));
        assert!(happy.contains("Current Mood: Happy."));
        assert!(happy.contains("max 1-2 sentences"));
        assert!(happy.contains("digital fish"));

        let p = provider(ProviderConfig::new().pet_name("Tofu"));
        let grumpy = p.system_instruction(Mood::Grumpy);
        assert!(grumpy.contains("Your name is \"Tofu\""));
        assert!(grumpy.contains("Current Mood: Grumpy."));
    }

    #[test]
    fn test_request_body_shape() {
        let p = provider(ProviderConfig::new().temperature(0.5).max_output_tokens(42));
        let body = serde_json::to_value(p.build_request("hello", Mood::Happy)).unwrap();

        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hello");
        assert!(body["systemInstruction"].get("role").is_none());
        assert!(body["systemInstruction"]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .contains("Current Mood: Happy."));
        assert_eq!(body["generationConfig"]["temperature"], 0.5);
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 42);
    }

    #[test]
    fn test_response_text_extraction() {
        let parsed: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"  Meow, "},{"text":"hello! "}]}}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.text().as_deref(), Some("Meow, hello!"));

        let empty: GenerateContentResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert_eq!(empty.text(), None);

        let blank: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates":[{"content":{"parts":[{"text":"   "}]}}]}"#)
                .unwrap();
        assert_eq!(blank.text(), None);

        let no_content: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).unwrap();
        assert_eq!(no_content.text(), None);
    }

    #[tokio::test]
    async fn test_missing_key_returns_placeholder_without_network() {
        // Unroutable base URL: any request attempt would fail with a connection error.
        let p = provider(ProviderConfig::new().base_url("http://127.0.0.1:9"));
        assert_eq!(p.generate("hi", Mood::Happy).await, MISSING_KEY_REPLY);
    }

    #[tokio::test]
    async fn test_unreachable_backend_returns_fallback() {
        let p = provider(
            ProviderConfig::new()
                .api_key("test-key")
                .base_url("http://127.0.0.1:9"),
        );
        assert_eq!(p.generate("hi", Mood::Grumpy).await, CONNECTION_ERROR_REPLY);
    }
}
