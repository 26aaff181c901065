//! Gemini REST API client.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{LlmError, TextGenerator};

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Low sampling temperature so repeated evaluations of the same input score
/// consistently.
const TEMPERATURE: f32 = 0.1;

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
    #[serde(rename = "safetySettings")]
    safety_settings: Vec<SafetySetting>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ResponseContent {
    parts: Option<Vec<ResponsePart>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
}

/// Client for the Gemini text-generation API
#[derive(Debug)]
pub struct GeminiClient {
    client: Client,
    model: String,
    api_key: String,
}

impl GeminiClient {
    /// Create a new Gemini client
    pub fn new(api_key: String, model: String) -> Result<Self, String> {
        if api_key.is_empty() {
            return Err("Gemini API key is required".to_string());
        }

        Ok(Self {
            client: Client::new(),
            model,
            api_key,
        })
    }

    fn safety_settings() -> Vec<SafetySetting> {
        // Permissive enough for business evaluation content
        [
            "HARM_CATEGORY_HARASSMENT",
            "HARM_CATEGORY_HATE_SPEECH",
            "HARM_CATEGORY_SEXUALLY_EXPLICIT",
            "HARM_CATEGORY_DANGEROUS_CONTENT",
        ]
        .into_iter()
        .map(|category| SafetySetting {
            category,
            threshold: "BLOCK_MEDIUM_AND_ABOVE",
        })
        .collect()
    }

    fn classify_http_error(status: StatusCode, body: String) -> LlmError {
        if status == StatusCode::TOO_MANY_REQUESTS
            || body.contains("quota")
            || body.contains("RESOURCE_EXHAUSTED")
        {
            return LlmError::QuotaExceeded(body);
        }
        LlmError::Provider(format!("Gemini API error {}: {}", status, body))
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
            },
            safety_settings: Self::safety_settings(),
        };

        let url = format!("{}/{}:generateContent", GEMINI_API_URL, self.model);

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Provider(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Self::classify_http_error(status, body));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Provider(format!("invalid Gemini response: {}", e)))?;

        let candidate = body
            .candidates
            .and_then(|mut c| if c.is_empty() { None } else { Some(c.remove(0)) })
            .ok_or(LlmError::EmptyResponse)?;

        if candidate.finish_reason.as_deref() == Some("SAFETY") {
            return Err(LlmError::SafetyBlocked);
        }

        let text: String = candidate
            .content
            .and_then(|c| c.parts)
            .map(|parts| {
                parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(LlmError::EmptyResponse);
        }

        debug!("Gemini returned {} chars", text.len());
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_api_key() {
        let err = GeminiClient::new(String::new(), "gemini-1.5-pro".to_string()).unwrap_err();
        assert!(err.contains("API key"));
    }

    #[test]
    fn classifies_429_as_quota() {
        let err = GeminiClient::classify_http_error(
            StatusCode::TOO_MANY_REQUESTS,
            "rate limited".to_string(),
        );
        assert!(matches!(err, LlmError::QuotaExceeded(_)));
    }

    #[test]
    fn classifies_quota_marker_in_body() {
        let err = GeminiClient::classify_http_error(
            StatusCode::FORBIDDEN,
            "RESOURCE_EXHAUSTED: billing".to_string(),
        );
        assert!(matches!(err, LlmError::QuotaExceeded(_)));
    }

    #[test]
    fn other_http_failures_are_provider_errors() {
        let err =
            GeminiClient::classify_http_error(StatusCode::INTERNAL_SERVER_ERROR, "boom".to_string());
        assert!(matches!(err, LlmError::Provider(_)));
    }
}
