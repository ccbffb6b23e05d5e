use crate::ai::client::{GenerationError, GenerationResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Client for the Gemini `generateContent` endpoint
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

// Gemini API request types
#[derive(Serialize)]
pub(crate) struct GeminiRequest<'a> {
    contents: [GeminiContent<'a>; 1],
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct GeminiContent<'a> {
    role: &'a str,
    parts: [GeminiPart<'a>; 1],
}

#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: &'static str,
}

// Gemini API response types. Every level is optional: error bodies share the
// same envelope without candidates.
#[derive(Deserialize, Default)]
pub(crate) struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiCandidateContent>,
}

#[derive(Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiCandidatePart>,
}

#[derive(Deserialize)]
struct GeminiCandidatePart {
    text: Option<String>,
}

impl<'a> GeminiRequest<'a> {
    pub(crate) fn new(prompt: &'a str) -> Self {
        Self {
            contents: [GeminiContent {
                role: "user",
                parts: [GeminiPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "text/plain",
            },
        }
    }
}

impl GeminiResponse {
    /// Text of the first part of the first candidate, if present and not blank.
    pub(crate) fn reply_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .and_then(|content| content.parts.into_iter().next())
            .and_then(|part| part.text)
            .filter(|text| !text.trim().is_empty())
    }
}

impl GeminiClient {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Option<Duration>,
    ) -> GenerationResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            base_url: base_url.into(),
            model: model.into(),
            api_key: api_key.into(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    pub async fn complete(&self, prompt: &str) -> GenerationResult<Option<String>> {
        debug!(model = %self.model, prompt_len = prompt.len(), "sending gemini request");

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&GeminiRequest::new(prompt))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            // The body is still parsed below; an error envelope has no candidates.
            warn!(%status, "gemini endpoint returned an error status");
        }

        parse_reply(&body)
    }
}

pub(crate) fn parse_reply(body: &str) -> GenerationResult<Option<String>> {
    let parsed: GeminiResponse =
        serde_json::from_str(body).map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;
    Ok(parsed.reply_text())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_shape() {
        let value = serde_json::to_value(GeminiRequest::new("hello")).unwrap();
        assert_eq!(
            value,
            json!({
                "contents": [{ "role": "user", "parts": [{ "text": "hello" }] }],
                "generationConfig": { "responseMimeType": "text/plain" }
            })
        );
    }

    #[test]
    fn test_parse_reply_takes_first_part() {
        let body = r#"{
            "candidates": [
                { "content": { "role": "model", "parts": [{ "text": "hi there" }, { "text": "ignored" }] } },
                { "content": { "parts": [{ "text": "second candidate" }] } }
            ]
        }"#;
        assert_eq!(parse_reply(body).unwrap().as_deref(), Some("hi there"));
    }

    #[test]
    fn test_error_envelope_has_no_reply() {
        let body = r#"{ "error": { "code": 400, "message": "API key not valid" } }"#;
        assert_eq!(parse_reply(body).unwrap(), None);
    }

    #[test]
    fn test_candidate_without_content_has_no_reply() {
        let body = r#"{ "candidates": [{ "finishReason": "SAFETY" }] }"#;
        assert_eq!(parse_reply(body).unwrap(), None);
    }

    #[test]
    fn test_blank_part_text_has_no_reply() {
        let body = r#"{ "candidates": [{ "content": { "parts": [{ "text": "  \n" }] } }] }"#;
        assert_eq!(parse_reply(body).unwrap(), None);
        let body = r#"{ "candidates": [{ "content": { "parts": [{ "text": "" }] } }] }"#;
        assert_eq!(parse_reply(body).unwrap(), None);
    }

    #[test]
    fn test_non_json_body_is_malformed() {
        let result = parse_reply("<html>502 Bad Gateway</html>");
        assert!(matches!(result, Err(GenerationError::MalformedResponse(_))));
    }

    #[test]
    fn test_endpoint_includes_model() {
        let client = GeminiClient::new("http://localhost:9000", "gemini-1.5-flash", "k", None).unwrap();
        assert_eq!(
            client.endpoint(),
            "http://localhost:9000/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }
}
