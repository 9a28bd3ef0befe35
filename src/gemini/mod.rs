pub mod extract;
pub mod wire;

use std::sync::Arc;

use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::debug;

use crate::config::AppConfig;
use crate::credential::CredentialStore;
use crate::error::{GenerationError, Result};
use wire::{ErrorEnvelope, GenerateContentRequest, GenerateContentResponse};

pub use extract::parse_structured_json;

/// Client for the `generateContent` endpoint.
///
/// Holds no response cache; every call is one request (plus the image-model
/// fallback for thumbnails).
#[derive(Clone)]
pub struct GeminiClient {
    http: Client,
    api_base: String,
    pub(crate) text_model: String,
    pub(crate) image_model: String,
    pub(crate) fallback_image_model: String,
    credentials: Arc<CredentialStore>,
}

impl GeminiClient {
    pub fn new(config: &AppConfig, credentials: Arc<CredentialStore>) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(format!("playlist-studio/{}", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            api_base: config.api_base.as_str().trim_end_matches('/').to_string(),
            text_model: config.text_model.clone(),
            image_model: config.image_model.clone(),
            fallback_image_model: config.fallback_image_model.clone(),
            credentials,
        })
    }

    /// Same endpoint and models, different key source.
    pub fn with_credentials(&self, credentials: Arc<CredentialStore>) -> Self {
        Self {
            credentials,
            ..self.clone()
        }
    }

    pub fn has_credential(&self) -> bool {
        self.credentials.has()
    }

    fn api_key(&self) -> Result<String> {
        self.credentials
            .get()
            .filter(|key| !key.trim().is_empty())
            .ok_or(GenerationError::MissingCredential)
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{model}:generateContent", self.api_base)
    }

    /// One round trip; non-2xx statuses are classified, the body must be a
    /// response envelope.
    pub(crate) async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let api_key = self.api_key()?;
        debug!(model, "sending generateContent request");
        let response = self
            .http
            .post(self.endpoint(model))
            .query(&[("key", api_key.as_str())])
            .json(request)
            .send()
            .await?;

        let status = response.status();
        debug!(model, status = status.as_u16(), "generateContent responded");
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, &body));
        }
        let body = response.text().await?;
        serde_json::from_str::<GenerateContentResponse>(&body)
            .map_err(|_| GenerationError::MalformedResponse)
    }

    /// Text of the first part of the first candidate from the text model.
    pub(crate) async fn generate_text(&self, request: &GenerateContentRequest) -> Result<String> {
        let response = self.generate_content(&self.text_model, request).await?;
        first_text(&response)
    }

    /// Text-model call whose answer is parsed as JSON.
    pub(crate) async fn generate_structured(&self, prompt: String, schema: Value) -> Result<Value> {
        let request = GenerateContentRequest::text(prompt).with_json_schema(schema);
        let text = self.generate_text(&request).await?;
        parse_structured_json(&text)
    }
}

pub(crate) fn first_text(response: &GenerateContentResponse) -> Result<String> {
    let content = response
        .first_content()
        .ok_or(GenerationError::MalformedResponse)?;
    content
        .parts
        .as_ref()
        .and_then(|parts| parts.first())
        .and_then(|part| part.text.clone())
        .ok_or(GenerationError::MalformedResponse)
}

/// Endpoint-provided message from an error body, if any.
pub(crate) fn error_message(body: &str) -> Option<String> {
    let envelope = serde_json::from_str::<ErrorEnvelope>(body).ok()?;
    envelope
        .error
        .and_then(|error| error.message)
        .or(envelope.message)
        .map(|message| message.trim().to_string())
        .filter(|message| !message.is_empty())
}

/// Maps a non-2xx response onto the error taxonomy.
pub fn classify_failure(status: StatusCode, body: &str) -> GenerationError {
    let message = error_message(body);
    if status.is_client_error() {
        if let Some(message) = &message {
            let lowered = message.to_lowercase();
            if lowered.contains("key") || lowered.contains("credential") {
                return GenerationError::InvalidCredential(message.clone());
            }
        }
    }
    GenerationError::RequestFailed {
        status: status.as_u16(),
        message: message.unwrap_or_else(|| "The API request failed.".to_string()),
    }
}
