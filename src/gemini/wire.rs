//! JSON shapes of the `generateContent` endpoint.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

impl GenerateContentRequest {
    pub fn new(parts: Vec<RequestPart>) -> Self {
        Self {
            contents: vec![Content { parts }],
            generation_config: None,
        }
    }

    pub fn text(prompt: impl Into<String>) -> Self {
        Self::new(vec![RequestPart::text(prompt)])
    }

    /// Asks for `application/json` output matching `schema`.
    pub fn with_json_schema(mut self, schema: Value) -> Self {
        let config = self.generation_config.get_or_insert_with(GenerationConfig::default);
        config.response_mime_type = Some("application/json".to_string());
        config.response_schema = Some(schema);
        self
    }

    pub fn with_image_config(mut self, aspect_ratio: &str, image_size: &str) -> Self {
        let config = self.generation_config.get_or_insert_with(GenerationConfig::default);
        config.image_config = Some(ImageConfig {
            aspect_ratio: aspect_ratio.to_string(),
            image_size: image_size.to_string(),
        });
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Content {
    pub parts: Vec<RequestPart>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum RequestPart {
    Text {
        text: String,
    },
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

impl RequestPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn inline(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self::Inline {
            inline_data: InlineData {
                mime_type: mime_type.into(),
                data: data.into(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_config: Option<ImageConfig>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageConfig {
    pub aspect_ratio: String,
    pub image_size: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Option<Vec<ResponsePart>>,
}

/// A response part. Image payloads arrive as either `inlineData` or `inline_data`.
#[derive(Debug, Deserialize)]
pub struct ResponsePart {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, rename = "inlineData", alias = "inline_data")]
    pub inline_data: Option<ResponseInlineData>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseInlineData {
    #[serde(default, rename = "mimeType", alias = "mime_type")]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub data: Option<String>,
}

impl GenerateContentResponse {
    /// Content of the first candidate, if the envelope has one.
    pub fn first_content(&self) -> Option<&CandidateContent> {
        self.candidates
            .as_ref()
            .and_then(|candidates| candidates.first())
            .and_then(|candidate| candidate.content.as_ref())
    }

    pub fn parts(&self) -> &[ResponsePart] {
        self.first_content()
            .and_then(|content| content.parts.as_deref())
            .unwrap_or(&[])
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ErrorEnvelope {
    #[serde(default)]
    pub error: Option<ErrorBody>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn structured_request_serialises_in_camel_case() {
        let request = GenerateContentRequest::text("hi").with_json_schema(json!({"type": "OBJECT"}));
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(value["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(value["generationConfig"]["responseSchema"]["type"], "OBJECT");
        assert!(value["generationConfig"].get("imageConfig").is_none());
    }

    #[test]
    fn inline_part_and_image_config_shape() {
        let request = GenerateContentRequest::new(vec![
            RequestPart::text("draw"),
            RequestPart::inline("image/png", "AAAA"),
        ])
        .with_image_config("16:9", "2K");
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["contents"][0]["parts"][1]["inlineData"]["mimeType"], "image/png");
        assert_eq!(value["generationConfig"]["imageConfig"]["aspectRatio"], "16:9");
        assert_eq!(value["generationConfig"]["imageConfig"]["imageSize"], "2K");
        assert!(value.get("generationConfig").unwrap().get("responseMimeType").is_none());
    }

    #[test]
    fn both_image_field_spellings_deserialize() {
        let camel: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"parts": [{"inlineData": {"mimeType": "image/png", "data": "AA=="}}]}}]
        }))
        .unwrap();
        let snake: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"parts": [{"inline_data": {"mime_type": "image/png", "data": "AA=="}}]}}]
        }))
        .unwrap();
        for response in [camel, snake] {
            let inline = response.parts()[0].inline_data.as_ref().unwrap();
            assert_eq!(inline.mime_type.as_deref(), Some("image/png"));
            assert_eq!(inline.data.as_deref(), Some("AA=="));
        }
    }
}
