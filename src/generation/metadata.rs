use serde::Serialize;
use serde_json::{Value, json};

use crate::error::{GenerationError, Result};
use crate::gemini::GeminiClient;
use crate::gemini::extract::{string_field, string_list};

pub const LEADING_HASHTAG: &str = "#playlist";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VideoMetadata {
    pub description: String,
    pub hashtags: Vec<String>,
    /// Comma-separated search keywords.
    pub keywords: String,
}

impl VideoMetadata {
    /// Description followed by the hashtag line, as pasted into YouTube.
    pub fn full_description(&self) -> String {
        format!("{}\n\n{}", self.description, self.hashtags.join(" "))
    }
}

pub fn metadata_prompt(title: &str, genre: &str) -> String {
    format!(
        "You are a YouTube SEO specialist for music playlist channels.\n\
Playlist title: \"{title}\"\nGenre: \"{genre}\"\n\n\
Produce:\n\
- description: an engaging Korean video description (3-5 short paragraphs) describing the mood, \
when to listen, and a call to subscribe. Do not include a tracklist or timestamps.\n\
- hashtags: 10-15 hashtags. The first one must be exactly \"{LEADING_HASHTAG}\".\n\
- keywords: 15-25 search keywords in Korean and English as ONE comma-separated string."
    )
}

pub fn metadata_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "description": {"type": "STRING"},
            "hashtags": {"type": "ARRAY", "items": {"type": "STRING"}},
            "keywords": {"type": "STRING"}
        },
        "required": ["description", "hashtags", "keywords"]
    })
}

/// All three fields are required.
pub fn metadata_from_value(value: &Value) -> Result<VideoMetadata> {
    let description = string_field(value, "description");
    let hashtags = string_list(value, "hashtags");
    let keywords = match value.get("keywords") {
        Some(Value::Array(_)) => Some(string_list(value, "keywords").join(", ")).filter(|k| !k.is_empty()),
        _ => string_field(value, "keywords"),
    };
    match (description, hashtags.is_empty(), keywords) {
        (Some(description), false, Some(keywords)) => Ok(VideoMetadata {
            description,
            hashtags,
            keywords,
        }),
        _ => Err(GenerationError::IncompleteResult("description, hashtags and keywords")),
    }
}

impl GeminiClient {
    pub async fn generate_video_metadata(&self, title: &str, genre: &str) -> Result<VideoMetadata> {
        let value = self
            .generate_structured(metadata_prompt(title, genre), metadata_schema())
            .await?;
        metadata_from_value(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_metadata_is_accepted() {
        let value = json!({
            "description": "Late night jazz.",
            "hashtags": ["#playlist", "#jazz"],
            "keywords": "jazz, night"
        });
        let metadata = metadata_from_value(&value).unwrap();
        assert_eq!(metadata.hashtags[0], LEADING_HASHTAG);
        assert_eq!(metadata.full_description(), "Late night jazz.\n\n#playlist #jazz");
    }

    #[test]
    fn keyword_arrays_are_joined() {
        let value = json!({
            "description": "d",
            "hashtags": "#playlist #lofi",
            "keywords": ["lofi", "study"]
        });
        let metadata = metadata_from_value(&value).unwrap();
        assert_eq!(metadata.keywords, "lofi, study");
        assert_eq!(metadata.hashtags, vec!["#playlist", "#lofi"]);
    }

    #[test]
    fn any_missing_field_is_incomplete() {
        for value in [
            json!({"hashtags": ["#a"], "keywords": "k"}),
            json!({"description": "d", "hashtags": [], "keywords": "k"}),
            json!({"description": "d", "hashtags": ["#a"], "keywords": "  "}),
        ] {
            assert!(matches!(
                metadata_from_value(&value),
                Err(GenerationError::IncompleteResult(_))
            ));
        }
    }
}
