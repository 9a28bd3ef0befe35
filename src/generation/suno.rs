use serde_json::{Value, json};
use tracing::{info, warn};

use crate::error::{GenerationError, Result};
use crate::gemini::GeminiClient;
use crate::gemini::extract::string_list;

pub const SUNO_PROMPT_COUNT: usize = 3;
/// Suno's style field limit; requested, not enforced.
pub const SUNO_PROMPT_MAX_CHARS: usize = 900;

pub fn suno_prompt(title: &str, genre: &str) -> String {
    format!(
        "You are an expert music producer writing style prompts for Suno v5 Custom Mode.\n\
Playlist title: \"{title}\"\nGenre: \"{genre}\"\n\n\
Write exactly {SUNO_PROMPT_COUNT} style prompts for songs that belong on this playlist.\n\
Rules:\n\
1. All {SUNO_PROMPT_COUNT} prompts must share identical mood, genre and tempo (BPM) tags so the playlist feels cohesive.\n\
2. Vary only the instrumentation, texture and arrangement between prompts.\n\
3. Write each prompt in English as comma-separated descriptors.\n\
4. Never mention real artist names.\n\
5. Each prompt must stay under {SUNO_PROMPT_MAX_CHARS} characters."
    )
}

pub fn suno_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "prompts": {
                "type": "ARRAY",
                "items": {"type": "STRING"},
                "description": "Exactly 3 Suno style prompts."
            }
        },
        "required": ["prompts"]
    })
}

impl GeminiClient {
    pub async fn generate_suno_prompts(&self, title: &str, genre: &str) -> Result<Vec<String>> {
        let value = self
            .generate_structured(suno_prompt(title, genre), suno_schema())
            .await?;
        let prompts = string_list(&value, "prompts");
        if prompts.is_empty() {
            return Err(GenerationError::IncompleteResult("prompts"));
        }
        if prompts.iter().any(|p| p.chars().count() >= SUNO_PROMPT_MAX_CHARS) {
            warn!("a Suno prompt exceeds {SUNO_PROMPT_MAX_CHARS} characters");
        }
        info!(count = prompts.len(), "generated Suno prompts");
        Ok(prompts)
    }
}
