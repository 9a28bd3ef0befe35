use serde_json::{Value, json};
use tracing::info;

use crate::error::{GenerationError, Result};
use crate::gemini::GeminiClient;
use crate::gemini::extract::string_list;

pub const TITLE_COUNT: usize = 10;

const EXAMPLE_TITLES: &[&str] = &[
    "playlist 🎧 그냥 틀어놨는데 \"여기 어디야?\" 질문 받는 플리 | Vibe & Pop",
    "playlist ☕️ 이 카페, 음악 맛집이네. 사장님 선곡 훔치기 | Cafe & Jazz",
    "playlist ☁️ 아무것도 안 하고 싶을 때, BGM은 포기 못해 | Cozy & Chill",
    "playlist 🌇 퇴근길 지하철, 잠시 나만의 세상으로 | Sunset & Mood",
    "playlist 🚗 창문 열고 드라이브할 때, 바람이랑 같이 듣는 노래 | Drive & Vibe",
    "playlist 📚 공부... 해야지. 집중력 200% 올려주는 마법 | Focus & Lofi",
    "playlist 🌙 자기 전, 복잡한 생각 비우기 좋은 잔잔한 무드 | Night & Calm",
];

pub fn titles_prompt(genre: &str) -> String {
    let examples = EXAMPLE_TITLES
        .iter()
        .map(|title| format!("- {title}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "Generate {TITLE_COUNT} creative YouTube playlist titles for the musical genre: \"{genre}\".\n\n\
STRICT FORMAT: every title must follow\n\
\"playlist [Emoji] [Creative Korean Sentence] | [English Keyword 1] & [English Keyword 2]\"\n\n\
Reference titles for tone and structure:\n{examples}\n\n\
Requirements:\n\
1. Start with \"playlist\".\n\
2. Follow it with one fitting emoji.\n\
3. The Korean sentence should be catchy, relatable and situational so viewers want to click.\n\
4. End with \"|\" and two English mood/genre keywords joined by \"&\".\n\
5. Every title must fit the genre \"{genre}\"."
    )
}

pub fn titles_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "titles": {
                "type": "ARRAY",
                "items": {"type": "STRING"},
                "description": "A list of 10 creative YouTube playlist titles."
            }
        },
        "required": ["titles"]
    })
}

impl GeminiClient {
    /// Ten candidate playlist titles for `genre`. The title pattern is asked
    /// for in the prompt only.
    pub async fn generate_titles(&self, genre: &str) -> Result<Vec<String>> {
        let value = self
            .generate_structured(titles_prompt(genre), titles_schema())
            .await?;
        let titles = string_list(&value, "titles");
        if titles.is_empty() {
            return Err(GenerationError::IncompleteResult("titles"));
        }
        info!(genre, count = titles.len(), "generated playlist titles");
        Ok(titles)
    }
}
