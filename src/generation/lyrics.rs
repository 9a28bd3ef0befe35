use serde_json::{Value, json};
use tracing::{info, warn};

use crate::error::{GenerationError, Result};
use crate::gemini::GeminiClient;
use crate::gemini::extract::string_list;
use crate::settings::LyricsSettings;

/// Overused words the lyrics must avoid.
pub const CLICHE_DENYLIST: &[&str] = &[
    "neon",
    "echo",
    "whisper",
    "shadow",
    "tapestry",
    "symphony",
    "ethereal",
    "fleeting",
    "shattered",
    "embrace",
    "eternity",
    "destiny",
];

pub fn language_instruction(settings: &LyricsSettings) -> String {
    let main = settings.main_language().name();
    if !settings.dual_lang() {
        return format!("Write all lyrics in {main}.");
    }
    let secondary = settings.secondary_language().name();
    let ratio = settings.main_ratio();
    format!(
        "Mix two languages: about {ratio}% of the lines in {main} and about {}% in {secondary}. \
Switch languages at natural phrase boundaries, favouring {secondary} for hooks and short refrains.",
        100 - ratio
    )
}

pub fn structure_instruction(settings: &LyricsSettings) -> String {
    let structure = settings.structure();
    let mut verse = 0;
    let mut lines = Vec::with_capacity(structure.sections.len());
    for section in structure.sections {
        let label = match *section {
            "Verse" => {
                verse += 1;
                format!("[Verse {verse}]")
            }
            other => format!("[{other}]"),
        };
        let wordless = settings.instrumental()
            || *section == "Instrumental"
            || (*section == "Intro" && !settings.include_intro())
            || (*section == "Outro" && !settings.include_outro());
        if wordless {
            lines.push(format!("{label} (instrumental, no lyrics)"));
        } else {
            lines.push(label);
        }
    }
    format!(
        "Follow this song structure ({}. {}) exactly, using these section tags in order:\n{}",
        structure.number,
        structure.name,
        lines.join("\n")
    )
}

pub fn lyrics_prompt(title: &str, genre: &str, settings: &LyricsSettings) -> String {
    let count = settings.song_count();
    let body = if settings.instrumental() {
        "These are instrumental tracks: output only the section tags with a short instrumentation cue \
in parentheses under each tag, and no sung lyrics."
            .to_string()
    } else {
        format!(
            "{}\n{}",
            language_instruction(settings),
            settings.metaphor().instruction()
        )
    };
    format!(
        "You are a professional songwriter writing lyrics for Suno AI.\n\
Playlist title: \"{title}\"\nGenre: \"{genre}\"\n\n\
Write {count} complete, distinct song(s) that fit this playlist.\n\
Start each song with its own title line in the form \"Title: ...\".\n\
{body}\n\n{}\n\n\
Never mention real artist names. Never use these words: {}.",
        structure_instruction(settings),
        CLICHE_DENYLIST.join(", ")
    )
}

pub fn lyrics_schema(count: u8) -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "lyrics": {
                "type": "ARRAY",
                "items": {"type": "STRING"},
                "description": format!("Exactly {count} full songs, one string per song.")
            }
        },
        "required": ["lyrics"]
    })
}

impl GeminiClient {
    pub async fn generate_lyrics(
        &self,
        title: &str,
        genre: &str,
        settings: &LyricsSettings,
    ) -> Result<Vec<String>> {
        let value = self
            .generate_structured(
                lyrics_prompt(title, genre, settings),
                lyrics_schema(settings.song_count()),
            )
            .await?;
        let songs = string_list(&value, "lyrics");
        if songs.is_empty() {
            return Err(GenerationError::IncompleteResult("lyrics"));
        }
        if songs.len() != settings.song_count() as usize {
            warn!(
                requested = settings.song_count(),
                received = songs.len(),
                "lyrics count differs from request"
            );
        }
        info!(count = songs.len(), "generated lyrics");
        Ok(songs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Language;

    #[test]
    fn single_language_instruction() {
        let settings = LyricsSettings::default();
        assert_eq!(language_instruction(&settings), "Write all lyrics in Korean.");
    }

    #[test]
    fn dual_language_ratio_is_split() {
        let mut settings = LyricsSettings::default();
        settings.set_dual_lang(true);
        settings.set_secondary_language(Language::Japanese);
        settings.set_main_ratio(60);
        let text = language_instruction(&settings);
        assert!(text.contains("60% of the lines in Korean"));
        assert!(text.contains("40% in Japanese"));
    }

    #[test]
    fn structure_marks_wordless_sections() {
        let settings = LyricsSettings::default();
        let text = structure_instruction(&settings);
        assert!(text.contains("15. Minimal"));
        assert!(text.contains("[Intro] (instrumental, no lyrics)"));
        assert!(text.contains("[Verse 1]\n[Chorus]"));
        assert!(text.contains("[Verse 2]"));
        assert!(text.contains("[Instrumental] (instrumental, no lyrics)"));

        let mut settings = LyricsSettings::default();
        settings.set_include_intro(true);
        let text = structure_instruction(&settings);
        assert!(text.contains("[Intro]\n"));
    }

    #[test]
    fn prompt_carries_denylist_and_count() {
        let mut settings = LyricsSettings::default();
        settings.set_song_count(4);
        let prompt = lyrics_prompt("t", "g", &settings);
        assert!(prompt.contains("Write 4 complete"));
        assert!(prompt.contains("tapestry"));
        assert!(prompt.contains("Never mention real artist names"));
    }

    #[test]
    fn instrumental_prompt_drops_language_instruction() {
        let mut settings = LyricsSettings::default();
        settings.set_instrumental(true);
        let prompt = lyrics_prompt("t", "g", &settings);
        assert!(!prompt.contains("Write all lyrics in"));
        assert!(prompt.contains("instrumental tracks"));
    }
}
