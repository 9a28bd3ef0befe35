use serde::{Deserialize, Serialize};

use crate::catalog::{
    DEFAULT_STRUCTURE, FontChoice, ImageStyle, Language, MetaphorLevel, SongStructure,
    song_structure,
};

pub const MIN_SONG_COUNT: u8 = 1;
pub const MAX_SONG_COUNT: u8 = 20;
pub const MIN_MAIN_RATIO: u8 = 10;
pub const MAX_MAIN_RATIO: u8 = 90;
pub const MIN_FONT_SIZE_PCT: u8 = 5;
pub const MAX_FONT_SIZE_PCT: u8 = 15;
const DEFAULT_FONT_COLOR: &str = "#FFFFFF";

/// Lyrics generation options. Fields are private so the dual-language
/// invariant (`secondary != main` while dual mode is on) cannot be bypassed.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LyricsSettings {
    main_language: Language,
    dual_lang: bool,
    secondary_language: Language,
    main_ratio: u8,
    song_count: u8,
    metaphor: MetaphorLevel,
    structure: u8,
    include_intro: bool,
    include_outro: bool,
    instrumental: bool,
}

impl Default for LyricsSettings {
    fn default() -> Self {
        Self {
            main_language: Language::Korean,
            dual_lang: false,
            secondary_language: Language::English,
            main_ratio: 70,
            song_count: 1,
            metaphor: MetaphorLevel::Moderate,
            structure: DEFAULT_STRUCTURE,
            include_intro: false,
            include_outro: false,
            instrumental: false,
        }
    }
}

/// Partial update sent by the settings form; absent fields are left alone.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LyricsSettingsPatch {
    pub main_language: Option<Language>,
    pub dual_lang: Option<bool>,
    pub secondary_language: Option<Language>,
    pub main_ratio: Option<u8>,
    pub song_count: Option<u8>,
    pub metaphor: Option<MetaphorLevel>,
    pub structure: Option<u8>,
    pub include_intro: Option<bool>,
    pub include_outro: Option<bool>,
    pub instrumental: Option<bool>,
}

impl LyricsSettings {
    pub fn main_language(&self) -> Language {
        self.main_language
    }

    pub fn dual_lang(&self) -> bool {
        self.dual_lang
    }

    pub fn secondary_language(&self) -> Language {
        self.secondary_language
    }

    pub fn main_ratio(&self) -> u8 {
        self.main_ratio
    }

    pub fn song_count(&self) -> u8 {
        self.song_count
    }

    pub fn metaphor(&self) -> MetaphorLevel {
        self.metaphor
    }

    pub fn structure(&self) -> &'static SongStructure {
        song_structure(self.structure)
            .or_else(|| song_structure(DEFAULT_STRUCTURE))
            .unwrap_or(&crate::catalog::SONG_STRUCTURES[0])
    }

    pub fn include_intro(&self) -> bool {
        self.include_intro
    }

    pub fn include_outro(&self) -> bool {
        self.include_outro
    }

    pub fn instrumental(&self) -> bool {
        self.instrumental
    }

    pub fn set_main_language(&mut self, language: Language) {
        self.main_language = language;
        if self.secondary_language == language {
            self.secondary_language = language.first_other();
        }
    }

    pub fn set_dual_lang(&mut self, enabled: bool) {
        self.dual_lang = enabled;
        if enabled && self.secondary_language == self.main_language {
            self.secondary_language = self.main_language.first_other();
        }
    }

    /// Ignored when it would equal the main language.
    pub fn set_secondary_language(&mut self, language: Language) -> bool {
        if language == self.main_language {
            return false;
        }
        self.secondary_language = language;
        true
    }

    /// Clamped to 10..=90 and snapped to the nearest 10.
    pub fn set_main_ratio(&mut self, ratio: u8) {
        let clamped = ratio.clamp(MIN_MAIN_RATIO, MAX_MAIN_RATIO);
        self.main_ratio = ((clamped + 5) / 10 * 10).min(MAX_MAIN_RATIO);
    }

    pub fn set_song_count(&mut self, count: u8) {
        self.song_count = count.clamp(MIN_SONG_COUNT, MAX_SONG_COUNT);
    }

    pub fn set_metaphor(&mut self, metaphor: MetaphorLevel) {
        self.metaphor = metaphor;
    }

    pub fn set_structure(&mut self, number: u8) -> bool {
        if song_structure(number).is_none() {
            return false;
        }
        self.structure = number;
        true
    }

    pub fn set_include_intro(&mut self, value: bool) {
        self.include_intro = value;
    }

    pub fn set_include_outro(&mut self, value: bool) {
        self.include_outro = value;
    }

    pub fn set_instrumental(&mut self, value: bool) {
        self.instrumental = value;
    }

    pub fn apply(&mut self, patch: LyricsSettingsPatch) {
        // Main language first so a secondary in the same patch is checked against it.
        if let Some(language) = patch.main_language {
            self.set_main_language(language);
        }
        if let Some(language) = patch.secondary_language {
            self.set_secondary_language(language);
        }
        if let Some(enabled) = patch.dual_lang {
            self.set_dual_lang(enabled);
        }
        if let Some(ratio) = patch.main_ratio {
            self.set_main_ratio(ratio);
        }
        if let Some(count) = patch.song_count {
            self.set_song_count(count);
        }
        if let Some(metaphor) = patch.metaphor {
            self.set_metaphor(metaphor);
        }
        if let Some(number) = patch.structure {
            self.set_structure(number);
        }
        if let Some(value) = patch.include_intro {
            self.set_include_intro(value);
        }
        if let Some(value) = patch.include_outro {
            self.set_include_outro(value);
        }
        if let Some(value) = patch.instrumental {
            self.set_instrumental(value);
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThumbnailSettings {
    pub style: ImageStyle,
    pub include_title: bool,
    pub title: String,
    pub font: FontChoice,
    pub font_size_pct: u8,
    pub font_color: String,
    pub bold: bool,
}

impl ThumbnailSettings {
    pub fn for_title(title: &str) -> Self {
        Self {
            style: ImageStyle::default(),
            include_title: true,
            title: title.to_string(),
            font: FontChoice::default(),
            font_size_pct: 10,
            font_color: DEFAULT_FONT_COLOR.to_string(),
            bold: true,
        }
    }

    /// Clamps the font size and canonicalises the colour to `#RRGGBB`.
    pub fn normalized(mut self) -> Self {
        self.font_size_pct = self.font_size_pct.clamp(MIN_FONT_SIZE_PCT, MAX_FONT_SIZE_PCT);
        self.font_color =
            normalize_hex_color(&self.font_color).unwrap_or_else(|| DEFAULT_FONT_COLOR.to_string());
        self
    }

    /// The title that will actually be drawn, if any.
    pub fn overlay_title(&self) -> Option<&str> {
        let trimmed = self.title.trim();
        (self.include_title && !trimmed.is_empty()).then_some(trimmed)
    }
}

pub fn normalize_hex_color(raw: &str) -> Option<String> {
    let hex = raw.trim().trim_start_matches('#');
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        6 => Some(format!("#{}", hex.to_ascii_uppercase())),
        3 => {
            let expanded: String = hex.chars().flat_map(|c| [c, c]).collect();
            Some(format!("#{}", expanded.to_ascii_uppercase()))
        }
        _ => None,
    }
}
