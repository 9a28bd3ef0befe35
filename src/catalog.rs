//! Static option tables shown in the wizard.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Serialize)]
pub struct Genre {
    pub id: &'static str,
    pub name: &'static str,
    pub icon: &'static str,
}

pub const GENRES: &[Genre] = &[
    Genre { id: "lofi", name: "Lo-fi", icon: "bedtime" },
    Genre { id: "pop", name: "Pop", icon: "celebration" },
    Genre { id: "jazz", name: "Jazz", icon: "nightlife" },
    Genre { id: "rnb", name: "R&B", icon: "wine_bar" },
    Genre { id: "kpop", name: "K-Pop", icon: "star" },
    Genre { id: "indie", name: "Indie", icon: "park" },
    Genre { id: "study", name: "Study / Focus", icon: "menu_book" },
    Genre { id: "workout", name: "Workout", icon: "fitness_center" },
    Genre { id: "meditation", name: "Meditation", icon: "self_improvement" },
    Genre { id: "acoustic", name: "Acoustic", icon: "piano" },
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Korean,
    English,
    Japanese,
    Spanish,
    French,
}

impl Language {
    pub const ALL: [Language; 5] = [
        Language::Korean,
        Language::English,
        Language::Japanese,
        Language::Spanish,
        Language::French,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Language::Korean => "Korean",
            Language::English => "English",
            Language::Japanese => "Japanese",
            Language::Spanish => "Spanish",
            Language::French => "French",
        }
    }

    /// First language in catalog order that is not `self`.
    pub fn first_other(self) -> Language {
        Language::ALL
            .into_iter()
            .find(|lang| *lang != self)
            .unwrap_or(Language::English)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetaphorLevel {
    Literal,
    #[default]
    Moderate,
    Poetic,
    Abstract,
}

impl MetaphorLevel {
    pub const ALL: [MetaphorLevel; 4] = [
        MetaphorLevel::Literal,
        MetaphorLevel::Moderate,
        MetaphorLevel::Poetic,
        MetaphorLevel::Abstract,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MetaphorLevel::Literal => "Literal",
            MetaphorLevel::Moderate => "Moderate",
            MetaphorLevel::Poetic => "Poetic",
            MetaphorLevel::Abstract => "Abstract",
        }
    }

    pub fn instruction(self) -> &'static str {
        match self {
            MetaphorLevel::Literal => {
                "Use clear, direct language. Say things plainly with almost no metaphor."
            }
            MetaphorLevel::Moderate => {
                "Balance direct statements with a few fresh, concrete images."
            }
            MetaphorLevel::Poetic => {
                "Lean on emotional imagery and metaphor while keeping the story easy to follow."
            }
            MetaphorLevel::Abstract => {
                "Write in an artistic, layered, abstract style with dense symbolism."
            }
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize)]
pub struct SongStructure {
    pub number: u8,
    pub name: &'static str,
    pub sections: &'static [&'static str],
}

pub const DEFAULT_STRUCTURE: u8 = 15;

pub const SONG_STRUCTURES: &[SongStructure] = &[
    SongStructure {
        number: 1,
        name: "Standard Pop",
        sections: &["Intro", "Verse", "Pre-Chorus", "Chorus", "Verse", "Pre-Chorus", "Chorus", "Bridge", "Chorus", "Outro"],
    },
    SongStructure {
        number: 2,
        name: "Verse-Chorus",
        sections: &["Verse", "Chorus", "Verse", "Chorus", "Chorus"],
    },
    SongStructure {
        number: 3,
        name: "AABA",
        sections: &["Verse", "Verse", "Bridge", "Verse"],
    },
    SongStructure {
        number: 4,
        name: "Hook First",
        sections: &["Chorus", "Verse", "Chorus", "Verse", "Chorus", "Outro"],
    },
    SongStructure {
        number: 5,
        name: "Ballad",
        sections: &["Intro", "Verse", "Verse", "Chorus", "Verse", "Chorus", "Bridge", "Chorus", "Outro"],
    },
    SongStructure {
        number: 6,
        name: "Build and Drop",
        sections: &["Intro", "Verse", "Build-Up", "Drop", "Verse", "Build-Up", "Drop", "Outro"],
    },
    SongStructure {
        number: 7,
        name: "Hip-Hop",
        sections: &["Intro", "Hook", "Verse", "Hook", "Verse", "Hook", "Outro"],
    },
    SongStructure {
        number: 8,
        name: "Folk Storytelling",
        sections: &["Verse", "Verse", "Chorus", "Verse", "Verse", "Chorus"],
    },
    SongStructure {
        number: 9,
        name: "Post-Chorus",
        sections: &["Intro", "Verse", "Chorus", "Post-Chorus", "Verse", "Chorus", "Post-Chorus", "Outro"],
    },
    SongStructure {
        number: 10,
        name: "Double Chorus",
        sections: &["Verse", "Pre-Chorus", "Chorus", "Chorus", "Verse", "Pre-Chorus", "Chorus", "Chorus"],
    },
    SongStructure {
        number: 11,
        name: "Breakdown",
        sections: &["Intro", "Verse", "Chorus", "Verse", "Chorus", "Breakdown", "Chorus", "Outro"],
    },
    SongStructure {
        number: 12,
        name: "Through-Composed",
        sections: &["Intro", "Verse", "Verse", "Verse", "Outro"],
    },
    SongStructure {
        number: 13,
        name: "Short Form",
        sections: &["Verse", "Chorus", "Outro"],
    },
    SongStructure {
        number: 14,
        name: "Extended Bridge",
        sections: &["Intro", "Verse", "Chorus", "Verse", "Chorus", "Bridge", "Bridge", "Chorus", "Chorus", "Outro"],
    },
    SongStructure {
        number: 15,
        name: "Minimal",
        sections: &["Intro", "Verse", "Chorus", "Instrumental", "Verse", "Chorus", "Outro"],
    },
];

pub fn song_structure(number: u8) -> Option<&'static SongStructure> {
    SONG_STRUCTURES.iter().find(|s| s.number == number)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageStyle {
    #[default]
    Cinematic,
    Anime,
    Watercolor,
    FilmPhoto,
    Illustration,
    Minimal,
    Vaporwave,
    Cyberpunk,
}

impl ImageStyle {
    pub const ALL: [ImageStyle; 8] = [
        ImageStyle::Cinematic,
        ImageStyle::Anime,
        ImageStyle::Watercolor,
        ImageStyle::FilmPhoto,
        ImageStyle::Illustration,
        ImageStyle::Minimal,
        ImageStyle::Vaporwave,
        ImageStyle::Cyberpunk,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ImageStyle::Cinematic => "Cinematic",
            ImageStyle::Anime => "Anime",
            ImageStyle::Watercolor => "Watercolor",
            ImageStyle::FilmPhoto => "Film Photo",
            ImageStyle::Illustration => "Illustration",
            ImageStyle::Minimal => "Minimal",
            ImageStyle::Vaporwave => "Vaporwave",
            ImageStyle::Cyberpunk => "Cyberpunk",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ImageStyle::Cinematic => "cinematic photography, dramatic lighting, shallow depth of field, 35mm lens",
            ImageStyle::Anime => "modern Japanese anime illustration, soft cel shading, detailed background art",
            ImageStyle::Watercolor => "soft watercolor painting, bleeding pigments, textured paper",
            ImageStyle::FilmPhoto => "analog film photograph, natural grain, faded warm tones",
            ImageStyle::Illustration => "flat editorial illustration, bold shapes, limited palette",
            ImageStyle::Minimal => "minimalist composition, generous negative space, muted colors",
            ImageStyle::Vaporwave => "vaporwave aesthetic, pastel neon gradients, retro 90s computer graphics",
            ImageStyle::Cyberpunk => "cyberpunk night city, rain-soaked streets, saturated magenta and cyan lights",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontChoice {
    #[default]
    NotoSansKr,
    BlackHanSans,
    DoHyeon,
    Jua,
    NanumMyeongjo,
    NanumPenScript,
}

impl FontChoice {
    pub const ALL: [FontChoice; 6] = [
        FontChoice::NotoSansKr,
        FontChoice::BlackHanSans,
        FontChoice::DoHyeon,
        FontChoice::Jua,
        FontChoice::NanumMyeongjo,
        FontChoice::NanumPenScript,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FontChoice::NotoSansKr => "Noto Sans KR",
            FontChoice::BlackHanSans => "Black Han Sans",
            FontChoice::DoHyeon => "Do Hyeon",
            FontChoice::Jua => "Jua",
            FontChoice::NanumMyeongjo => "Nanum Myeongjo",
            FontChoice::NanumPenScript => "Nanum Pen Script",
        }
    }

    /// Font family stack usable in an SVG/CSS `font-family` attribute.
    pub fn family(self) -> &'static str {
        match self {
            FontChoice::NotoSansKr => "'Noto Sans KR', 'Noto Sans CJK KR', sans-serif",
            FontChoice::BlackHanSans => "'Black Han Sans', 'Noto Sans CJK KR', sans-serif",
            FontChoice::DoHyeon => "'Do Hyeon', 'Noto Sans CJK KR', sans-serif",
            FontChoice::Jua => "'Jua', 'Noto Sans CJK KR', sans-serif",
            FontChoice::NanumMyeongjo => "'Nanum Myeongjo', 'Noto Serif CJK KR', serif",
            FontChoice::NanumPenScript => "'Nanum Pen Script', 'Noto Sans CJK KR', cursive",
        }
    }
}
