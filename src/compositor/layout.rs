//! Title normalisation, word wrapping and font-size auto-fit.

pub const MAX_TITLE_LINES: usize = 3;
/// Smallest size auto-fit may shrink to, relative to the configured size.
pub const MIN_SIZE_RATIO: f32 = 0.4;
pub const SIZE_STEP_PX: f32 = 2.0;
const ELLIPSIS: char = '…';
const PLAYLIST_MARKER: &str = "playlist";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NormalizedTitle {
    pub main: String,
    /// English keywords after the `|`, drawn as a smaller line above.
    pub keywords: Option<String>,
}

/// Drops a leading `playlist` marker and the emoji/punctuation right after it,
/// then splits on the first `|`.
pub fn normalize_title(raw: &str) -> Option<NormalizedTitle> {
    let mut text = raw.trim();
    let has_marker = text
        .get(..PLAYLIST_MARKER.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(PLAYLIST_MARKER))
        && !text[PLAYLIST_MARKER.len()..]
            .chars()
            .next()
            .is_some_and(char::is_alphanumeric);
    if has_marker {
        text = text[PLAYLIST_MARKER.len()..].trim_start_matches(|c: char| !c.is_alphanumeric() && c != '|');
    }

    let (main, keywords) = match text.split_once('|') {
        Some((left, right)) => (left.trim(), Some(right.trim()).filter(|k| !k.is_empty())),
        None => (text.trim(), None),
    };
    match (main.is_empty(), keywords) {
        (false, keywords) => Some(NormalizedTitle {
            main: main.to_string(),
            keywords: keywords.map(str::to_string),
        }),
        (true, Some(keywords)) => Some(NormalizedTitle {
            main: keywords.to_string(),
            keywords: None,
        }),
        (true, None) => None,
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FontSpec<'a> {
    pub family: &'a str,
    pub size: f32,
    pub bold: bool,
}

impl FontSpec<'_> {
    pub fn with_size(self, size: f32) -> Self {
        Self { size, ..self }
    }
}

pub trait TextMeasure {
    /// Advance width of `text` in pixels.
    fn text_width(&self, text: &str, font: &FontSpec<'_>) -> f32;
}

/// Width estimate from per-character advances: wide (CJK/emoji) glyphs are a
/// full em, spaces a third, everything else a bit over half.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeuristicMeasure;

impl TextMeasure for HeuristicMeasure {
    fn text_width(&self, text: &str, font: &FontSpec<'_>) -> f32 {
        let ems: f32 = text
            .chars()
            .map(|c| {
                if c.is_whitespace() {
                    0.33
                } else if c.len_utf8() >= 3 {
                    1.0
                } else {
                    0.56
                }
            })
            .sum();
        let weight = if font.bold { 1.06 } else { 1.0 };
        ems * font.size * weight
    }
}

/// Greedy word wrap. Words wider than the line are broken by character.
pub fn wrap_text(
    text: &str,
    max_width: f32,
    measure: &dyn TextMeasure,
    font: &FontSpec<'_>,
) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if measure.text_width(&candidate, font) <= max_width {
            current = candidate;
            continue;
        }
        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if measure.text_width(word, font) <= max_width {
            current = word.to_string();
        } else {
            let mut pieces = break_word(word, max_width, measure, font);
            current = pieces.pop().unwrap_or_default();
            lines.extend(pieces);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn break_word(word: &str, max_width: f32, measure: &dyn TextMeasure, font: &FontSpec<'_>) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut piece = String::new();
    for c in word.chars() {
        piece.push(c);
        if piece.chars().count() > 1 && measure.text_width(&piece, font) > max_width {
            piece.pop();
            pieces.push(std::mem::take(&mut piece));
            piece.push(c);
        }
    }
    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}

/// Trims `text` from the end until it fits with a trailing ellipsis.
pub fn ellipsize(text: &str, max_width: f32, measure: &dyn TextMeasure, font: &FontSpec<'_>) -> String {
    if measure.text_width(text, font) <= max_width {
        return text.to_string();
    }
    let mut chars: Vec<char> = text.chars().collect();
    while !chars.is_empty() {
        chars.pop();
        let candidate: String = chars.iter().collect::<String>().trim_end().to_string() + &ELLIPSIS.to_string();
        if measure.text_width(&candidate, font) <= max_width {
            return candidate;
        }
    }
    ELLIPSIS.to_string()
}

#[derive(Clone, Debug, PartialEq)]
pub struct FittedText {
    pub size: f32,
    pub lines: Vec<String>,
}

/// Shrinks the font by `SIZE_STEP_PX` until the text wraps into at most
/// `MAX_TITLE_LINES` lines or the size reaches the floor. At the floor any
/// overflow is folded into an ellipsised last line.
pub fn fit_title(
    text: &str,
    max_width: f32,
    measure: &dyn TextMeasure,
    font: &FontSpec<'_>,
) -> FittedText {
    let floor = font.size * MIN_SIZE_RATIO;
    let mut size = font.size;
    let mut lines = wrap_text(text, max_width, measure, &font.with_size(size));
    while lines.len() > MAX_TITLE_LINES && size > floor {
        size = (size - SIZE_STEP_PX).max(floor);
        lines = wrap_text(text, max_width, measure, &font.with_size(size));
    }

    if lines.len() > MAX_TITLE_LINES {
        let overflow = lines.split_off(MAX_TITLE_LINES - 1).join(" ");
        lines.push(ellipsize(&overflow, max_width, measure, &font.with_size(size)));
    }
    FittedText { size, lines }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every character is exactly `size` pixels wide.
    struct Monospace;

    impl TextMeasure for Monospace {
        fn text_width(&self, text: &str, font: &FontSpec<'_>) -> f32 {
            text.chars().count() as f32 * font.size
        }
    }

    const FONT: FontSpec<'static> = FontSpec {
        family: "sans-serif",
        size: 10.0,
        bold: false,
    };

    #[test]
    fn strips_marker_emoji_and_splits_keywords() {
        let title = normalize_title("playlist ☕️ 이 카페, 음악 맛집이네 | Cafe & Jazz").unwrap();
        assert_eq!(title.main, "이 카페, 음악 맛집이네");
        assert_eq!(title.keywords.as_deref(), Some("Cafe & Jazz"));
    }

    #[test]
    fn leaves_unmarked_titles_alone() {
        let title = normalize_title("🌙 Night Calm").unwrap();
        assert_eq!(title.main, "🌙 Night Calm");
        assert_eq!(title.keywords, None);

        let title = normalize_title("Playlists of summer").unwrap();
        assert_eq!(title.main, "Playlists of summer");
    }

    #[test]
    fn marker_only_or_blank_titles_vanish() {
        assert_eq!(normalize_title("   "), None);
        assert_eq!(normalize_title("playlist 🎧"), None);
        let title = normalize_title("PLAYLIST 🎧 | Vibe & Pop").unwrap();
        assert_eq!(title.main, "Vibe & Pop");
        assert_eq!(title.keywords, None);
    }

    #[test]
    fn wraps_greedily_within_width() {
        let lines = wrap_text("aa bb cc dd", 50.0, &Monospace, &FONT);
        assert_eq!(lines, vec!["aa bb", "cc dd"]);
    }

    #[test]
    fn breaks_words_longer_than_a_line() {
        let lines = wrap_text("abcdefghij", 40.0, &Monospace, &FONT);
        assert_eq!(lines, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn fit_keeps_size_when_text_fits() {
        let fitted = fit_title("short title", 200.0, &Monospace, &FONT);
        assert_eq!(fitted.size, 10.0);
        assert_eq!(fitted.lines, vec!["short title"]);
    }

    #[test]
    fn fit_shrinks_until_three_lines() {
        let text = "one two three four five six seven";
        let fitted = fit_title(text, 100.0, &Monospace, &FONT.with_size(20.0));
        assert!(fitted.lines.len() <= MAX_TITLE_LINES);
        assert!(fitted.size < 20.0);
        assert!(fitted.size >= 20.0 * MIN_SIZE_RATIO);
    }

    #[test]
    fn fit_never_goes_below_floor_and_truncates() {
        let text = "word ".repeat(200);
        for start in [1.0f32, 7.5, 40.0, 333.0] {
            let fitted = fit_title(&text, 60.0, &Monospace, &FONT.with_size(start));
            assert!(fitted.lines.len() <= MAX_TITLE_LINES, "start {start}");
            assert!(fitted.size >= start * MIN_SIZE_RATIO - f32::EPSILON, "start {start}");
            assert!(fitted.lines.last().unwrap().ends_with(ELLIPSIS));
        }
    }

    #[test]
    fn heuristic_counts_wide_glyphs_as_full_em() {
        let font = FONT.with_size(10.0);
        assert_eq!(HeuristicMeasure.text_width("가나", &font), 20.0);
        assert!(HeuristicMeasure.text_width("ab", &font) < 20.0);
    }
}
