pub mod layout;
pub mod overlay;

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;
use usvg::fontdb::Database;

use crate::error::{GenerationError, Result};
use crate::image_processing::{self, JPEG_QUALITY, RasterImage};
use crate::settings::ThumbnailSettings;
use layout::{FontSpec, HeuristicMeasure, TextMeasure, ellipsize, fit_title, normalize_title};
use overlay::{KEYWORD_SCALE, OverlayText, build_svg, escape_xml, render_over};

/// Fraction of the width kept free on each side of the title.
const SIDE_MARGIN: f32 = 0.08;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Lossless.
    #[default]
    Png,
    Jpeg,
}

/// Draws thumbnail titles onto generated images.
///
/// Always works from the image it is handed; callers keep the original so
/// edits never stack on a previous composite.
pub struct Compositor {
    fontdb: Arc<Database>,
}

impl Compositor {
    /// System fonts plus any fonts found in `extra_font_dir`.
    pub fn new(extra_font_dir: Option<&Path>) -> Self {
        let mut db = Database::new();
        db.load_system_fonts();
        if let Some(dir) = extra_font_dir.filter(|dir| dir.is_dir()) {
            db.load_fonts_dir(dir);
        }
        debug!(faces = db.len(), "font database loaded");
        Self { fontdb: Arc::new(db) }
    }

    /// No fonts at all; measurement falls back to the heuristic and text
    /// draws nothing. Useful for tests that only care about geometry.
    pub fn without_fonts() -> Self {
        Self {
            fontdb: Arc::new(Database::new()),
        }
    }

    fn options(&self) -> usvg::Options<'static> {
        let mut options = usvg::Options::default();
        options.fontdb = self.fontdb.clone();
        options
    }

    /// Composites the title described by `settings` onto `original`.
    ///
    /// With no title to draw the original bytes are returned untouched.
    pub fn compose(
        &self,
        original: &RasterImage,
        settings: &ThumbnailSettings,
        format: OutputFormat,
    ) -> Result<RasterImage> {
        let Some(title) = settings.overlay_title().and_then(normalize_title) else {
            return Ok(original.clone());
        };

        let (pixels, width, height) = image_processing::decode_image(&original.bytes, &original.mime_type)?;
        let font = FontSpec {
            family: settings.font.family(),
            size: height as f32 * settings.font_size_pct as f32 / 100.0,
            bold: settings.bold,
        };
        let max_width = width as f32 * (1.0 - 2.0 * SIDE_MARGIN);
        let fitted = fit_title(&title.main, max_width, self, &font);
        let keywords = title.keywords.as_deref().map(|keywords| {
            let size = fitted.size * KEYWORD_SCALE;
            ellipsize(keywords, max_width, self, &font.with_size(size))
        });
        debug!(
            width,
            height,
            size = fitted.size,
            lines = fitted.lines.len(),
            "compositing thumbnail title"
        );

        let svg = build_svg(
            width,
            height,
            &OverlayText {
                family: font.family,
                bold: font.bold,
                color: &settings.font_color,
                size: fitted.size,
                lines: &fitted.lines,
                keywords: keywords.as_deref(),
            },
        );
        let tree = usvg::Tree::from_str(&svg, &self.options())
            .map_err(|err| GenerationError::image(format!("overlay svg rejected: {err}")))?;
        let composited = render_over(&tree, pixels, width, height)?;

        match format {
            OutputFormat::Png => Ok(RasterImage::new(
                "image/png",
                image_processing::encode_png(composited, width, height)?,
            )),
            OutputFormat::Jpeg => Ok(RasterImage::new(
                "image/jpeg",
                image_processing::encode_jpeg(composited, width, height, JPEG_QUALITY)?,
            )),
        }
    }
}

impl TextMeasure for Compositor {
    /// Shapes `text` with the loaded fonts; falls back to the heuristic when
    /// no face can render it.
    fn text_width(&self, text: &str, font: &FontSpec<'_>) -> f32 {
        if text.trim().is_empty() {
            return HeuristicMeasure.text_width(text, font);
        }
        let svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"><text x="0" y="{size:.1}" font-family="{family}" font-size="{size:.1}" font-weight="{weight}">{text}</text></svg>"#,
            size = font.size,
            family = escape_xml(font.family),
            weight = if font.bold { "700" } else { "400" },
            text = escape_xml(text),
        );
        match usvg::Tree::from_str(&svg, &self.options()) {
            Ok(tree) if tree.root().has_children() => {
                let width = tree.root().abs_bounding_box().width();
                if width > 0.0 {
                    width
                } else {
                    HeuristicMeasure.text_width(text, font)
                }
            }
            _ => HeuristicMeasure.text_width(text, font),
        }
    }
}
