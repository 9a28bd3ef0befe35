//! SVG description of the title overlay, rasterised with resvg on top of the
//! source pixels.

use std::fmt::Write as _;

use resvg::tiny_skia::{IntSize, Pixmap, Transform};

use crate::error::{GenerationError, Result};

/// Gradient starts fully transparent at this fraction of the height.
pub const GRADIENT_START: f32 = 0.4;
pub const GRADIENT_MAX_OPACITY: f32 = 0.75;
const SHADOW_OPACITY: f32 = 0.6;
const LINE_HEIGHT: f32 = 1.2;
const BOTTOM_MARGIN: f32 = 0.07;
pub const KEYWORD_SCALE: f32 = 0.45;

pub struct OverlayText<'a> {
    pub family: &'a str,
    pub bold: bool,
    pub color: &'a str,
    pub size: f32,
    pub lines: &'a [String],
    pub keywords: Option<&'a str>,
}

pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn push_text(svg: &mut String, x: f32, y: f32, size: f32, fill: &str, opacity: f32, attrs: &str, text: &str) {
    let _ = write!(
        svg,
        r#"<text x="{x:.1}" y="{y:.1}" font-size="{size:.1}" fill="{fill}" fill-opacity="{opacity:.2}" text-anchor="middle" {attrs}>{}</text>"#,
        escape_xml(text)
    );
}

/// Builds the overlay document: legibility gradient, optional keyword line,
/// then the title lines stacked bottom-up, each with an offset shadow copy.
pub fn build_svg(width: u32, height: u32, text: &OverlayText<'_>) -> String {
    let w = width as f32;
    let h = height as f32;
    let gradient_top = h * GRADIENT_START;
    let mut svg = String::new();
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
    );
    let _ = write!(
        svg,
        r#"<defs><linearGradient id="legibility" gradientUnits="userSpaceOnUse" x1="0" y1="{gradient_top:.1}" x2="0" y2="{h:.1}"><stop offset="0" stop-color="black" stop-opacity="0"/><stop offset="1" stop-color="black" stop-opacity="{GRADIENT_MAX_OPACITY}"/></linearGradient></defs>"#
    );
    let _ = write!(
        svg,
        r#"<rect x="0" y="{gradient_top:.1}" width="{w:.1}" height="{:.1}" fill="url(#legibility)"/>"#,
        h - gradient_top
    );

    let weight = if text.bold { "700" } else { "400" };
    let family = escape_xml(text.family);
    let attrs = format!(r#"font-family="{family}" font-weight="{weight}""#);
    let center = w / 2.0;
    let shadow = (text.size * 0.04).max(1.0);
    let line_height = text.size * LINE_HEIGHT;
    let last_baseline = h - h * BOTTOM_MARGIN - text.size * 0.2;
    let count = text.lines.len();

    for (idx, line) in text.lines.iter().enumerate() {
        let y = last_baseline - (count - 1 - idx) as f32 * line_height;
        push_text(&mut svg, center + shadow, y + shadow, text.size, "black", SHADOW_OPACITY, &attrs, line);
        push_text(&mut svg, center, y, text.size, text.color, 1.0, &attrs, line);
    }

    if let Some(keywords) = text.keywords {
        let size = (text.size * KEYWORD_SCALE).max(1.0);
        let first_baseline = last_baseline - count.saturating_sub(1) as f32 * line_height;
        let y = first_baseline - text.size - size * 0.4;
        let keyword_attrs = format!(r#"{attrs} letter-spacing="{:.1}""#, size * 0.15);
        let shadow = (size * 0.06).max(1.0);
        push_text(&mut svg, center + shadow, y + shadow, size, "black", SHADOW_OPACITY, &keyword_attrs, keywords);
        push_text(&mut svg, center, y, size, text.color, 0.85, &keyword_attrs, keywords);
    }

    svg.push_str("</svg>");
    svg
}

/// Draws `tree` over straight-alpha RGBA `pixels` and returns straight-alpha RGBA.
pub fn render_over(tree: &usvg::Tree, mut pixels: Vec<u8>, width: u32, height: u32) -> Result<Vec<u8>> {
    for px in pixels.chunks_exact_mut(4) {
        let a = px[3] as u32;
        for c in &mut px[..3] {
            *c = ((*c as u32 * a + 127) / 255) as u8;
        }
    }
    let size = IntSize::from_wh(width, height)
        .ok_or_else(|| GenerationError::image("image has zero size"))?;
    let mut pixmap = Pixmap::from_vec(pixels, size)
        .ok_or_else(|| GenerationError::image("failed to allocate drawing surface"))?;
    resvg::render(tree, Transform::identity(), &mut pixmap.as_mut());

    let mut out = pixmap.take();
    for px in out.chunks_exact_mut(4) {
        let a = px[3] as u32;
        for c in &mut px[..3] {
            *c = if a == 0 {
                0
            } else {
                ((*c as u32 * 255 + a / 2) / a).min(255) as u8
            };
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(escape_xml(r#"R&B <"live">"#), "R&amp;B &lt;&quot;live&quot;&gt;");
    }

    #[test]
    fn svg_stacks_lines_bottom_up_with_shadows() {
        let lines = vec!["first".to_string(), "second".to_string()];
        let svg = build_svg(
            1280,
            720,
            &OverlayText {
                family: "'Jua', sans-serif",
                bold: true,
                color: "#FFCC00",
                size: 72.0,
                lines: &lines,
                keywords: Some("Cafe & Jazz"),
            },
        );
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("linearGradient"));
        assert!(svg.contains(r#"y1="288.0""#));
        assert_eq!(svg.matches(">first</text>").count(), 2);
        assert_eq!(svg.matches(">second</text>").count(), 2);
        assert!(svg.contains("Cafe &amp; Jazz"));
        assert!(svg.contains(r#"font-weight="700""#));
        assert!(svg.find(">first<").unwrap() < svg.find(">second<").unwrap());
    }
}
