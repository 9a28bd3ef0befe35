use tracing::{info, warn};

use crate::catalog::ImageStyle;
use crate::error::{GenerationError, Result};
use crate::gemini::GeminiClient;
use crate::gemini::wire::{GenerateContentRequest, GenerateContentResponse, RequestPart};
use crate::image_processing::RasterImage;
use crate::persona::PersonaImage;

pub const THUMBNAIL_ASPECT_RATIO: &str = "16:9";
pub const THUMBNAIL_IMAGE_SIZE: &str = "2K";

/// A request to rework the current thumbnail rather than start over.
#[derive(Clone, Copy, Debug)]
pub struct ThumbnailRevision<'a> {
    /// Prompt that produced the current thumbnail, when there is one.
    pub previous_prompt: Option<&'a str>,
    pub feedback: &'a str,
}

impl<'a> ThumbnailRevision<'a> {
    /// None when `feedback` is blank.
    pub fn new(feedback: &'a str, previous_prompt: Option<&'a str>) -> Option<Self> {
        let feedback = feedback.trim();
        if feedback.is_empty() {
            return None;
        }
        Some(Self {
            previous_prompt: previous_prompt.map(str::trim).filter(|p| !p.is_empty()),
            feedback,
        })
    }
}

pub fn thumbnail_prompt_instruction(
    title: &str,
    genre: &str,
    style: ImageStyle,
    has_persona: bool,
    revision: Option<ThumbnailRevision<'_>>,
) -> String {
    let mut text = format!(
        "You write prompts for an image generation model that creates YouTube thumbnails for music playlists.\n\
Playlist title: \"{title}\"\nGenre: \"{genre}\"\nVisual style: {} ({})\n\n\
Write ONE detailed English image prompt for a 16:9 thumbnail that captures the mood of the title. \
Describe subject, setting, lighting, color palette, camera angle and composition. \
Leave calm space in the lower third for a title overlay. \
The image itself must contain no text, letters, logos or watermarks.",
        style.label(),
        style.description()
    );
    if has_persona {
        text.push_str(
            "\n\nA reference photo of the main character is attached. The prompt must instruct the image model \
to keep this exact person's identity: same face shape, facial features, hairstyle and skin tone. \
Refer to them as \"the person in the reference image\" and do not describe a different person.",
        );
    }
    if let Some(revision) = revision {
        text.push_str("\n\nThis is a REVISION of a previous thumbnail.");
        if let Some(previous) = revision.previous_prompt {
            text.push_str(&format!(
                " The previous thumbnail was generated from this prompt:\n\"\"\"\n{previous}\n\"\"\"\n\
Start from that prompt."
            ));
        }
        text.push_str(&format!(
            " Keep the previous composition, subject placement and overall style, \
and change only what this feedback asks for: \"{}\"",
            revision.feedback
        ));
    }
    text.push_str("\n\nReturn only the prompt text, without any preamble.");
    text
}

/// First inline image in the response, or a `data:` URL carried in a text part.
///
/// Text that is not an image comes back as the `NoImageData` detail.
pub fn extract_image(response: &GenerateContentResponse) -> Result<RasterImage> {
    let mut text_detail = None;
    for part in response.parts() {
        if let Some(inline) = &part.inline_data {
            if let Some(data) = inline.data.as_deref().filter(|d| !d.trim().is_empty()) {
                let mime = inline.mime_type.as_deref().unwrap_or("image/png");
                return RasterImage::from_base64(mime, data);
            }
        }
        if let Some(text) = part.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            if let Some(image) = RasterImage::from_data_url(text) {
                return Ok(image);
            }
            text_detail.get_or_insert_with(|| text.to_string());
        }
    }
    Err(GenerationError::NoImageData(text_detail))
}

fn with_persona(mut parts: Vec<RequestPart>, persona: Option<&PersonaImage>) -> Vec<RequestPart> {
    if let Some(persona) = persona {
        parts.push(RequestPart::inline(persona.mime_type(), persona.base64_data()));
    }
    parts
}

impl GeminiClient {
    /// A single free-text image prompt for the thumbnail.
    pub async fn generate_thumbnail_prompt(
        &self,
        title: &str,
        genre: &str,
        style: ImageStyle,
        persona: Option<&PersonaImage>,
        revision: Option<ThumbnailRevision<'_>>,
    ) -> Result<String> {
        let instruction =
            thumbnail_prompt_instruction(title, genre, style, persona.is_some(), revision);
        let request = GenerateContentRequest::new(with_persona(vec![RequestPart::text(instruction)], persona));
        let response = self.generate_content(&self.text_model, &request).await?;
        if response.first_content().is_none() {
            return Err(GenerationError::MalformedResponse);
        }
        let prompt = response
            .parts()
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect::<Vec<_>>()
            .join("")
            .trim()
            .to_string();
        if prompt.is_empty() {
            return Err(GenerationError::IncompleteResult("a thumbnail prompt"));
        }
        Ok(prompt)
    }

    /// Renders the thumbnail with the primary image model, retrying once on the
    /// fallback model when the primary answers 404 or 400.
    pub async fn generate_thumbnail_image(
        &self,
        prompt: &str,
        persona: Option<&PersonaImage>,
    ) -> Result<RasterImage> {
        let request = GenerateContentRequest::new(with_persona(vec![RequestPart::text(prompt)], persona))
            .with_image_config(THUMBNAIL_ASPECT_RATIO, THUMBNAIL_IMAGE_SIZE);

        let response = match self.generate_content(&self.image_model, &request).await {
            Err(GenerationError::RequestFailed { status: 400 | 404, message })
                if self.image_model != self.fallback_image_model =>
            {
                warn!(
                    primary = %self.image_model,
                    fallback = %self.fallback_image_model,
                    %message,
                    "primary image model unavailable, falling back"
                );
                self.generate_content(&self.fallback_image_model, &request).await?
            }
            other => other?,
        };
        if response.first_content().is_none() {
            return Err(GenerationError::MalformedResponse);
        }
        let image = extract_image(&response)?;
        info!(mime = %image.mime_type, bytes = image.bytes.len(), "generated thumbnail image");
        Ok(image)
    }
}
