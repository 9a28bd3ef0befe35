use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::compositor::{Compositor, OutputFormat};
use crate::error::{GenerationError, Result};
use crate::image_processing::RasterImage;
use crate::settings::ThumbnailSettings;

pub const RECOMPOSE_DEBOUNCE: Duration = Duration::from_millis(300);

/// A generated thumbnail and its current text composite.
///
/// `original` is only replaced by a new generation; every edit re-derives
/// `composite` from it.
#[derive(Clone, Debug, PartialEq)]
pub struct GeneratedThumbnail {
    original: RasterImage,
    composite: RasterImage,
    settings: ThumbnailSettings,
    pub prompt: String,
    pub generated_at: DateTime<Utc>,
}

impl GeneratedThumbnail {
    pub fn original(&self) -> &RasterImage {
        &self.original
    }

    pub fn composite(&self) -> &RasterImage {
        &self.composite
    }

    /// Settings that produced `composite`.
    pub fn settings(&self) -> &ThumbnailSettings {
        &self.settings
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditOutcome {
    Applied,
    /// A newer edit arrived during the debounce window.
    Superseded,
    /// Compositing failed; the previous preview stays.
    KeptPrevious,
    NoThumbnail,
}

/// Owns the session's thumbnail and debounces recompositing.
#[derive(Clone)]
pub struct ThumbnailEditor {
    compositor: Arc<Compositor>,
    format: OutputFormat,
    current: Arc<Mutex<Option<GeneratedThumbnail>>>,
    edit_seq: Arc<AtomicU64>,
}

impl ThumbnailEditor {
    pub fn new(compositor: Arc<Compositor>, format: OutputFormat) -> Self {
        Self {
            compositor,
            format,
            current: Arc::new(Mutex::new(None)),
            edit_seq: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn snapshot(&self) -> Option<GeneratedThumbnail> {
        self.current.lock().ok().and_then(|slot| slot.clone())
    }

    pub fn clear(&self) {
        self.edit_seq.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut slot) = self.current.lock() {
            *slot = None;
        }
    }

    async fn compose(&self, original: &RasterImage, settings: &ThumbnailSettings) -> Result<RasterImage> {
        let compositor = self.compositor.clone();
        let original = original.clone();
        let settings = settings.clone();
        let format = self.format;
        tokio::task::spawn_blocking(move || compositor.compose(&original, &settings, format))
            .await
            .map_err(|err| GenerationError::image(format!("compositing task failed: {err}")))?
    }

    /// Stores a freshly generated image as the new original and composites it
    /// right away.
    pub async fn install(
        &self,
        original: RasterImage,
        prompt: String,
        settings: ThumbnailSettings,
    ) -> GeneratedThumbnail {
        self.edit_seq.fetch_add(1, Ordering::SeqCst);
        let settings = settings.normalized();
        let composite = match self.compose(&original, &settings).await {
            Ok(composite) => composite,
            Err(err) => {
                warn!(error = %err, "initial thumbnail composite failed, showing raw image");
                original.clone()
            }
        };
        let thumbnail = GeneratedThumbnail {
            original,
            composite,
            settings,
            prompt,
            generated_at: Utc::now(),
        };
        if let Ok(mut slot) = self.current.lock() {
            *slot = Some(thumbnail.clone());
        }
        thumbnail
    }

    /// Applies a settings edit. Switching the title off takes effect at once;
    /// anything else is recomposited after `RECOMPOSE_DEBOUNCE` unless a newer
    /// edit arrives first.
    pub async fn apply_settings(&self, settings: ThumbnailSettings) -> EditOutcome {
        let settings = settings.normalized();
        let seq = self.edit_seq.fetch_add(1, Ordering::SeqCst) + 1;

        if settings.overlay_title().is_none() {
            let Ok(mut slot) = self.current.lock() else {
                return EditOutcome::KeptPrevious;
            };
            let Some(thumbnail) = slot.as_mut() else {
                return EditOutcome::NoThumbnail;
            };
            thumbnail.composite = thumbnail.original.clone();
            thumbnail.settings = settings;
            return EditOutcome::Applied;
        }

        if self.snapshot().is_none() {
            return EditOutcome::NoThumbnail;
        }
        tokio::time::sleep(RECOMPOSE_DEBOUNCE).await;
        if self.edit_seq.load(Ordering::SeqCst) != seq {
            debug!(seq, "thumbnail edit superseded");
            return EditOutcome::Superseded;
        }
        let Some(original) = self.snapshot().map(|t| t.original) else {
            return EditOutcome::NoThumbnail;
        };

        match self.compose(&original, &settings).await {
            Ok(composite) => {
                let Ok(mut slot) = self.current.lock() else {
                    return EditOutcome::KeptPrevious;
                };
                if self.edit_seq.load(Ordering::SeqCst) != seq {
                    return EditOutcome::Superseded;
                }
                match slot.as_mut() {
                    Some(thumbnail) if thumbnail.original == original => {
                        thumbnail.composite = composite;
                        thumbnail.settings = settings;
                        EditOutcome::Applied
                    }
                    _ => EditOutcome::Superseded,
                }
            }
            Err(err) => {
                warn!(error = %err, "thumbnail recomposite failed, keeping previous preview");
                EditOutcome::KeptPrevious
            }
        }
    }
}
