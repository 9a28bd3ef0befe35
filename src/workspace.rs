use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::GenerationError;
use crate::generation::VideoMetadata;

/// Ticket for one in-flight request against a [`Section`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestToken(u64);

/// Loading flag, last error and last result of one workspace step.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Section<T> {
    loading: bool,
    error: Option<String>,
    retryable: bool,
    result: Option<T>,
    #[serde(skip)]
    token: u64,
}

impl<T> Default for Section<T> {
    fn default() -> Self {
        Self {
            loading: false,
            error: None,
            retryable: false,
            result: None,
            token: 0,
        }
    }
}

impl<T> Section<T> {
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn result(&self) -> Option<&T> {
        self.result.as_ref()
    }

    /// Starts a request, or returns `None` if one is already running.
    pub fn begin(&mut self) -> Option<RequestToken> {
        if self.loading {
            return None;
        }
        self.token += 1;
        self.loading = true;
        self.error = None;
        self.retryable = false;
        Some(RequestToken(self.token))
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        self.loading && token.0 == self.token
    }

    /// Records the outcome of the request identified by `token`. Returns
    /// false, leaving the section untouched, if the token has been superseded.
    pub fn finish(&mut self, token: RequestToken, result: Result<T, GenerationError>) -> bool {
        if token.0 != self.token || !self.loading {
            return false;
        }
        self.loading = false;
        match result {
            Ok(value) => {
                self.result = Some(value);
                self.error = None;
            }
            Err(err) => {
                self.retryable = err.is_retryable();
                self.error = Some(err.user_message());
            }
        }
        true
    }

    /// Clears the section. Tokens issued before the reset stay invalid.
    pub fn reset(&mut self) {
        *self = Self {
            token: self.token + 1,
            ..Self::default()
        };
    }
}

/// Everything generated for the selected (genre, title) pair.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    pub suno_prompts: Section<Vec<String>>,
    pub metadata: Section<VideoMetadata>,
    pub lyrics: Section<Vec<String>>,
    pub thumbnail_prompt: Section<String>,
    /// Generation time of the current thumbnail; the image itself lives in
    /// the thumbnail editor.
    pub thumbnail: Section<DateTime<Utc>>,
}

impl Workspace {
    pub fn reset(&mut self) {
        self.suno_prompts.reset();
        self.metadata.reset();
        self.lyrics.reset();
        self.thumbnail_prompt.reset();
        self.thumbnail.reset();
    }
}
