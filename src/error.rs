use thiserror::Error;

/// Failure reasons surfaced by every generation, persona and compositing call.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("no API key configured")]
    MissingCredential,

    #[error("the endpoint rejected the API key: {0}")]
    InvalidCredential(String),

    #[error("request failed ({status}): {message}")]
    RequestFailed { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("response envelope is missing expected fields")]
    MalformedResponse,

    #[error("response text could not be parsed as JSON")]
    UnparsableResponse,

    #[error("response is missing required field(s): {0}")]
    IncompleteResult(&'static str),

    #[error("no image data in response{}", .0.as_deref().map(|t| format!(": {t}")).unwrap_or_default())]
    NoImageData(Option<String>),

    #[error("unsupported file type: {0}")]
    UnsupportedFile(String),

    #[error("file too large: {0} bytes (max {max} bytes)", max = MAX_PERSONA_BYTES)]
    FileTooLarge(usize),

    #[error("image processing failed: {0}")]
    Image(String),
}

pub const MAX_PERSONA_BYTES: usize = 10 * 1024 * 1024;

pub type Result<T> = std::result::Result<T, GenerationError>;

impl GenerationError {
    pub fn image(msg: impl Into<String>) -> Self {
        Self::Image(msg.into())
    }

    /// Message shown in the section that triggered the call.
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingCredential => {
                "No API key is configured. Open settings and enter your Gemini API key.".to_string()
            }
            Self::InvalidCredential(_) => "The API key is invalid. Please check it in settings.".to_string(),
            Self::RequestFailed { message, .. } if !message.trim().is_empty() => message.clone(),
            Self::RequestFailed { .. } => "The API request failed.".to_string(),
            Self::Transport(err) => format!("Could not reach the API: {err}"),
            Self::MalformedResponse => "The API response has an unexpected format.".to_string(),
            Self::UnparsableResponse => "The API response could not be parsed.".to_string(),
            Self::IncompleteResult(what) => format!("The API response did not contain {what}."),
            Self::NoImageData(_) => "No image was returned. Please try again.".to_string(),
            Self::UnsupportedFile(_) => "Only image files can be uploaded.".to_string(),
            Self::FileTooLarge(_) => "The image must be 10MB or smaller.".to_string(),
            Self::Image(msg) => format!("Image processing failed: {msg}"),
        }
    }

    /// Whether a manual retry has a chance of succeeding without user changes.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RequestFailed { .. }
                | Self::Transport(_)
                | Self::MalformedResponse
                | Self::UnparsableResponse
                | Self::IncompleteResult(_)
                | Self::NoImageData(_)
        )
    }
}
