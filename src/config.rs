use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result, anyhow};
use url::Url;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-3-pro-image-preview";
pub const DEFAULT_FALLBACK_IMAGE_MODEL: &str = "gemini-2.5-flash-image";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub api_base: Url,
    pub text_model: String,
    pub image_model: String,
    pub fallback_image_model: String,
    pub data_dir: PathBuf,
    pub request_timeout: Duration,
}

impl AppConfig {
    /// Reads `STUDIO_*` / `GEMINI_*` variables. Call `dotenvy::dotenv()` first.
    pub fn from_env() -> Result<Self> {
        let port = env::var("STUDIO_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);
        let api_base = match non_empty_var("GEMINI_API_BASE") {
            Some(raw) => validate_http_url(&raw)?,
            None => validate_http_url(DEFAULT_API_BASE)?,
        };
        let request_timeout = env::var("GEMINI_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));

        Ok(Self {
            port,
            api_base,
            text_model: non_empty_var("GEMINI_TEXT_MODEL")
                .unwrap_or_else(|| DEFAULT_TEXT_MODEL.to_string()),
            image_model: non_empty_var("GEMINI_IMAGE_MODEL")
                .unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string()),
            fallback_image_model: non_empty_var("GEMINI_FALLBACK_IMAGE_MODEL")
                .unwrap_or_else(|| DEFAULT_FALLBACK_IMAGE_MODEL.to_string()),
            data_dir: resolve_data_dir(),
            request_timeout,
        })
    }

    /// Defaults pointed at an arbitrary endpoint; used by tests and embedders.
    pub fn with_api_base(api_base: &str, data_dir: PathBuf) -> Result<Self> {
        Ok(Self {
            port: DEFAULT_PORT,
            api_base: validate_http_url(api_base)?,
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            fallback_image_model: DEFAULT_FALLBACK_IMAGE_MODEL.to_string(),
            data_dir,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("127.0.0.1:{}", self.port)
    }

    pub fn credential_path(&self) -> PathBuf {
        self.data_dir.join("gemini_api_key")
    }

    pub fn export_dir(&self) -> PathBuf {
        self.data_dir.join("exports")
    }

    /// Extra fonts for thumbnail titles, loaded on top of the system fonts.
    pub fn font_dir(&self) -> PathBuf {
        self.data_dir.join("fonts")
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn resolve_data_dir() -> PathBuf {
    if let Some(dir) = non_empty_var("STUDIO_DATA_DIR") {
        return PathBuf::from(dir);
    }
    let mut base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    base.push("playlist-studio");
    base
}

pub fn validate_http_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("url must not be empty"));
    }
    let parsed = Url::parse(trimmed).map_err(|err| anyhow!("invalid url {trimmed}: {err}"))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(anyhow!("only http or https is allowed, got {scheme}")),
    }
}
