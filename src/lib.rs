pub mod catalog;
pub mod compositor;
pub mod config;
pub mod credential;
pub mod error;
pub mod flow;
pub mod gemini;
pub mod generation;
pub mod image_processing;
pub mod persona;
pub mod session;
pub mod settings;
pub mod storage;
pub mod thumbnail;
pub mod web;
pub mod workspace;

pub use config::AppConfig;
pub use error::{GenerationError, Result};
pub use gemini::GeminiClient;
pub use session::Session;
