//! One `GeminiClient` operation per workspace step.

pub mod lyrics;
pub mod metadata;
pub mod suno;
pub mod thumbnail;
pub mod titles;

pub use metadata::VideoMetadata;
pub use self_test::{SelfTestKind, SelfTestReport, SelfTestResult};
