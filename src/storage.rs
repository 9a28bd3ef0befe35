use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio::fs;

/// Export directory on disk, served back to the browser under `base_url`.
#[derive(Clone, Debug)]
pub struct ExportStorage {
    base_dir: PathBuf,
    base_url: String,
}

impl ExportStorage {
    pub fn new(base_dir: PathBuf, base_url: impl Into<String>) -> Self {
        Self {
            base_dir,
            base_url: base_url.into(),
        }
    }

    pub async fn put(&self, key: &str, data: &[u8]) -> Result<()> {
        let path = self.resolve_path(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(path, data).await?;
        Ok(())
    }

    pub async fn exists(&self, key: &str) -> Result<bool> {
        match fs::metadata(self.resolve_path(key)).await {
            Ok(_) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    pub fn public_url(&self, key: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let key = key.trim_start_matches('/');
        format!("{base}/{key}")
    }

    /// `<slug>-<yyyymmdd-hhmmss>`; one directory per export.
    pub fn export_prefix(title: &str, at: DateTime<Utc>) -> String {
        format!("{}-{}", slugify(title), at.format("%Y%m%d-%H%M%S"))
    }

    /// An export prefix with no directory behind it yet. Exports within the
    /// same second get `-2`, `-3`, ... appended.
    pub async fn fresh_export_prefix(&self, title: &str, at: DateTime<Utc>) -> Result<String> {
        let base = Self::export_prefix(title, at);
        let mut prefix = base.clone();
        let mut n = 1;
        while self.exists(&prefix).await? {
            n += 1;
            prefix = format!("{base}-{n}");
        }
        Ok(prefix)
    }

    /// Keys are relative; `..` components are dropped so nothing escapes
    /// `base_dir`.
    pub fn resolve_path(&self, key: &str) -> PathBuf {
        let mut path = self.base_dir.clone();
        for part in key.split('/') {
            if part.is_empty() || part == "." || part == ".." {
                continue;
            }
            path.push(part);
        }
        path
    }
}

/// Filesystem-safe name. Non-ASCII letters are kept; everything else that is
/// not alphanumeric collapses into single dashes.
pub fn slugify(text: &str) -> String {
    let mut slug = String::new();
    for c in text.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    let slug: String = slug.trim_end_matches('-').chars().take(60).collect();
    if slug.is_empty() {
        "playlist".to_string()
    } else {
        slug
    }
}
