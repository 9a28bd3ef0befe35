use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use tracing::warn;

/// The single persisted Gemini API key.
///
/// Held by the session and handed to the client explicitly; reads happen on
/// every outbound request, writes only on user action.
#[derive(Debug, Default)]
pub struct CredentialStore {
    path: Option<PathBuf>,
    value: RwLock<Option<String>>,
}

impl CredentialStore {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Loads a previously saved key from `path` if present.
    pub fn load(path: PathBuf) -> Self {
        let value = match fs::read_to_string(&path) {
            Ok(raw) => Some(raw.trim().to_string()).filter(|v| !v.is_empty()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "could not read stored API key");
                None
            }
        };
        Self {
            path: Some(path),
            value: RwLock::new(value),
        }
    }

    /// A non-persistent store holding `key`, used to try a key before saving it.
    pub fn with_override(key: &str) -> Arc<Self> {
        let store = Self::in_memory();
        store.save(key);
        Arc::new(store)
    }

    /// Stores the trimmed key. Blank input is rejected and leaves the store untouched.
    pub fn save(&self, key: &str) -> bool {
        let trimmed = key.trim();
        if trimmed.is_empty() {
            return false;
        }
        if let Some(path) = &self.path {
            if let Some(parent) = path.parent() {
                if let Err(err) = fs::create_dir_all(parent) {
                    warn!(error = %err, "could not create credential directory");
                    return false;
                }
            }
            if let Err(err) = write_private(path, trimmed) {
                warn!(error = %err, "could not persist API key");
                return false;
            }
        }
        match self.value.write() {
            Ok(mut slot) => {
                *slot = Some(trimmed.to_string());
                true
            }
            Err(_) => false,
        }
    }

    pub fn get(&self) -> Option<String> {
        self.value.read().ok().and_then(|slot| slot.clone())
    }

    pub fn remove(&self) {
        if let Ok(mut slot) = self.value.write() {
            *slot = None;
        }
        if let Some(path) = &self.path {
            match fs::remove_file(path) {
                Ok(()) => {}
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => warn!(error = %err, "could not delete stored API key"),
            }
        }
    }

    pub fn has(&self) -> bool {
        self.get().is_some_and(|key| !key.trim().is_empty())
    }
}

/// Writes `contents` readable by the owner only on unix.
fn write_private(path: &Path, contents: &str) -> io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    std::os::unix::fs::OpenOptionsExt::mode(&mut options, 0o600);
    let mut file = options.open(path)?;
    // `mode` only applies on creation; tighten a key file left by an older run.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(contents.as_bytes())
}
