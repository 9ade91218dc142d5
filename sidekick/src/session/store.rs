//! Thread id persistence between sessions.

use std::path::{Path, PathBuf};

use sidekick_core::error::SidekickError;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct ThreadStore {
    path: PathBuf,
}

fn io_error(path: &Path, err: std::io::Error) -> SidekickError {
    SidekickError::IoError(format!("{}: {err}", path.display()))
}

impl ThreadStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Saved thread id; `None` when the file is missing or blank.
    pub fn read_thread_id(&self) -> Result<Option<String>, SidekickError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                let id = content.trim();
                Ok((!id.is_empty()).then(|| id.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(&self.path, e)),
        }
    }

    pub fn save_thread_id(&self, thread_id: &str) -> Result<(), SidekickError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
        }
        std::fs::write(&self.path, thread_id.trim()).map_err(|e| io_error(&self.path, e))?;
        debug!(path = %self.path.display(), thread_id, "Saved thread id");
        Ok(())
    }

    /// Forget the saved thread; a missing file is fine.
    pub fn clear_thread_id(&self) -> Result<(), SidekickError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(&self.path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_through_nested_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = ThreadStore::new(dir.path().join("state/sidekick/thread_id"));
        assert_eq!(store.read_thread_id().unwrap(), None);

        store.save_thread_id(" thread_abc\n").unwrap();
        assert_eq!(
            std::fs::read_to_string(store.path()).unwrap(),
            "thread_abc"
        );
        assert_eq!(store.read_thread_id().unwrap().as_deref(), Some("thread_abc"));

        store.clear_thread_id().unwrap();
        assert_eq!(store.read_thread_id().unwrap(), None);
        store.clear_thread_id().unwrap();
    }

    #[test]
    fn blank_file_means_no_thread() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("thread_id");
        std::fs::write(&path, "  \n").unwrap();
        assert_eq!(ThreadStore::new(path).read_thread_id().unwrap(), None);
    }
}
