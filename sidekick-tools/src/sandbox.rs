//! Workspace confinement for file tools.
//!
//! Paths from the assistant are relative to the workspace root. Absolute paths,
//! `..` that climbs above the root, and symlinks resolving outside it are rejected.

use std::path::{Component, Path, PathBuf};

use sidekick_core::error::SidekickError;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Open a workspace rooted at an existing directory.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, SidekickError> {
        let root = root.as_ref();
        let canonical = root.canonicalize().map_err(|e| {
            SidekickError::ConfigurationError(format!(
                "Workspace {} is not accessible: {e}",
                root.display()
            ))
        })?;
        if !canonical.is_dir() {
            return Err(SidekickError::ConfigurationError(format!(
                "Workspace {} is not a directory",
                root.display()
            )));
        }
        Ok(Self { root: canonical })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a workspace-relative path to a location inside the root.
    ///
    /// The target need not exist; its nearest existing ancestor is canonicalized
    /// so a symlinked directory cannot lead outside the root.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf, SidekickError> {
        let requested = Path::new(relative.trim());
        let mut resolved = self.root.clone();

        for component in requested.components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                Component::ParentDir => {
                    if resolved == self.root {
                        return Err(self.escape_error(relative));
                    }
                    resolved.pop();
                }
                Component::Prefix(_) | Component::RootDir => {
                    return Err(SidekickError::InvalidInput(format!(
                        "Absolute paths are not allowed: {relative}"
                    )));
                }
            }
        }

        let anchor = nearest_existing(&resolved);
        let canonical_anchor = match anchor.canonicalize() {
            Ok(path) => path,
            // A dangling symlink: its target cannot be checked against the root.
            Err(_) if anchor.is_symlink() => {
                warn!(path = %relative, link = %anchor.display(), "Rejected dangling symlink");
                return Err(SidekickError::InvalidInput(format!(
                    "Path goes through a dangling symlink: {relative}"
                )));
            }
            Err(e) => return Err(SidekickError::IoError(format!("{}: {e}", anchor.display()))),
        };
        if !canonical_anchor.starts_with(&self.root) {
            return Err(self.escape_error(relative));
        }

        let remainder = resolved.strip_prefix(anchor).unwrap_or(Path::new(""));
        Ok(canonical_anchor.join(remainder))
    }

    /// Path relative to the root for display; falls back to the full path.
    pub fn display_path(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        let shown = relative.to_string_lossy().replace('\\', "/");
        if shown.is_empty() {
            ".".to_string()
        } else {
            shown
        }
    }

    fn escape_error(&self, relative: &str) -> SidekickError {
        warn!(path = %relative, root = %self.root.display(), "Rejected path outside workspace");
        SidekickError::InvalidInput(format!("Path escapes the workspace: {relative}"))
    }
}

/// Nearest ancestor present on disk. Symlinks count as present even when dangling.
fn nearest_existing(path: &Path) -> &Path {
    let mut current = path;
    while current.symlink_metadata().is_err() {
        match current.parent() {
            Some(parent) => current = parent,
            None => break,
        }
    }
    current
}
