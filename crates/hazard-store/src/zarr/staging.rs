//! Staging directories for atomic artifact replacement.

use std::path::{Path, PathBuf};

/// Directory under the store root holding in-flight and displaced artifacts.
pub const STAGING_DIR: &str = ".staging";

/// Removes a staged directory on drop unless disarmed.
///
/// Covers every early return between staging an artifact and renaming it
/// into place, so failed writes leave nothing behind.
pub(crate) struct StagingGuard {
    path: PathBuf,
    armed: bool,
}

impl StagingGuard {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Keep the directory; call after it has been renamed into place.
    pub(crate) fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for StagingGuard {
    fn drop(&mut self) {
        if self.armed && self.path.exists() {
            if let Err(e) = std::fs::remove_dir_all(&self.path) {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove staged artifact");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_armed_guard_removes_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let staged = temp_dir.path().join("staged");
        std::fs::create_dir_all(staged.join("c")).unwrap();
        {
            let _guard = StagingGuard::new(staged.clone());
        }
        assert!(!staged.exists());
    }

    #[test]
    fn test_disarmed_guard_keeps_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let staged = temp_dir.path().join("staged");
        std::fs::create_dir_all(&staged).unwrap();
        {
            let mut guard = StagingGuard::new(staged.clone());
            guard.disarm();
        }
        assert!(staged.exists());
    }
}
