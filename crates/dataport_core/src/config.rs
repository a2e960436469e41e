//! Session configuration.

use std::path::{Path, PathBuf};

/// Configuration passed to a session type when it is opened.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Root directory for providers that keep data on disk.
    ///
    /// Providers that need it report a state error when it is unset.
    pub data_dir: Option<PathBuf>,

    /// Whether to sync the storage backend after every commit.
    pub sync_on_commit: bool,

    /// Whether `save` rejects entities that fail their validation rules.
    pub validate_on_save: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            sync_on_commit: true,
            validate_on_save: true,
        }
    }
}

impl SessionConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the data directory.
    #[must_use]
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(path.into());
        self
    }

    /// Sets whether to sync storage on every commit.
    #[must_use]
    pub const fn sync_on_commit(mut self, value: bool) -> Self {
        self.sync_on_commit = value;
        self
    }

    /// Sets whether `save` validates entities first.
    #[must_use]
    pub const fn validate_on_save(mut self, value: bool) -> Self {
        self.validate_on_save = value;
        self
    }

    /// Returns the data directory, if configured.
    #[must_use]
    pub fn data_dir_path(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }
}
