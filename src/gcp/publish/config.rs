use std::path::{Path, PathBuf};

use crate::drive::DRIVE_FILE_SCOPE;

pub const DEFAULT_KEY_FILE: &str = "service-account.json";
pub const DEFAULT_FOLDER_NAME: &str = "rock-paper-scissors";
pub const DEFAULT_SOURCE_DIR: &str = "build/contracts";
pub const DEFAULT_MEDIA_TYPE: &str = "text/json";
pub const DEFAULT_EXTENSION: &str = ".json";

const CREDENTIALS_ENV_VAR: &str = "GOOGLE_APPLICATION_CREDENTIALS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishConfig {
    pub key_file: PathBuf,
    pub folder_name: String,
    pub source_dir: PathBuf,
    pub scope: String,
    pub media_type: String,
    /// Suffix a local file name must end with to be uploaded
    pub extension: String,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            key_file: PathBuf::from(DEFAULT_KEY_FILE),
            folder_name: DEFAULT_FOLDER_NAME.to_owned(),
            source_dir: PathBuf::from(DEFAULT_SOURCE_DIR),
            scope: DRIVE_FILE_SCOPE.to_owned(),
            media_type: DEFAULT_MEDIA_TYPE.to_owned(),
            extension: DEFAULT_EXTENSION.to_owned(),
        }
    }
}

impl PublishConfig {
    pub fn with_key_file(mut self, key_file: &Path) -> Self {
        self.key_file = key_file.to_path_buf();
        self
    }

    pub fn with_folder_name(mut self, folder_name: &str) -> Self {
        self.folder_name = folder_name.to_owned();
        self
    }

    pub fn with_source_dir(mut self, source_dir: &Path) -> Self {
        self.source_dir = source_dir.to_path_buf();
        self
    }

    pub fn with_scope(mut self, scope: &str) -> Self {
        self.scope = scope.to_owned();
        self
    }

    pub fn with_media_type(mut self, media_type: &str) -> Self {
        self.media_type = media_type.to_owned();
        self
    }

    pub fn with_extension(mut self, extension: &str) -> Self {
        self.extension = extension.to_owned();
        self
    }

    pub fn accepts(&self, file_name: &str) -> bool {
        file_name.ends_with(self.extension.as_str())
    }
}

/// Explicit path first, then `GOOGLE_APPLICATION_CREDENTIALS`, then `service-account.json`
pub fn resolve_key_file(explicit: Option<PathBuf>) -> PathBuf {
    explicit
        .or_else(|| std::env::var_os(CREDENTIALS_ENV_VAR).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_KEY_FILE))
}
