mod client;
mod files;
mod resources;

pub use files::FilesClient;
pub use resources::file::{File, FileList, FileMetadata, FilesListRequest, Query};

/// Media type Drive uses to mark a file as a folder
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Per-file access: the service account only sees files it created or opened
pub const DRIVE_FILE_SCOPE: &str = "https://www.googleapis.com/auth/drive.file";

const API_BASE_URL: &str = "https://www.googleapis.com/drive/v3";
const UPLOAD_BASE_URL: &str = "https://www.googleapis.com/upload/drive/v3";

/// Base urls of the Drive v3 REST API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub api_url: String,
    pub upload_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            api_url: API_BASE_URL.to_owned(),
            upload_url: UPLOAD_BASE_URL.to_owned(),
        }
    }
}

impl Endpoints {
    /// Both urls point at `base_url`, which is how a local mock server exposes them
    pub fn with_base_url(base_url: &str) -> Self {
        let base_url = base_url.strip_suffix('/').unwrap_or(base_url);
        Self {
            api_url: base_url.to_owned(),
            upload_url: format!("{}/upload", base_url),
        }
    }
}

pub mod credentials {

    pub mod serviceaccount {

        use crate::gcp::oauth2::token::ServiceAccountCredentials;

        pub async fn from_file<T>(
            file_path: T,
            scope: &str,
        ) -> super::super::DriveResult<ServiceAccountCredentials>
        where
            T: AsRef<std::path::Path>,
        {
            ServiceAccountCredentials::from_file(file_path)
                .await
                .map(|x| x.with_scope(scope))
                .map_err(super::super::Error::DriveTokenError)
        }
    }
}

#[derive(Debug)]
pub enum Error {
    DriveTokenError(super::oauth2::Error),
    DriveHttpError(reqwest::Error),
    DriveUnexpectedResponse {
        url: String,
        status: u16,
        value: String,
    },
    DriveUnexpectedJson {
        url: String,
        expected_type: String,
        json: serde_json::Value,
    },
    DriveMissingField {
        url: String,
        field: String,
    },
    DriveResourceNotFound {
        url: String,
    },
    InvalidMetadata {
        expected_type: String,
        error: serde_json::Error,
    },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}
impl std::error::Error for Error {}

impl Error {
    fn invalid_metadata<T>(error: serde_json::Error) -> Self {
        Self::InvalidMetadata {
            expected_type: std::any::type_name::<T>().to_owned(),
            error,
        }
    }

    fn unexpected_response_error<T, U>(url: T, status: reqwest::StatusCode, value: U) -> Self
    where
        T: AsRef<str>,
        U: AsRef<str>,
    {
        Self::DriveUnexpectedResponse {
            url: url.as_ref().to_owned(),
            status: status.as_u16(),
            value: value.as_ref().to_owned(),
        }
    }

    fn unexpected_json<T>(url: &str, json: serde_json::Value) -> Self {
        let expected_type = std::any::type_name::<T>().to_owned();
        Self::DriveUnexpectedJson {
            url: url.to_owned(),
            expected_type,
            json,
        }
    }

    fn missing_field(url: &str, field: &str) -> Self {
        Self::DriveMissingField {
            url: url.to_owned(),
            field: field.to_owned(),
        }
    }

    /// False only when the key file could not be read or signed with
    pub fn is_remote(&self) -> bool {
        match self {
            Error::DriveTokenError(e) => e.is_remote(),
            Error::InvalidMetadata { .. } => false,
            _ => true,
        }
    }
}

pub type DriveResult<T> = std::result::Result<T, Error>;
