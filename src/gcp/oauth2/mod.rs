pub mod token;

use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum Error {
    DeserializationError {
        expected_type: String,
        error: serde_json::Error,
    },
    IoError {
        message: String,
        path: PathBuf,
        error: std::io::Error,
    },
    HttpError(reqwest::Error),
    JWTError(jsonwebtoken::errors::Error),
    MissingScope,
    UnexpectedApiResponse {
        expected_type: String,
        json: serde_json::Value,
    },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for Error {}

impl Error {
    pub fn unexpected_api_response<T>(json: serde_json::Value) -> Error {
        let expected_type = std::any::type_name::<T>().to_owned();
        Error::UnexpectedApiResponse {
            expected_type,
            json,
        }
    }

    pub fn io_error<T>(message: &str, path: T, error: std::io::Error) -> Error
    where
        T: AsRef<Path>,
    {
        Error::IoError {
            message: message.to_owned(),
            path: path.as_ref().to_path_buf(),
            error,
        }
    }

    pub fn deserialization_error<T>(error: serde_json::Error) -> Error {
        let expected_type = std::any::type_name::<T>().to_owned();
        Error::DeserializationError {
            expected_type,
            error,
        }
    }

    /// True when the failure comes from the token endpoint rather than from reading the key file
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Error::HttpError(_) | Error::UnexpectedApiResponse { .. }
        )
    }
}

pub type TokenResult<T> = std::result::Result<T, Error>;
