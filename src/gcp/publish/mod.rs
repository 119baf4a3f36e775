mod config;

use std::fmt::Display;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use futures::{Stream, TryStream, TryStreamExt};
use tokio_util::codec::{BytesCodec, FramedRead};

pub use config::{
    resolve_key_file, PublishConfig, DEFAULT_EXTENSION, DEFAULT_FOLDER_NAME, DEFAULT_KEY_FILE,
    DEFAULT_MEDIA_TYPE, DEFAULT_SOURCE_DIR,
};

use crate::drive::{
    credentials, DriveResult, Endpoints, Error as DriveError, FileMetadata, FilesClient,
};

const DEFAULT_BUF_SIZE: usize = 64 * 1024;

/// The remote calls the republish procedure is made of
#[async_trait::async_trait]
pub trait DriveFiles {
    /// Ids of every folder named exactly `name`, in the order the service returns them
    async fn find_folders(&self, name: &str) -> DriveResult<Vec<String>>;

    async fn delete(&self, file_id: &str) -> DriveResult<()>;

    async fn create_folder(&self, name: &str) -> DriveResult<String>;

    async fn upload<S>(
        &self,
        metadata: &FileMetadata,
        media_type: &str,
        stream: S,
    ) -> DriveResult<String>
    where
        S: TryStream<Ok = Bytes> + Send + Sync + 'static,
        S::Error: Into<Box<dyn std::error::Error + Send + Sync>> + Send + Sync;
}

#[async_trait::async_trait]
impl DriveFiles for FilesClient {
    async fn find_folders(&self, name: &str) -> DriveResult<Vec<String>> {
        FilesClient::find_folders(self, name).await
    }

    async fn delete(&self, file_id: &str) -> DriveResult<()> {
        FilesClient::delete(self, file_id).await.map(|_| ())
    }

    async fn create_folder(&self, name: &str) -> DriveResult<String> {
        FilesClient::create_folder(self, name).await
    }

    async fn upload<S>(
        &self,
        metadata: &FileMetadata,
        media_type: &str,
        stream: S,
    ) -> DriveResult<String>
    where
        S: TryStream<Ok = Bytes> + Send + Sync + 'static,
        S::Error: Into<Box<dyn std::error::Error + Send + Sync>> + Send + Sync,
    {
        FilesClient::upload(self, metadata, media_type, stream).await
    }
}

/// One step of a run, displayed as the console line reporting it
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum PublishStatus {
    FolderFound { name: String, id: String },
    FolderNotFound,
    FolderDeleted(String),
    FolderCreated(String),
    FileUploaded { name: String, id: String },
    FileSkipped(String),
}

impl Display for PublishStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PublishStatus::FolderFound { name, .. } => write!(f, "Folder '{}' found.", name),
            PublishStatus::FolderNotFound => write!(f, "Folder not found."),
            PublishStatus::FolderDeleted(id) => {
                write!(f, "Folder with ID {} has been deleted.", id)
            }
            PublishStatus::FolderCreated(id) => write!(f, "Folder ID: {}", id),
            PublishStatus::FileUploaded { id, .. } => write!(f, "A new file was created: {}", id),
            PublishStatus::FileSkipped(name) => write!(f, "Skipping file {}", name),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub id: String,
}

#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct PublishReport {
    pub deleted_folder_id: Option<String>,
    pub folder_id: String,
    pub uploaded: Vec<UploadedFile>,
    pub skipped: Vec<String>,
}

#[derive(Debug)]
pub enum PublishError {
    Drive(DriveError),
    FsIoError {
        path: PathBuf,
        message: String,
        error: std::io::Error,
    },
}

impl PublishError {
    fn fs_io_error<T, U>(message: U, path: T, error: std::io::Error) -> PublishError
    where
        T: AsRef<Path>,
        U: AsRef<str>,
    {
        PublishError::FsIoError {
            path: path.as_ref().to_path_buf(),
            message: message.as_ref().to_owned(),
            error,
        }
    }

    /// Remote failures are reported and end the run; local ones are bugs in the invocation
    pub fn is_remote(&self) -> bool {
        match self {
            PublishError::Drive(e) => e.is_remote(),
            PublishError::FsIoError { .. } => false,
        }
    }
}

impl std::fmt::Display for PublishError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for PublishError {}

impl From<DriveError> for PublishError {
    fn from(e: DriveError) -> Self {
        PublishError::Drive(e)
    }
}

pub type PublishResult<T> = Result<T, PublishError>;

#[derive(Debug)]
struct LocalEntry {
    /// Lossy rendering when the file name is not valid unicode
    name: String,
    path: PathBuf,
    unicode_name: bool,
}

/// Flat listing of `dir`, sorted by name. Entries are not inspected beyond their name.
async fn local_entries(dir: &Path) -> PublishResult<Vec<LocalEntry>> {
    let mut read_dir = tokio::fs::read_dir(dir)
        .await
        .map_err(|err| PublishError::fs_io_error("read dir failed", dir, err))?;

    let mut entries = Vec::new();
    while let Some(entry) = read_dir
        .next_entry()
        .await
        .map_err(|err| PublishError::fs_io_error("next entry failed", dir, err))?
    {
        let path = entry.path();
        let (name, unicode_name) = match entry.file_name().into_string() {
            Ok(name) => (name, true),
            Err(name) => (name.to_string_lossy().into_owned(), false),
        };
        entries.push(LocalEntry {
            name,
            path,
            unicode_name,
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

/// Follows symlinks, so a link to a regular file counts as one
async fn is_regular_file(path: &Path) -> PublishResult<bool> {
    tokio::fs::metadata(path)
        .await
        .map(|metadata| metadata.is_file())
        .map_err(|err| PublishError::fs_io_error("reading metadata failed", path, err))
}

/// Deletes the Drive folder named after the config, recreates it and uploads the matching local files into it
pub struct Republisher<D> {
    drive: D,
    config: PublishConfig,
}

impl<D> Republisher<D>
where
    D: DriveFiles + Sync,
{
    pub fn new(drive: D, config: PublishConfig) -> Self {
        Self { drive, config }
    }

    async fn replace_folder<F>(
        &self,
        report: &mut PublishReport,
        on_status: &mut F,
    ) -> PublishResult<()>
    where
        F: FnMut(&PublishStatus),
    {
        let name = self.config.folder_name.as_str();
        let folder_ids = self.drive.find_folders(name).await?;
        if folder_ids.len() > 1 {
            tracing::warn!(
                folder = name,
                matches = ?folder_ids,
                "several folders share this name, only the first one is deleted"
            );
        }

        match folder_ids.into_iter().next() {
            Some(id) => {
                on_status(&PublishStatus::FolderFound {
                    name: name.to_owned(),
                    id: id.to_owned(),
                });
                self.drive.delete(&id).await?;
                tracing::info!(folder = name, %id, "folder deleted");
                on_status(&PublishStatus::FolderDeleted(id.to_owned()));
                report.deleted_folder_id = Some(id);
            }
            None => on_status(&PublishStatus::FolderNotFound),
        }

        let folder_id = self.drive.create_folder(name).await?;
        tracing::info!(folder = name, id = %folder_id, "folder created");
        on_status(&PublishStatus::FolderCreated(folder_id.to_owned()));
        report.folder_id = folder_id;
        Ok(())
    }

    async fn upload_entry(&self, folder_id: &str, entry: &LocalEntry) -> PublishResult<String> {
        let file = tokio::fs::File::open(entry.path.as_path())
            .await
            .map_err(|err| PublishError::fs_io_error("open file failed", &entry.path, err))?;
        let stream = FramedRead::with_capacity(file, BytesCodec::new(), DEFAULT_BUF_SIZE)
            .map_ok(|x| x.freeze());

        let metadata = FileMetadata::child(&entry.name, folder_id);
        self.upload_content(&metadata, entry.path.as_path(), stream)
            .await
    }

    /// A read failure of `path` aborts the request and is reported as a local error
    async fn upload_content<S>(
        &self,
        metadata: &FileMetadata,
        path: &Path,
        stream: S,
    ) -> PublishResult<String>
    where
        S: Stream<Item = std::io::Result<Bytes>> + Send + Sync + 'static,
    {
        let read_error: Arc<Mutex<Option<std::io::Error>>> = Arc::default();
        let slot = Arc::clone(&read_error);
        let stream = stream.map_err(move |err| {
            let forwarded = std::io::Error::new(err.kind(), err.to_string());
            if let Ok(mut slot) = slot.lock() {
                slot.get_or_insert(err);
            }
            forwarded
        });

        match self
            .drive
            .upload(metadata, &self.config.media_type, stream)
            .await
        {
            Ok(id) => Ok(id),
            Err(err) => {
                let read_error = read_error.lock().ok().and_then(|mut slot| slot.take());
                match read_error {
                    Some(read_error) => {
                        tracing::debug!(error = %err, "upload aborted by a failed read");
                        Err(PublishError::fs_io_error(
                            "read file failed",
                            path,
                            read_error,
                        ))
                    }
                    None => Err(err.into()),
                }
            }
        }
    }

    /// Runs every step in order and stops at the first failure.
    ///
    /// `on_status` is called as soon as a step completes, so a failed run has already reported what it did.
    pub async fn run<F>(&self, mut on_status: F) -> PublishResult<PublishReport>
    where
        F: FnMut(&PublishStatus),
    {
        let mut report = PublishReport::default();
        self.replace_folder(&mut report, &mut on_status).await?;

        let entries = local_entries(self.config.source_dir.as_path()).await?;
        for entry in entries {
            if !entry.unicode_name {
                tracing::warn!(file = %entry.name, "file name is not valid unicode");
            }
            if entry.unicode_name
                && self.config.accepts(&entry.name)
                && is_regular_file(entry.path.as_path()).await?
            {
                let id = self.upload_entry(&report.folder_id, &entry).await?;
                tracing::debug!(file = %entry.name, %id, "file uploaded");
                on_status(&PublishStatus::FileUploaded {
                    name: entry.name.to_owned(),
                    id: id.to_owned(),
                });
                report.uploaded.push(UploadedFile {
                    name: entry.name,
                    id,
                });
            } else {
                on_status(&PublishStatus::FileSkipped(entry.name.to_owned()));
                report.skipped.push(entry.name);
            }
        }

        Ok(report)
    }
}

/// Reads the service account key and authenticates against Drive
pub async fn connect(config: &PublishConfig, endpoints: Endpoints) -> PublishResult<FilesClient> {
    let token_generator =
        credentials::serviceaccount::from_file(config.key_file.as_path(), &config.scope).await?;
    tracing::info!(client_email = token_generator.client_email(), "authenticating");
    let client = FilesClient::with_endpoints(Box::new(token_generator), endpoints).await?;
    Ok(client)
}

pub async fn republish<F>(
    config: PublishConfig,
    endpoints: Endpoints,
    on_status: F,
) -> PublishResult<PublishReport>
where
    F: FnMut(&PublishStatus),
{
    let client = connect(&config, endpoints).await?;
    Republisher::new(client, config).run(on_status).await
}

/// Prints the line of a remote failure to `out` and turns the outcome into the process exit code.
///
/// Local failures are handed back so that they surface through `main`.
pub fn report_outcome<W>(
    result: PublishResult<PublishReport>,
    out: &mut W,
) -> PublishResult<ExitCode>
where
    W: Write,
{
    match result {
        Ok(report) => {
            tracing::info!(
                folder_id = %report.folder_id,
                uploaded = report.uploaded.len(),
                skipped = report.skipped.len(),
                "republish completed"
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(e) if e.is_remote() => {
            writeln!(out, "An error occurred: {}", e).map_err(|err| {
                PublishError::fs_io_error("write error line failed", "<stdout>", err)
            })?;
            Ok(ExitCode::FAILURE)
        }
        Err(e) => Err(e),
    }
}
