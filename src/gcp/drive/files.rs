use futures::{Stream, StreamExt, TryStreamExt};

use crate::oauth2::token::TokenGenerator;

use super::{
    client::DriveClient,
    resources::file::{File, FileList, FileMetadata, FilesListRequest, Query},
    DriveResult, Endpoints, Error,
};

const ID_FIELD: [(&str, &str); 1] = [("fields", "id")];

pub struct FilesClient {
    drive_client: DriveClient,
    endpoints: Endpoints,
}

impl FilesClient {
    /// Fetches the first access token eagerly so that bad credentials fail here
    pub async fn with_endpoints(
        token_generator: Box<dyn TokenGenerator>,
        endpoints: Endpoints,
    ) -> DriveResult<Self> {
        Ok(Self {
            drive_client: DriveClient::new(token_generator).await?,
            endpoints,
        })
    }

    fn id_of(url: &str, file: File) -> DriveResult<String> {
        file.id.ok_or_else(|| Error::missing_field(url, "id"))
    }

    pub async fn delete(&self, file_id: &str) -> DriveResult<String> {
        let url = self.endpoints.file_url(file_id);
        self.drive_client.delete(&url).await?;
        Ok(file_id.to_owned())
    }

    /// Returns the id of the created file
    pub async fn create(&self, metadata: &FileMetadata) -> DriveResult<String> {
        let url = self.endpoints.files_url();
        let file: File = self
            .drive_client
            .post_json(&url, &ID_FIELD, metadata)
            .await?;
        Self::id_of(&url, file)
    }

    pub async fn create_folder(&self, name: &str) -> DriveResult<String> {
        self.create(&FileMetadata::folder(name)).await
    }

    /// Uploads metadata and content in a single multipart request and returns the new file id
    pub async fn upload<S>(
        &self,
        metadata: &FileMetadata,
        media_type: &str,
        stream: S,
    ) -> DriveResult<String>
    where
        S: futures::TryStream<Ok = bytes::Bytes> + Send + Sync + 'static,
        S::Error: Into<Box<dyn std::error::Error + Send + Sync>> + Send + Sync,
    {
        let url = self.endpoints.upload_url("multipart");
        let file: File = self
            .drive_client
            .post_multipart(&url, &ID_FIELD, metadata, media_type, stream)
            .await?;
        Self::id_of(&url, file)
    }

    /// Ids of the folders named exactly `name`, in the order Drive returns them
    pub async fn find_folders(&self, name: &str) -> DriveResult<Vec<String>> {
        let url = self.endpoints.files_url();
        let request = FilesListRequest::query(&Query::folder_named(name));
        self.list(&request)
            .await
            .and_then(|file| {
                tracing::debug!(
                    id = ?file.id,
                    name = ?file.name,
                    mime_type = ?file.mime_type,
                    "folder match"
                );
                futures::future::ready(Self::id_of(&url, file))
            })
            .try_collect()
            .await
    }

    pub async fn list(
        &self,
        files_list_request: &FilesListRequest,
    ) -> impl Stream<Item = DriveResult<File>> + '_ {
        let files_list_request = files_list_request.to_owned();
        let url = self.endpoints.files_url();
        futures::stream::try_unfold(
            (Some(files_list_request), url),
            move |(state, url)| async move {
                match state {
                    None => Ok(None),
                    Some(state) => {
                        let list: FileList = self.drive_client.get_as_json(&url, &state).await?;
                        let items = futures::stream::iter(list.files).map(Ok);
                        match list.next_page_token {
                            None => Ok(Some((items, (None, url)))),
                            Some(next_token) => {
                                let new_state = FilesListRequest {
                                    page_token: Some(next_token),
                                    ..state
                                };
                                Ok(Some((items, (Some(new_state), url))))
                            }
                        }
                    }
                }
            },
        )
        .try_flatten()
    }
}
