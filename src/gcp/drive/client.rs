use super::{DriveResult, Error};
use crate::gcp::{
    oauth2::token::{AccessToken, Token, TokenGenerator},
    Client,
};
use bytes::BufMut;
use futures::{
    stream,
    stream::{StreamExt, TryStream, TryStreamExt},
};
use reqwest::RequestBuilder;
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::RwLock;

#[derive(Debug)]
struct TokenStateHolder {
    client: Client,
    token_generator: Box<dyn TokenGenerator>,
    token: RwLock<Token>,
}

impl TokenStateHolder {
    async fn new(client: Client, token_generator: Box<dyn TokenGenerator>) -> DriveResult<Self> {
        let token = token_generator
            .get(&client)
            .await
            .map_err(Error::DriveTokenError)?;
        Ok(Self {
            client,
            token_generator,
            token: RwLock::new(token),
        })
    }

    async fn get_token(&self) -> Option<AccessToken> {
        let t = self.token.read().await;

        if t.is_valid() {
            Some(t.access_token())
        } else {
            None
        }
    }

    async fn refresh_token(&self) -> DriveResult<AccessToken> {
        if let Some(token) = self.get_token().await {
            Ok(token)
        } else {
            tracing::debug!("access token expired, requesting a new one");
            let t = self
                .token_generator
                .get(&self.client)
                .await
                .map_err(Error::DriveTokenError)?;
            let access_token = t.access_token();
            *self.token.write().await = t;
            Ok(access_token)
        }
    }
}

#[derive(Debug)]
pub(super) struct DriveClient {
    client: Client,
    token_state_holder: TokenStateHolder,
}

const MT_METADATA_TYPE: &[u8] = b"Content-Type: application/json; charset=UTF-8\r\n\r\n";

/// Delimiters of one `multipart/related` body, fresh per request
#[derive(Debug)]
struct Multipart {
    boundary: String,
}

impl Multipart {
    fn new() -> Self {
        Self {
            boundary: format!("drive-republish-{}", uuid::Uuid::new_v4().simple()),
        }
    }

    fn content_type(&self) -> String {
        format!("multipart/related; boundary={}", self.boundary)
    }

    /// Metadata part followed by the headers of the media part
    fn head(&self, json: &[u8], media_type: &str) -> bytes::Bytes {
        let separator = format!("--{}\r\n", self.boundary);
        let content_type = format!("Content-Type: {}\r\n\r\n", media_type);

        let part_len = 2 * separator.len()
            + MT_METADATA_TYPE.len()
            + json.len()
            + content_type.len()
            + 2;
        let mut part = bytes::BytesMut::with_capacity(part_len);
        part.put_slice(separator.as_bytes());
        part.put_slice(MT_METADATA_TYPE);
        part.put_slice(json);
        part.put_slice(b"\r\n");
        part.put_slice(separator.as_bytes());
        part.put_slice(content_type.as_bytes());
        part.freeze()
    }

    fn tail(&self) -> bytes::Bytes {
        bytes::Bytes::from(format!("\r\n--{}--\r\n", self.boundary))
    }
}

impl DriveClient {
    pub async fn new(token_generator: Box<dyn TokenGenerator>) -> DriveResult<Self> {
        let client = Client::default();
        let token_state_holder = TokenStateHolder::new(client.clone(), token_generator).await?;

        Ok(Self {
            client,
            token_state_holder,
        })
    }

    async fn success_response(
        url: &str,
        response: reqwest::Response,
    ) -> DriveResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::DriveResourceNotFound {
                url: url.to_owned(),
            });
        }

        let err = response.text().await.map_err(Error::DriveHttpError)?;
        Err(Error::unexpected_response_error(url, status, err))
    }

    async fn with_auth(&self, request_builder: RequestBuilder) -> DriveResult<RequestBuilder> {
        let access_token = self.token_state_holder.refresh_token().await?;
        Ok(request_builder.bearer_auth(access_token))
    }

    async fn json_response<R>(url: &str, response: reqwest::Response) -> DriveResult<R>
    where
        R: DeserializeOwned,
    {
        let r: super::super::DeserializedResponse<R> = Self::success_response(url, response)
            .await?
            .json()
            .await
            .map_err(Error::DriveHttpError)?;
        r.into_result()
            .map_err(|err| Error::unexpected_json::<R>(url, err))
    }

    pub async fn delete(&self, url: &str) -> DriveResult<()> {
        tracing::debug!(%url, "DELETE");
        let request = self.with_auth(self.client.client.delete(url)).await?;
        let response = request.send().await.map_err(Error::DriveHttpError)?;
        Self::success_response(url, response).await?;
        Ok(())
    }

    pub async fn get_as_json<R, Q>(&self, url: &str, query: &Q) -> DriveResult<R>
    where
        R: DeserializeOwned,
        Q: Serialize,
    {
        tracing::debug!(%url, "GET");
        let request = self
            .with_auth(self.client.client.get(url).query(query))
            .await?;
        let response = request.send().await.map_err(Error::DriveHttpError)?;
        Self::json_response(url, response).await
    }

    pub async fn post_json<R, Q, B>(&self, url: &str, query: &Q, body: &B) -> DriveResult<R>
    where
        R: DeserializeOwned,
        Q: Serialize,
        B: Serialize,
    {
        tracing::debug!(%url, "POST");
        let request = self
            .with_auth(self.client.client.post(url).query(query).json(body))
            .await?;
        let response = request.send().await.map_err(Error::DriveHttpError)?;
        Self::json_response(url, response).await
    }

    // Specs: https://developers.google.com/drive/api/guides/manage-uploads#multipart
    // POST https://www.googleapis.com/upload/drive/v3/files?uploadType=multipart&fields=id HTTP/1.1
    // Authorization: Bearer <Token>
    // Content-Type: multipart/related; boundary=<Boundary>
    //
    // --<Boundary>
    // Content-Type: application/json; charset=UTF-8
    //
    // {"name":"RPS.json","parents":["<FolderId>"]}
    // --<Boundary>
    // Content-Type: text/json
    //
    // <FileStream>
    // --<Boundary>--
    pub async fn post_multipart<R, Q, M, S>(
        &self,
        url: &str,
        query: &Q,
        metadata: &M,
        media_type: &str,
        body: S,
    ) -> DriveResult<R>
    where
        R: DeserializeOwned,
        Q: Serialize,
        M: Serialize,
        S: TryStream<Ok = bytes::Bytes> + Send + Sync + 'static,
        S::Error: Into<Box<dyn std::error::Error + Send + Sync>> + Send + Sync,
    {
        let json = serde_json::ser::to_vec(metadata).map_err(Error::invalid_metadata::<M>)?;
        let multipart = Multipart::new();
        let mbody = stream::iter([Ok(multipart.head(&json, media_type))])
            .chain(body.into_stream())
            .chain(stream::iter([Ok(multipart.tail())]));

        tracing::debug!(%url, %media_type, "POST multipart");
        let request = self.client.client.post(url).query(query);
        let request = self.with_auth(request).await?;
        let response = request
            .header("Content-Type", multipart.content_type())
            .body(reqwest::Body::wrap_stream(mbody))
            .send()
            .await
            .map_err(Error::DriveHttpError)?;

        Self::json_response(url, response).await
    }
}
