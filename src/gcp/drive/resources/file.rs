use std::fmt::Display;

use crate::drive::{Endpoints, FOLDER_MIME_TYPE};

/// See [Drive files list API reference](https://developers.google.com/drive/api/reference/rest/v3/files/list)
#[derive(Debug, PartialEq, Eq, serde::Serialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct FilesListRequest {
    pub q: Option<String>,
    /// [Partial Response](https://developers.google.com/drive/api/guides/fields-parameter)
    pub fields: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,
}

impl FilesListRequest {
    pub fn query(q: &Query) -> Self {
        Self {
            q: Some(q.to_string()),
            fields: Some("nextPageToken,files(id,name,mimeType)".to_owned()),
            ..Default::default()
        }
    }
}

/// Body of a files create call
#[derive(Debug, PartialEq, Eq, serde::Serialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<String>,
}

impl FileMetadata {
    pub fn folder(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            mime_type: Some(FOLDER_MIME_TYPE.to_owned()),
            parents: Vec::new(),
        }
    }

    pub fn child(name: &str, parent_id: &str) -> Self {
        Self {
            name: name.to_owned(),
            mime_type: None,
            parents: vec![parent_id.to_owned()],
        }
    }
}

/// FileList response
#[derive(Debug, serde::Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FileList {
    #[serde(default = "Vec::new")]
    pub files: Vec<File>,

    pub next_page_token: Option<String>,
}

/// Partial file resource: only the requested `fields` are present
#[derive(Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct File {
    pub id: Option<String>,
    pub name: Option<String>,
    pub mime_type: Option<String>,
}

/// A `q` expression of the files list call.
///
/// String literals are quoted and escaped, so a name holding `'` still matches that exact name.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Query {
    expr: String,
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

impl Query {
    pub fn name_eq(name: &str) -> Self {
        Self {
            expr: format!("name='{}'", escape(name)),
        }
    }

    pub fn mime_type_eq(mime_type: &str) -> Self {
        Self {
            expr: format!("mimeType='{}'", escape(mime_type)),
        }
    }

    pub fn folder_named(name: &str) -> Self {
        Self::name_eq(name).and(Self::mime_type_eq(FOLDER_MIME_TYPE))
    }

    pub fn and(self, other: Query) -> Self {
        Self {
            expr: format!("{} and {}", self.expr, other.expr),
        }
    }
}

impl Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.expr)
    }
}

/// RFC 3986 unreserved characters stay as is, Drive ids are made of them
const PATH_SEGMENT: &percent_encoding::AsciiSet = &percent_encoding::NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

fn percent_encode(input: &str) -> String {
    percent_encoding::utf8_percent_encode(input, PATH_SEGMENT).to_string()
}

impl Endpoints {
    pub fn files_url(&self) -> String {
        format!("{}/files", self.api_url)
    }

    pub fn file_url(&self, file_id: &str) -> String {
        format!("{}/files/{}", self.api_url, percent_encode(file_id))
    }

    pub fn upload_url(&self, upload_type: &str) -> String {
        format!("{}/files?uploadType={}", self.upload_url, upload_type)
    }
}
