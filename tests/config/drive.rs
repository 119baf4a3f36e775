use std::path::PathBuf;

use drive_republish::{
    drive::{Endpoints, DRIVE_FILE_SCOPE},
    oauth2::token::ServiceAccountCredentials,
    publish::PublishConfig,
};
use wiremock::{
    matchers::{body_string_contains, method, path},
    Mock, MockServer, ResponseTemplate,
};

use super::fs::FsTestConfig;

pub const ACCESS_TOKEN: &str = "ya29.test-access-token";
#[allow(dead_code)]
pub const CLIENT_EMAIL: &str = "publisher@rps-test.iam.gserviceaccount.com";
const PRIVATE_KEY: &str = include_str!("../fixtures/test-private-key.pem");

pub struct DriveTestConfig {
    server: MockServer,
    fs: FsTestConfig,
}

#[allow(dead_code)] //remove this when this issue will be fixed: https://github.com/rust-lang/rust/issues/46379
impl DriveTestConfig {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
            fs: FsTestConfig::new().await,
        }
    }

    pub fn server(&self) -> &MockServer {
        &self.server
    }

    pub fn fs(&self) -> &FsTestConfig {
        &self.fs
    }

    pub fn token_uri(&self) -> String {
        format!("{}/token", self.server.uri())
    }

    pub fn endpoints(&self) -> Endpoints {
        Endpoints::with_base_url(&self.server.uri())
    }

    pub fn service_account_json(&self) -> String {
        serde_json::json!({
            "type": "service_account",
            "project_id": "rps-test",
            "private_key_id": "0123456789abcdef",
            "private_key": PRIVATE_KEY,
            "client_email": CLIENT_EMAIL,
            "client_id": "1234567890",
            "auth_uri": "https://accounts.google.com/o/oauth2/auth",
            "token_uri": self.token_uri(),
            "auth_provider_x509_cert_url": "https://www.googleapis.com/oauth2/v1/certs",
            "client_x509_cert_url": "https://www.googleapis.com/robot/v1/metadata/x509/publisher"
        })
        .to_string()
    }

    pub fn service_account(&self) -> ServiceAccountCredentials {
        ServiceAccountCredentials::from(&self.service_account_json())
            .unwrap()
            .with_scope(DRIVE_FILE_SCOPE)
    }

    /// Source dir and key file both live in a fresh temp dir
    pub async fn publish_config(&self) -> PublishConfig {
        let key_file = self
            .fs
            .write("service-account.json", &self.service_account_json())
            .await;
        let source_dir = self.fs.file_path("contracts");
        tokio::fs::create_dir_all(&source_dir).await.unwrap();
        PublishConfig::default()
            .with_key_file(key_file.as_path())
            .with_source_dir(source_dir.as_path())
    }

    pub async fn write_source(&self, file_name: &str, content: &str) -> PathBuf {
        self.fs.write(&format!("contracts/{}", file_name), content).await
    }

    pub async fn mount_token(&self) {
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains(
                "grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": ACCESS_TOKEN,
                "expires_in": 3599,
                "token_type": "Bearer"
            })))
            .mount(&self.server)
            .await;
    }
}
