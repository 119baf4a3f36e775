use std::path::PathBuf;

pub struct FsTestConfig {
    base_path: PathBuf,
}

#[allow(dead_code)] //remove this when this issue will be fixed: https://github.com/rust-lang/rust/issues/46379
impl FsTestConfig {
    pub async fn new() -> Self {
        let base_path = {
            let uuid = uuid::Uuid::new_v4().hyphenated().to_string();
            let mut tmp = std::env::temp_dir();
            tmp.push("drive_republish_integration_tests");
            tmp.push(uuid);
            tmp
        };
        tokio::fs::create_dir_all(&base_path).await.unwrap();
        Self { base_path }
    }

    pub fn base_path(&self) -> PathBuf {
        self.base_path.to_owned()
    }

    pub fn file_path(&self, file_name: &str) -> PathBuf {
        let mut p = self.base_path.clone();
        let file_name = file_name.strip_prefix('/').unwrap_or(file_name);
        p.push(file_name);
        p
    }

    pub async fn write(&self, file_name: &str, content: &str) -> PathBuf {
        let path = self.file_path(file_name);
        tokio::fs::write(&path, content).await.unwrap();
        path
    }
}
