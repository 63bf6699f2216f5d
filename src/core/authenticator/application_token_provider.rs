use std::path::Path;

use async_trait::async_trait;
use log::error;
use mockall::automock;
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncWriteExt},
};

/// The app token is a long-lived secret the caller must keep across
/// runs; a fresh authorization round is the only way to get it back.
#[automock]
#[async_trait]
pub trait ApplicationTokenProvider: Send + Sync {
    async fn store(&self, token: String) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    async fn get(&self) -> Result<String, Box<dyn std::error::Error + Send + Sync>>;
}

#[derive(Clone)]
pub struct FileSystemProvider {
    path: String,
}

impl FileSystemProvider {
    pub fn new(data_dir: String) -> Self {
        let path = FileSystemProvider::get_token_file_path(data_dir);
        Self { path }
    }

    pub fn get_token_file_path(data_dir: String) -> String {
        let sep = if cfg!(windows) { '\\' } else { '/' };
        format!("{}{}{}", data_dir, sep, "token.dat")
    }
}

#[async_trait]
impl ApplicationTokenProvider for FileSystemProvider {
    async fn store(&self, token: String) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let path = Path::new(&self.path);

        if path.exists() {
            std::fs::remove_file(path)?;
        }

        let mut file = File::create(path).await?;

        if let Err(e) = file.write_all(token.as_bytes()).await {
            file.shutdown().await?;
            return Err(Box::new(e));
        }

        file.shutdown().await?;

        Ok(())
    }

    async fn get(&self) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let path = Path::new(self.path.as_str());

        if !path.exists() {
            error!(
                "file does not exist {}, did you register the application? See register command",
                self.path
            );
            return Err(Box::new(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("file does not exist {}", self.path),
            )));
        }

        let mut file = File::open(&self.path).await?;
        let mut buffer = vec![];

        file.read_to_end(&mut buffer).await?;

        let token = String::from_utf8(buffer)?;

        Ok(token.trim().to_string())
    }
}
