//! JSON fixture on disk.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use super::TaskSource;
use crate::error::SourceError;
use crate::tasks::TaskFeed;

pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TaskSource for FileSource {
    fn name(&self) -> &str {
        "file"
    }

    async fn load(&self) -> Result<TaskFeed, SourceError> {
        debug!(path = %self.path.display(), "Loading task feed from file");
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| SourceError::Io {
                path: self.path.display().to_string(),
                source,
            })?;
        TaskFeed::from_json(&raw)
    }
}
