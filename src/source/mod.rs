//! Where a `TaskFeed` comes from.
//!
//! Sources are pure I/O. They know nothing about filters or scoring; the
//! pipeline only ever sees the decoded feed.

pub mod file;
pub mod http;

use async_trait::async_trait;

use crate::config::SourceConfig;
use crate::error::SourceError;
use crate::tasks::TaskFeed;

pub use file::FileSource;
pub use http::HttpSource;

#[async_trait]
pub trait TaskSource: Send + Sync {
    /// Source name reported as `data_source` ("file", "http", "static").
    fn name(&self) -> &str;

    /// Load the current feed.
    async fn load(&self) -> Result<TaskFeed, SourceError>;
}

/// A feed held in memory (fixtures, tests, demos).
pub struct StaticSource {
    feed: TaskFeed,
}

impl StaticSource {
    pub fn new(feed: TaskFeed) -> Self {
        Self { feed }
    }
}

#[async_trait]
impl TaskSource for StaticSource {
    fn name(&self) -> &str {
        "static"
    }

    async fn load(&self) -> Result<TaskFeed, SourceError> {
        Ok(self.feed.clone())
    }
}

/// Build the source described by the server configuration.
pub fn from_config(config: &SourceConfig) -> Box<dyn TaskSource> {
    match config {
        SourceConfig::File(path) => Box::new(FileSource::new(path.clone())),
        SourceConfig::Http(url) => Box::new(HttpSource::new(url.clone())),
    }
}
