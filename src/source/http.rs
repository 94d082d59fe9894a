//! Remote task feed fetched over HTTP.

use async_trait::async_trait;
use tracing::{debug, warn};

use super::TaskSource;
use crate::error::SourceError;
use crate::tasks::TaskFeed;

pub struct HttpSource {
    url: String,
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl TaskSource for HttpSource {
    fn name(&self) -> &str {
        "http"
    }

    async fn load(&self) -> Result<TaskFeed, SourceError> {
        debug!(url = %self.url, "Fetching task feed");
        let resp = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| SourceError::Http {
                url: self.url.clone(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            warn!(url = %self.url, status = status.as_u16(), "Task feed request failed");
            return Err(SourceError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| SourceError::Parse(e.to_string()))?;
        TaskFeed::from_value(body)
    }
}
