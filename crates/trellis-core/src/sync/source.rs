//! External source adapters.
//!
//! Adapters own pagination and authentication; the runner only ever sees
//! materialized records. Sources are passed in explicitly (no process-wide
//! singleton clients), which keeps the runner pure enough to test against a
//! stub.

use std::path::PathBuf;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::error::SyncError;
use super::record::{ExternalPersonRecord, ExternalRecord};

/// A source of external tracker records.
#[async_trait]
pub trait ExternalSource: Send + Sync {
    /// Human-readable source name for logs and reports.
    fn name(&self) -> &str;

    /// Fetches all entity records.
    async fn fetch_entities(&self) -> Result<Vec<ExternalRecord>, SyncError>;

    /// Fetches all person records.
    async fn fetch_persons(&self) -> Result<Vec<ExternalPersonRecord>, SyncError>;
}

/// Shape of a JSON export file.
#[derive(Debug, Default, Deserialize)]
struct ExportFile {
    #[serde(default)]
    entities: Vec<ExternalRecord>,
    #[serde(default)]
    persons: Vec<ExternalPersonRecord>,
}

/// Reads records from a JSON export dumped out of a tracker.
pub struct JsonExportSource {
    path: PathBuf,
}

impl JsonExportSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read(&self) -> Result<ExportFile, SyncError> {
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| SyncError::io(&self.path, e))?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[async_trait]
impl ExternalSource for JsonExportSource {
    fn name(&self) -> &str {
        self.path.to_str().unwrap_or("json export")
    }

    async fn fetch_entities(&self) -> Result<Vec<ExternalRecord>, SyncError> {
        Ok(self.read()?.entities)
    }

    async fn fetch_persons(&self) -> Result<Vec<ExternalPersonRecord>, SyncError> {
        Ok(self.read()?.persons)
    }
}

/// One page of a paginated listing endpoint.
#[derive(Debug, Deserialize)]
struct PageResponse<T> {
    #[serde(default)]
    items: Vec<T>,
    #[serde(default)]
    next_page: Option<u32>,
}

const DEFAULT_PAGE_SIZE: usize = 100;

/// Fetches records from a REST tracker API.
///
/// Expects `GET {base}/entities` and `GET {base}/persons` returning
/// `{ "items": [...], "next_page": n }` pages.
pub struct RestSource {
    client: Client,
    base_url: String,
    api_token: Option<String>,
    page_size: usize,
}

impl RestSource {
    pub fn new(base_url: impl Into<String>, api_token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_token,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    async fn fetch_all<T: serde::de::DeserializeOwned + Default>(
        &self,
        resource: &str,
    ) -> Result<Vec<T>, SyncError> {
        let mut items = Vec::new();
        let mut page: u32 = 1;

        loop {
            let url = format!(
                "{}/{}?page={}&page_size={}",
                self.base_url, resource, page, self.page_size
            );
            let mut req = self.client.get(&url);
            if let Some(token) = &self.api_token {
                if !token.is_empty() {
                    req = req.header("authorization", format!("Bearer {token}"));
                }
            }

            let response = req.send().await?;
            let status = response.status();
            if !status.is_success() {
                let message = response.text().await.unwrap_or_default();
                return Err(SyncError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let body: PageResponse<T> = response
                .json()
                .await
                .map_err(|e| SyncError::Parse(e.to_string()))?;
            debug!(resource, page, count = body.items.len(), "fetched page");
            items.extend(body.items);

            match body.next_page {
                Some(next) if next > page => page = next,
                _ => break,
            }
        }

        Ok(items)
    }
}

#[async_trait]
impl ExternalSource for RestSource {
    fn name(&self) -> &str {
        &self.base_url
    }

    async fn fetch_entities(&self) -> Result<Vec<ExternalRecord>, SyncError> {
        self.fetch_all("entities").await
    }

    async fn fetch_persons(&self) -> Result<Vec<ExternalPersonRecord>, SyncError> {
        self.fetch_all("persons").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_export_source_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.json");
        std::fs::write(
            &path,
            r#"{
                "entities": [
                    {"external_id": "EXT-1", "title": "Login", "kind": "feature"}
                ],
                "persons": [
                    {"external_id": "U-1", "name": "Alice"}
                ]
            }"#,
        )
        .unwrap();

        let source = JsonExportSource::new(&path);
        let export = source.read().unwrap();
        assert_eq!(export.entities.len(), 1);
        assert_eq!(export.entities[0].external_id, "EXT-1");
        assert_eq!(export.entities[0].field("title"), "Login");
        assert_eq!(export.persons[0].name, "Alice");
    }

    #[test]
    fn test_json_export_source_missing_file() {
        let source = JsonExportSource::new("/no/such/export.json");
        assert!(matches!(source.read(), Err(SyncError::Io { .. })));
    }
}
