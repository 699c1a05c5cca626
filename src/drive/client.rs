// Google Drive v2 REST client

use futures_util::future::{BoxFuture, FutureExt};
use tracing::debug;

use super::models::{DriveFile, FilePage};
use crate::error::{Error, Result};

pub const DRIVE_API_BASE_URL: &str = "https://www.googleapis.com";

/// The two remote calls the indexer and the player depend on
pub trait FileSource: Send + Sync {
    /// List one page of files matching the configured query
    fn list_files(&self, page_token: Option<String>) -> BoxFuture<'_, Result<FilePage>>;

    /// Fetch a single file resource, e.g. for a fresh download URL
    fn get_file(&self, file_id: String) -> BoxFuture<'_, Result<DriveFile>>;

    /// Bearer token for direct downloads of listed files
    fn access_token(&self) -> &str;
}

pub struct DriveClient {
    base_url: String,
    access_token: String,
    query: String,
    client: reqwest::Client,
}

impl DriveClient {
    pub fn new(
        base_url: impl Into<String>,
        access_token: impl Into<String>,
        query: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            base_url: base_url.into(),
            access_token: access_token.into(),
            query: query.into(),
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()?,
        })
    }

    pub fn production(access_token: impl Into<String>, query: impl Into<String>) -> Result<Self> {
        Self::new(DRIVE_API_BASE_URL, access_token, query)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .query(params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api { status, body });
        }

        Ok(response.json().await?)
    }

    /// `GET /drive/v2/files` with the audio query and an optional page token
    pub async fn list_audio_files(&self, page_token: Option<&str>) -> Result<FilePage> {
        let url = format!("{}/drive/v2/files", self.base_url);
        let mut params = vec![("q", self.query.as_str())];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }

        let page: FilePage = self.get_json(&url, &params).await?;
        debug!(
            "Listed {} files (more pages: {})",
            page.items.len(),
            page.next_page_token.is_some()
        );
        Ok(page)
    }

    /// `GET /drive/v2/files/{id}`
    pub async fn get_file_metadata(&self, file_id: &str) -> Result<DriveFile> {
        let url = format!("{}/drive/v2/files/{}", self.base_url, urlencoding::encode(file_id));
        self.get_json(&url, &[]).await
    }
}

impl FileSource for DriveClient {
    fn list_files(&self, page_token: Option<String>) -> BoxFuture<'_, Result<FilePage>> {
        async move { self.list_audio_files(page_token.as_deref()).await }.boxed()
    }

    fn get_file(&self, file_id: String) -> BoxFuture<'_, Result<DriveFile>> {
        async move { self.get_file_metadata(&file_id).await }.boxed()
    }

    fn access_token(&self) -> &str {
        &self.access_token
    }
}
