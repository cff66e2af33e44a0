//! The remote post store seam and its HTTP implementation.

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use shared::{
    error::ApiError,
    protocol::{CreatePostRequest, Post},
};
use tracing::debug;
use url::Url;

use crate::error::StoreError;

/// Remote collection of posts. Ids and timestamps are assigned by the store.
#[async_trait]
pub trait PostStore: Send + Sync {
    async fn get_posts(&self) -> Result<Vec<Post>, StoreError>;
    async fn create_post(&self, title: &str, body: &str, author: &str)
        -> Result<Post, StoreError>;
}

pub struct HttpPostStore {
    http: Client,
    posts_url: Url,
}

impl HttpPostStore {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build http client")?;
        Self::with_client(http, base_url)
    }

    pub fn with_client(http: Client, base_url: &str) -> Result<Self> {
        let posts_url = posts_url(base_url)?;
        Ok(Self { http, posts_url })
    }
}

fn posts_url(base_url: &str) -> Result<Url> {
    let mut base = Url::parse(base_url.trim())
        .with_context(|| format!("invalid post store url '{base_url}'"))?;
    if base.cannot_be_a_base() || !matches!(base.scheme(), "http" | "https") {
        bail!("post store url must be http(s): '{base_url}'");
    }
    // Url::join replaces the last segment unless the path ends in a slash.
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join("posts")
        .with_context(|| format!("failed to derive posts url from '{base_url}'"))
}

async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.bytes().await.unwrap_or_default();
    match serde_json::from_slice::<ApiError>(&body) {
        Ok(api_error) => Err(anyhow!("store returned {status}: {api_error}")),
        Err(_) if body.is_empty() => Err(anyhow!("store returned {status}")),
        Err(_) => Err(anyhow!(
            "store returned {status}: {}",
            String::from_utf8_lossy(&body)
        )),
    }
}

#[async_trait]
impl PostStore for HttpPostStore {
    async fn get_posts(&self) -> Result<Vec<Post>, StoreError> {
        debug!(url = %self.posts_url, "GET posts");
        let response = self
            .http
            .get(self.posts_url.clone())
            .send()
            .await
            .map_err(StoreError::fetch)?;
        let response = ensure_success(response).await.map_err(StoreError::fetch)?;
        response.json().await.map_err(StoreError::fetch)
    }

    async fn create_post(
        &self,
        title: &str,
        body: &str,
        author: &str,
    ) -> Result<Post, StoreError> {
        debug!(url = %self.posts_url, "POST posts");
        let response = self
            .http
            .post(self.posts_url.clone())
            .json(&CreatePostRequest {
                title: title.to_string(),
                body: body.to_string(),
                author: author.to_string(),
            })
            .send()
            .await
            .map_err(StoreError::create)?;
        let response = ensure_success(response)
            .await
            .map_err(StoreError::create)?;
        response.json().await.map_err(StoreError::create)
    }
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
