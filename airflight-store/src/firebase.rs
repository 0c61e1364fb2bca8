//! Realtime Database REST client.
//!
//! Every location is addressed as `{database_url}/{path}.json`. Reads return
//! `null` for absent locations, `POST` appends a child and answers
//! `{"name": "<pushId>"}`, and conditional writes use the `X-Firebase-ETag` /
//! `if-match` pair.

use std::time::Duration;

use airflight_core::{RemoteStore, StoreError, StorePath, StoreResult};
use airflight_shared::Masked;
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::app_config::StoreConfig;

const ETAG_REQUEST_HEADER: &str = "X-Firebase-ETag";

#[derive(Debug)]
pub struct FirebaseStore {
    client: Client,
    base_url: Url,
    auth_token: Option<Masked<String>>,
}

#[derive(Deserialize)]
struct PushResponse {
    name: String,
}

impl FirebaseStore {
    pub fn new(config: &StoreConfig) -> StoreResult<Self> {
        let mut builder = Client::builder();
        if let Some(seconds) = config.request_timeout_seconds {
            builder = builder.timeout(Duration::from_secs(seconds));
        }
        let client = builder.build().map_err(transport)?;
        Self::with_client(client, &config.database_url, config.auth_token.clone())
    }

    /// Build on a caller-supplied reqwest [`Client`] (proxies, custom TLS).
    pub fn with_client(
        client: Client,
        database_url: &str,
        auth_token: Option<Masked<String>>,
    ) -> StoreResult<Self> {
        let base_url = Url::parse(database_url.trim_end_matches('/'))
            .map_err(|e| StoreError::InvalidPath(format!("{}: {}", database_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(StoreError::InvalidPath(database_url.to_string()));
        }
        Ok(Self {
            client,
            base_url,
            auth_token,
        })
    }

    /// `{base}/{segment}/.../{last}.json?auth=...`
    pub fn url_for(&self, path: &StorePath) -> StoreResult<Url> {
        if let Some(bad) = path.invalid_segment() {
            return Err(StoreError::InvalidPath(bad.to_string()));
        }
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| StoreError::InvalidPath(path.to_string()))?;
            segments.pop_if_empty();
            let all = path.segments();
            if let Some((last, parents)) = all.split_last() {
                segments.extend(parents);
                segments.push(&format!("{}.json", last));
            }
        }
        if let Some(token) = &self.auth_token {
            url.query_pairs_mut().append_pair("auth", token.expose());
        }
        Ok(url)
    }
}

#[async_trait]
impl RemoteStore for FirebaseStore {
    async fn read(&self, path: &StorePath) -> StoreResult<Value> {
        debug!("GET {}", path);
        let resp = self
            .client
            .get(self.url_for(path)?)
            .send()
            .await
            .map_err(transport)?;
        let resp = check_status(resp)?;
        resp.json::<Value>().await.map_err(malformed)
    }

    async fn push(&self, path: &StorePath, record: Value) -> StoreResult<String> {
        debug!("POST {}", path);
        let resp = self
            .client
            .post(self.url_for(path)?)
            .json(&record)
            .send()
            .await
            .map_err(transport)?;
        let resp = check_status(resp)?;
        let body: PushResponse = resp.json().await.map_err(malformed)?;
        Ok(body.name)
    }

    async fn create(&self, path: &StorePath, record: Value) -> StoreResult<bool> {
        let url = self.url_for(path)?;

        debug!("GET {} (etag)", path);
        let resp = self
            .client
            .get(url.clone())
            .header(ETAG_REQUEST_HEADER, "true")
            .send()
            .await
            .map_err(transport)?;
        let resp = check_status(resp)?;
        let etag = resp
            .headers()
            .get(reqwest::header::ETAG)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
            .ok_or_else(|| StoreError::Malformed("missing ETag header".to_string()))?;
        let current: Value = resp.json().await.map_err(malformed)?;
        if !current.is_null() {
            return Ok(false);
        }

        debug!("PUT {} (if-match)", path);
        let resp = self
            .client
            .put(url)
            .header(reqwest::header::IF_MATCH, etag)
            .json(&record)
            .send()
            .await
            .map_err(transport)?;
        if resp.status() == StatusCode::PRECONDITION_FAILED {
            // someone wrote the location between our read and write
            return Ok(false);
        }
        check_status(resp)?;
        Ok(true)
    }

    async fn remove(&self, path: &StorePath) -> StoreResult<()> {
        debug!("DELETE {}", path);
        let resp = self
            .client
            .delete(self.url_for(path)?)
            .send()
            .await
            .map_err(transport)?;
        check_status(resp)?;
        Ok(())
    }
}

fn check_status(resp: Response) -> StoreResult<Response> {
    let status = resp.status();
    if !status.is_success() {
        return Err(StoreError::Status {
            status: status.as_u16(),
        });
    }
    Ok(resp)
}

fn transport(e: reqwest::Error) -> StoreError {
    // reqwest errors carry the URL, which may hold the auth token
    StoreError::Transport(e.without_url().to_string())
}

fn malformed(e: reqwest::Error) -> StoreError {
    StoreError::Malformed(e.without_url().to_string())
}
