use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Url;
use tracing::trace;

use caaos_model::Etag;

use crate::{config::WatchConfig, errors::WatchError};

/// One answered long-poll: the raw body plus the change token header, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataResponse {
    pub etag: Option<String>,
    pub body: String,
}

/// A single blocking "wait for change" request against the metadata source.
#[async_trait]
pub trait MetadataTransport: Send + Sync {
    async fn fetch(&self, last: &Etag) -> Result<MetadataResponse, WatchError>;
}

#[async_trait]
impl<T: MetadataTransport + ?Sized> MetadataTransport for Arc<T> {
    async fn fetch(&self, last: &Etag) -> Result<MetadataResponse, WatchError> {
        (**self).fetch(last).await
    }
}

/// Metadata server transport over plain HTTP.
pub struct HttpTransport {
    client: reqwest::Client,
    config: WatchConfig,
}

impl HttpTransport {
    pub fn new(config: WatchConfig) -> Result<Self, WatchError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .no_proxy()
            .build()?;
        Ok(Self { client, config })
    }

    fn url_for(&self, last: &Etag) -> Result<Url, WatchError> {
        let timeout = self.config.wait_timeout_sec.to_string();
        Url::parse_with_params(
            &self.config.url,
            &[
                ("recursive", "true"),
                ("alt", "json"),
                ("wait_for_change", "true"),
                ("timeout_sec", timeout.as_str()),
                ("last_etag", last.as_str()),
            ],
        )
        .map_err(|e| WatchError::Url(format!("{}: {e}", self.config.url)))
    }
}

#[async_trait]
impl MetadataTransport for HttpTransport {
    async fn fetch(&self, last: &Etag) -> Result<MetadataResponse, WatchError> {
        let url = self.url_for(last)?;
        trace!(%url, "long-poll metadata");

        let (name, value) = self.config.flavor_header;
        let response = self.client.get(url).header(name, value).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(WatchError::Status(status.as_u16()));
        }
        let etag = response
            .headers()
            .get("etag")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await?;

        Ok(MetadataResponse { etag, body })
    }
}
