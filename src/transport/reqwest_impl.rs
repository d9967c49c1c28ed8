//! reqwest-backed transport.

use std::time::Duration;

use log::debug;
use serde_json::Value;

use super::{HttpResponse, Transport};
use crate::errors::Error;

type Result<T> = std::result::Result<T, Error>;

/// HTTP transport built on a shared `reqwest::Client`.
///
/// Cloning is cheap; all clones share one connection pool.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing client, e.g. one configured with a proxy.
    pub fn with_client(client: reqwest::Client) -> Self {
        HttpTransport { client }
    }

    async fn execute(
        &self,
        action: &str,
        url: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<HttpResponse> {
        let response = request.send().await.map_err(|e| map_error(action, url, e))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| map_error("read body", url, e))?;
        debug!("{action} {url} -> {status}");
        Ok(HttpResponse::new(url, status, body))
    }
}

impl Transport for HttpTransport {
    async fn get(&self, url: &str, timeout: Duration) -> Result<HttpResponse> {
        let request = self.client.get(url).timeout(timeout);
        self.execute("get", url, request).await
    }

    async fn post_json(&self, url: &str, body: &Value, timeout: Duration) -> Result<HttpResponse> {
        let request = self.client.post(url).json(body).timeout(timeout);
        self.execute("post", url, request).await
    }

    async fn put_json(&self, url: &str, body: &Value, timeout: Duration) -> Result<HttpResponse> {
        let request = self.client.put(url).json(body).timeout(timeout);
        self.execute("put", url, request).await
    }
}

fn map_error(action: &str, url: &str, err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::timed_out(url)
    } else {
        Error::http(action, err)
    }
}
