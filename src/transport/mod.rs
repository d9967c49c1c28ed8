//! HTTP transport abstraction.
//!
//! Everything that talks to the bridge or the cloud discovery service goes
//! through the [`Transport`] trait, so the discovery and synchronisation
//! logic can be driven by a scripted transport in tests.
//!
//! The default implementation, [`HttpTransport`], is backed by `reqwest`.
//! TLS for the cloud lookup is selected with the `rustls-tls` (default) or
//! `native-tls` feature.

use std::future::Future;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::Error;

mod reqwest_impl;

#[cfg(test)]
pub(crate) mod mock;

pub use reqwest_impl::HttpTransport;

type Result<T> = std::result::Result<T, Error>;

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub url: String,
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(url: &str, status: u16, body: impl Into<String>) -> Self {
        HttpResponse {
            url: url.to_string(),
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn a non-2xx status into [`Error::Status`].
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(Error::Status {
                url: self.url,
                status: self.status,
            })
        }
    }

    /// Deserialize the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body).map_err(Error::JsonLoad)
    }
}

/// Trait for the HTTP operations the bridge API needs.
///
/// Every call carries its own timeout; an expired timeout must surface as
/// [`Error::TimedOut`].
pub trait Transport: Clone + Send + Sync + 'static {
    /// GET the given URL.
    fn get(
        &self,
        url: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<HttpResponse>> + Send;

    /// POST a JSON body to the given URL.
    fn post_json(
        &self,
        url: &str,
        body: &Value,
        timeout: Duration,
    ) -> impl Future<Output = Result<HttpResponse>> + Send;

    /// PUT a JSON body to the given URL.
    fn put_json(
        &self,
        url: &str,
        body: &Value,
        timeout: Duration,
    ) -> impl Future<Output = Result<HttpResponse>> + Send;
}
