//! Scripted transport for tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;

use super::{HttpResponse, Transport};
use crate::errors::Error;

type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Method {
    Get,
    Post,
    Put,
}

#[derive(Debug, Clone)]
enum Reply {
    Respond(u16, String),
    TimeOut,
}

#[derive(Debug, Clone)]
pub(crate) struct Recorded {
    pub method: Method,
    pub url: String,
    pub body: Option<Value>,
    pub timeout: Duration,
}

#[derive(Debug, Default)]
struct State {
    routes: HashMap<(Method, String), Reply>,
    requests: Vec<Recorded>,
}

/// Answers from a fixed route table; unknown URLs time out.
#[derive(Debug, Clone, Default)]
pub(crate) struct MockTransport {
    state: Arc<Mutex<State>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn route(&self, method: Method, url: &str, reply: Reply) {
        self.state
            .lock()
            .unwrap()
            .routes
            .insert((method, url.to_string()), reply);
    }

    pub fn on_get(&self, url: &str, status: u16, body: &str) -> &Self {
        self.route(Method::Get, url, Reply::Respond(status, body.to_string()));
        self
    }

    pub fn on_post(&self, url: &str, status: u16, body: &str) -> &Self {
        self.route(Method::Post, url, Reply::Respond(status, body.to_string()));
        self
    }

    pub fn on_put(&self, url: &str, status: u16, body: &str) -> &Self {
        self.route(Method::Put, url, Reply::Respond(status, body.to_string()));
        self
    }

    pub fn time_out(&self, method: Method, url: &str) -> &Self {
        self.route(method, url, Reply::TimeOut);
        self
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn count(&self, method: Method, url: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == method && r.url == url)
            .count()
    }

    pub fn bodies(&self, method: Method, url: &str) -> Vec<Value> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.url == url)
            .filter_map(|r| r.body)
            .collect()
    }

    fn answer(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
        timeout: Duration,
    ) -> Result<HttpResponse> {
        let mut state = self.state.lock().unwrap();
        state.requests.push(Recorded {
            method,
            url: url.to_string(),
            body: body.cloned(),
            timeout,
        });
        match state.routes.get(&(method, url.to_string())) {
            Some(Reply::Respond(status, body)) => Ok(HttpResponse::new(url, *status, body.clone())),
            Some(Reply::TimeOut) | None => Err(Error::timed_out(url)),
        }
    }
}

impl Transport for MockTransport {
    async fn get(&self, url: &str, timeout: Duration) -> Result<HttpResponse> {
        self.answer(Method::Get, url, None, timeout)
    }

    async fn post_json(&self, url: &str, body: &Value, timeout: Duration) -> Result<HttpResponse> {
        self.answer(Method::Post, url, Some(body), timeout)
    }

    async fn put_json(&self, url: &str, body: &Value, timeout: Duration) -> Result<HttpResponse> {
        self.answer(Method::Put, url, Some(body), timeout)
    }
}
