//! Outbound HTTP as a capability: "GET this URL, give me status + body, or fail".

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use std::{fmt::Debug, time::Duration};
use tracing::debug;

use crate::error::{LookupError, Outcome, truncate_body};

/// Status and fully-read body of an upstream response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs a GET. Any status is data; only transport failures are `Err`.
#[async_trait]
pub trait HttpFetch: Send + Sync + Debug {
    async fn get(&self, url: &Url) -> anyhow::Result<HttpReply>;
}

/// [`HttpFetch`] backed by a shared `reqwest` client with a per-call timeout.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    http: Client,
}

impl ReqwestFetcher {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { http })
    }
}

#[async_trait]
impl HttpFetch for ReqwestFetcher {
    async fn get(&self, url: &Url) -> anyhow::Result<HttpReply> {
        // reqwest errors embed the full URL, query string (and API key) included.
        let res = self.http.get(url.clone()).send().await.map_err(|e| e.without_url())?;

        let status = res.status().as_u16();
        let body = res.text().await.map_err(|e| e.without_url())?;

        Ok(HttpReply { status, body })
    }
}

/// URL as safe to show to callers: no query string.
pub(crate) fn display_url(url: &Url) -> String {
    let mut shown = url.clone();
    shown.set_query(None);
    shown.to_string()
}

pub(crate) fn parse_endpoint(endpoint: &str) -> Outcome<Url> {
    Url::parse(endpoint).map_err(|e| LookupError::InvalidEndpoint {
        url: endpoint.to_string(),
        reason: e.to_string(),
    })
}

/// Sends the request and turns transport failures and non-2xx statuses into [`LookupError`]s.
pub(crate) async fn fetch(http: &dyn HttpFetch, url: &Url) -> Outcome<HttpReply> {
    let shown = display_url(url);
    debug!(url = %shown, "sending upstream request");

    let reply = http
        .get(url)
        .await
        .map_err(|e| LookupError::Transport { url: shown.clone(), reason: format!("{e:#}") })?;

    if !reply.is_success() {
        return Err(LookupError::UpstreamStatus {
            url: shown,
            status: reply.status,
            body: truncate_body(&reply.body),
        });
    }

    Ok(reply)
}

/// Decodes a JSON object body into `T`, whose fields should all be `Option`s.
///
/// Blank bodies, `null` and `{}` are reported as empty; anything that is not an
/// object, or whose fields have the wrong type, is malformed.
pub(crate) fn decode_object<T: DeserializeOwned>(url: &Url, body: &str) -> Outcome<T> {
    let shown = display_url(url);

    if body.trim().is_empty() {
        return Err(LookupError::EmptyResponse { url: shown });
    }

    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| LookupError::malformed(&shown, e.to_string()))?;

    match &value {
        serde_json::Value::Null => return Err(LookupError::EmptyResponse { url: shown }),
        serde_json::Value::Object(map) if map.is_empty() => {
            return Err(LookupError::EmptyResponse { url: shown });
        }
        serde_json::Value::Object(_) => {}
        _ => return Err(LookupError::malformed(&shown, "expected a JSON object")),
    }

    serde_json::from_value(value).map_err(|e| LookupError::malformed(shown, e.to_string()))
}
