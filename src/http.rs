//! HTTP request/response fixture.
//!
//! Every exchange with the implementation under test keeps a textual summary of the
//! request and response so that failed tests can report what was actually sent and
//! received.

use bytes::Bytes;
use indexmap::IndexMap;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap};
use reqwest::{Client, Request, StatusCode};
use std::fmt;
use std::time::Duration;
use url::Url;

use crate::error::EtsResult;

/// Parts of an HTTP message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessagePart {
    /// Target resource (from request line)
    Target,
    /// Status code (from status line)
    Status,
    Headers,
    Body,
}

impl fmt::Display for MessagePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MessagePart::Target => "TARGET",
            MessagePart::Status => "STATUS",
            MessagePart::Headers => "HEADERS",
            MessagePart::Body => "BODY",
        };
        f.write_str(name)
    }
}

/// Summary of an HTTP message, keyed by message part in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageInfo {
    parts: IndexMap<MessagePart, String>,
}

impl MessageInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, part: MessagePart, value: impl Into<String>) {
        self.parts.insert(part, value.into());
    }

    pub fn get(&self, part: MessagePart) -> Option<&str> {
        self.parts.get(&part).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Summarizes the message content for diagnostic purposes.
    pub fn summarize(&self) -> String {
        let mut info = String::new();
        for (part, value) in &self.parts {
            info.push_str(&part.to_string());
            info.push_str(":\n");
            info.push_str(value);
            info.push('\n');
        }
        info
    }
}

fn format_headers(headers: &HeaderMap) -> String {
    headers
        .iter()
        .map(|(name, value)| format!("{}: {}", name, String::from_utf8_lossy(value.as_bytes())))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Summary of an outgoing request.
pub fn request_info(request: &Request) -> MessageInfo {
    let mut info = MessageInfo::new();
    info.insert(
        MessagePart::Target,
        format!("{} {}", request.method(), request.url()),
    );
    if !request.headers().is_empty() {
        info.insert(MessagePart::Headers, format_headers(request.headers()));
    }
    if let Some(body) = request.body().and_then(|b| b.as_bytes()) {
        info.insert(MessagePart::Body, String::from_utf8_lossy(body).to_string());
    }
    info
}

/// A completed request/response exchange.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub request: MessageInfo,
    pub response: MessageInfo,
}

impl Exchange {
    /// Content type essence (no parameters), lower-cased.
    pub fn media_type(&self) -> Option<String> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(|v| v.trim().to_ascii_lowercase())
            .filter(|v| !v.is_empty())
    }

    /// Response entity as (lossy) UTF-8 text.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }
}

/// Client component for interacting with the implementation under test.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> EtsResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ets-cat30/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    /// Build a GET request with query parameters and an `Accept` header listing the
    /// given media ranges in order of preference.
    pub fn build_get(
        &self,
        url: &Url,
        query: &[(&str, &str)],
        accept: &[&str],
    ) -> EtsResult<Request> {
        let mut builder = self.client.get(url.clone());
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if !accept.is_empty() {
            builder = builder.header(ACCEPT, accept.join(", "));
        }
        Ok(builder.build()?)
    }

    pub async fn execute(&self, request: Request) -> EtsResult<Exchange> {
        let request_summary = request_info(&request);
        tracing::debug!("Sending {} {}", request.method(), request.url());

        let response = self.client.execute(request).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        let mut response_summary = MessageInfo::new();
        response_summary.insert(MessagePart::Status, status.as_u16().to_string());
        response_summary.insert(MessagePart::Headers, format_headers(&headers));
        if !body.is_empty() {
            response_summary.insert(MessagePart::Body, String::from_utf8_lossy(&body).to_string());
        }
        tracing::debug!("Received status {} ({} bytes)", status, body.len());

        Ok(Exchange {
            status,
            headers,
            body,
            request: request_summary,
            response: response_summary,
        })
    }

    pub async fn get(
        &self,
        url: &Url,
        query: &[(&str, &str)],
        accept: &[&str],
    ) -> EtsResult<Exchange> {
        let request = self.build_get(url, query, accept)?;
        self.execute(request).await
    }
}
