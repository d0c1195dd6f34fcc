use std::{future::Future, pin::Pin, time::Duration};

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

use crate::error::TransportError;

pub type TransportFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, TransportError>> + Send + 'a>>;

/// Response captured from a GET request.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// True when the response looks like an HTML page rather than a JSON document.
    pub fn looks_like_html(&self) -> bool {
        let declared = self
            .content_type
            .as_deref()
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("text/html"));
        declared
            || String::from_utf8_lossy(&self.body)
                .trim_start()
                .starts_with('<')
    }
}

/// Network seam for schema fetches, event posts and drift checks.
pub trait Transport: Send + Sync + 'static {
    /// GETs `url`, attaching `Authorization: Bearer <token>` when a token is given.
    fn get(&self, url: String, bearer: Option<String>) -> TransportFuture<'_, HttpResponse>;

    /// POSTs a JSON body and returns the response status. The body of the response is discarded.
    fn post_json(&self, url: String, body: Vec<u8>) -> TransportFuture<'_, u16>;
}

/// [`Transport`] backed by a shared `reqwest` client.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_TIMEOUT)
    }
}

fn auth_headers(bearer: Option<&str>) -> Result<HeaderMap, TransportError> {
    let mut headers = HeaderMap::new();
    if let Some(token) = bearer {
        let value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| TransportError::InvalidAuthHeader(e.to_string()))?;
        headers.insert(AUTHORIZATION, value);
    }
    Ok(headers)
}

fn check_url(url: &str) -> Result<(), TransportError> {
    reqwest::Url::parse(url)
        .map(|_| ())
        .map_err(|e| TransportError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })
}

impl Transport for ReqwestTransport {
    fn get(&self, url: String, bearer: Option<String>) -> TransportFuture<'_, HttpResponse> {
        Box::pin(async move {
            check_url(&url)?;
            let headers = auth_headers(bearer.as_deref())?;
            let response = self
                .client
                .get(&url)
                .headers(headers)
                .send()
                .await
                .map_err(|e| TransportError::Request {
                    url: url.clone(),
                    reason: e.to_string(),
                })?;
            let status = response.status().as_u16();
            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(ToString::to_string);
            let body = response
                .bytes()
                .await
                .map(|b| b.to_vec())
                .map_err(|e| TransportError::Body {
                    url: url.clone(),
                    reason: e.to_string(),
                })?;
            Ok(HttpResponse {
                status,
                content_type,
                body,
            })
        })
    }

    fn post_json(&self, url: String, body: Vec<u8>) -> TransportFuture<'_, u16> {
        Box::pin(async move {
            check_url(&url)?;
            let response = self
                .client
                .post(&url)
                .header(CONTENT_TYPE, "application/json")
                .body(body)
                .send()
                .await
                .map_err(|e| TransportError::Request {
                    url: url.clone(),
                    reason: e.to_string(),
                })?;
            Ok(response.status().as_u16())
        })
    }
}
