//! Transport seam for the request executor and its `reqwest` implementation.

use std::collections::HashMap;
use std::error::Error as _;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;

use super::{HttpResponse, RequestError};

/// Performs a single GET. Implementations classify their own faults.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
        timeout: Duration,
    ) -> Result<HttpResponse, RequestError>;
}

/// `reqwest`-backed transport. Idle connections are not kept between calls.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http_client: HttpClient,
}

impl ReqwestTransport {
    pub fn new() -> reqwest::Result<Self> {
        let http_client = HttpClient::builder().pool_max_idle_per_host(0).build()?;
        Ok(Self { http_client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
        timeout: Duration,
    ) -> Result<HttpResponse, RequestError> {
        let mut request = self.http_client.get(url).timeout(timeout);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().await.map_err(|e| classify(&e))?;
        let status = response.status();
        let response_headers = response.headers().clone();
        let body = response.bytes().await.map_err(|e| classify(&e))?;

        Ok(HttpResponse {
            status,
            headers: response_headers,
            body: body.to_vec(),
        })
    }
}

/// Maps a `reqwest` fault onto the three request error kinds.
///
/// Order matters: status and redirect faults first, then timeouts, and
/// everything else is a connection fault.
pub fn classify(err: &reqwest::Error) -> RequestError {
    let detail = error_chain(err);
    if err.is_status() || err.is_redirect() {
        RequestError::Http(detail)
    } else if err.is_timeout() {
        RequestError::Timeout(detail)
    } else {
        RequestError::Connection(detail)
    }
}

/// `err` followed by each of its sources, separated by ": ".
fn error_chain(err: &reqwest::Error) -> String {
    let mut detail = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !detail.contains(&text) {
            detail.push_str(": ");
            detail.push_str(&text);
        }
        source = cause.source();
    }
    detail
}
