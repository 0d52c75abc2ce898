//! Single-shot HTTP GET with uniform failure classification and logging.
//!
//! A call performs exactly one request. Failures are logged once at ERROR
//! and returned as a [`RequestError`]; success is returned untouched and
//! logs nothing.

mod transport;

pub use transport::{ReqwestTransport, Transport, classify};

use std::borrow::Cow;
use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use thiserror::Error;
use tracing::error;

use crate::config::RequestSettings;
use crate::logging;

/// Classified request failure. The display text is the logged line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// The remote end answered with a fault the transport reports as an error.
    #[error("HTTP error occurred: {0}")]
    Http(String),
    /// No response within the timeout.
    #[error("Connection timeout error occurred: {0}")]
    Timeout(String),
    /// The connection could not be established or was lost.
    #[error("Connection error occurred: {0}")]
    Connection(String),
}

impl RequestError {
    pub fn detail(&self) -> &str {
        match self {
            RequestError::Http(detail)
            | RequestError::Timeout(detail)
            | RequestError::Connection(detail) => detail,
        }
    }
}

/// Result of one request.
pub type RequestOutcome = Result<HttpResponse, RequestError>;

/// Response as received: status, headers and body.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Body decoded as UTF-8, with invalid sequences replaced.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// Issues GET requests through a [`Transport`] with a fixed default timeout.
///
/// Holds no per-call state; share it freely between tasks.
pub struct HttpRequester<T = ReqwestTransport> {
    transport: Arc<T>,
    timeout: Duration,
    fallback: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl<T> Clone for HttpRequester<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            timeout: self.timeout,
            fallback: Arc::clone(&self.fallback),
        }
    }
}

impl HttpRequester<ReqwestTransport> {
    /// Creates a requester over `reqwest` using the configured timeout.
    pub fn new(settings: &RequestSettings) -> reqwest::Result<Self> {
        Ok(Self::with_transport(ReqwestTransport::new()?, settings.timeout()))
    }
}

impl<T: Transport> HttpRequester<T> {
    pub fn with_transport(transport: T, timeout: Duration) -> Self {
        Self {
            transport: Arc::new(transport),
            timeout,
            fallback: Arc::new(Mutex::new(Box::new(io::stdout()))),
        }
    }

    /// Replaces stdout as the destination for failure lines while no
    /// `tracing` subscriber is wired.
    pub fn with_fallback_writer(mut self, writer: impl Write + Send + 'static) -> Self {
        self.fallback = Arc::new(Mutex::new(Box::new(writer)));
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// GETs `url` with `headers` and the configured timeout.
    pub async fn fetch(&self, url: &str, headers: &HashMap<String, String>) -> RequestOutcome {
        self.fetch_with_timeout(url, headers, self.timeout).await
    }

    /// GETs `url` with an explicit timeout.
    pub async fn fetch_with_timeout(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
        timeout: Duration,
    ) -> RequestOutcome {
        let outcome = self.transport.get(url, headers, timeout).await;
        if let Err(err) = &outcome {
            self.report(url, err);
        }
        outcome
    }

    /// Writes the one failure line, to the fallback writer when nothing
    /// collects `tracing` events.
    fn report(&self, url: &str, err: &RequestError) {
        if logging::is_wired() {
            error!(url = %url, "{}", err);
            return;
        }
        let mut writer = self.fallback.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = writeln!(writer, "{err}").and_then(|()| writer.flush());
    }
}
