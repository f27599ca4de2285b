//! Fetching resources through the shell.
//!
//! The core only ever issues `GET`s for static files next to the page, so the
//! operation is small: a validated URL, a few headers and a
//! timeout. The shell reports transport failures as `HttpError` and every
//! completed exchange (whatever the status) as `HttpResponse`.

use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;
use url::Url;

pub const MAX_URL_LENGTH: usize = 2048;
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const MAX_TIMEOUT_MS: u64 = 300_000;
pub const MAX_HEADER_VALUE_LENGTH: usize = 8192;

// Relative references are only checked for well-formedness against this
// placeholder; shells resolve them against the hosting page.
const RELATIVE_CHECK_BASE: &str = "https://relative.invalid/";

#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpError {
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid header '{name}': {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("invalid request: {reason}")]
    InvalidRequest { reason: String },

    #[error("connection failed: {message}")]
    ConnectionError { message: String },

    #[error("request {request_id} timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64, request_id: String },
}

fn shorten(url: &str) -> String {
    const KEEP: usize = 100;
    if url.len() <= KEEP {
        return url.to_string();
    }
    let mut end = KEEP;
    while !url.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &url[..end])
}

fn invalid_url(url: &str, reason: impl Into<String>) -> HttpError {
    HttpError::InvalidUrl {
        url: shorten(url),
        reason: reason.into(),
    }
}

/// Either an absolute `http(s)` URL or a path relative to the hosting page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceUrl {
    url: String,
    absolute: bool,
}

impl ResourceUrl {
    pub fn new(url: impl Into<String>) -> Result<Self, HttpError> {
        let url = url.into();
        let trimmed = url.trim();

        if trimmed.is_empty() {
            return Err(invalid_url(&url, "URL cannot be empty"));
        }
        if trimmed.len() > MAX_URL_LENGTH {
            return Err(invalid_url(
                trimmed,
                format!("longer than {MAX_URL_LENGTH} bytes"),
            ));
        }

        match Url::parse(trimmed) {
            Ok(parsed) => {
                Self::check_fetchable(&parsed, trimmed)?;
                Ok(Self {
                    url: parsed.to_string(),
                    absolute: true,
                })
            }
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                Url::parse(RELATIVE_CHECK_BASE)
                    .and_then(|base| base.join(trimmed))
                    .map_err(|e| invalid_url(trimmed, e.to_string()))?;
                Ok(Self {
                    url: trimmed.to_string(),
                    absolute: false,
                })
            }
            Err(e) => Err(invalid_url(trimmed, e.to_string())),
        }
    }

    fn check_fetchable(parsed: &Url, raw: &str) -> Result<(), HttpError> {
        let scheme = parsed.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(invalid_url(raw, format!("scheme '{scheme}' is not http(s)")));
        }
        if parsed.host_str().is_none() {
            return Err(invalid_url(raw, "missing host"));
        }
        if !parsed.username().is_empty() || parsed.password().is_some() {
            return Err(invalid_url(raw, "credentials are not allowed"));
        }
        Ok(())
    }

    pub fn as_str(&self) -> &str {
        &self.url
    }

    pub fn is_absolute(&self) -> bool {
        self.absolute
    }
}

/// Header list with case-insensitive replacement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpHeaders(Vec<(String, String)>);

impl HttpHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, value: &str) -> Result<(), HttpError> {
        let reject = |reason: &str| HttpError::InvalidHeader {
            name: shorten(name),
            reason: reason.to_string(),
        };

        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(reject("name must be a non-empty token"));
        }
        if value.len() > MAX_HEADER_VALUE_LENGTH {
            return Err(reject("value too long"));
        }
        if value.contains(['\r', '\n', '\0']) {
            return Err(reject("value contains CR, LF or NUL"));
        }

        self.0.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self.0.push((name.to_string(), value.to_string()));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpRequest {
    url: ResourceUrl,
    headers: HttpHeaders,
    timeout_ms: u64,
    request_id: String,
}

impl HttpRequest {
    pub fn get(url: &str) -> Result<Self, HttpError> {
        Ok(Self {
            url: ResourceUrl::new(url)?,
            headers: HttpHeaders::new(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            request_id: uuid::Uuid::new_v4().to_string(),
        })
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, HttpError> {
        self.headers.insert(name, value)?;
        Ok(self)
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Result<Self, HttpError> {
        if timeout_ms == 0 || timeout_ms > MAX_TIMEOUT_MS {
            return Err(HttpError::InvalidRequest {
                reason: format!("timeout must be within 1..={MAX_TIMEOUT_MS}ms"),
            });
        }
        self.timeout_ms = timeout_ms;
        Ok(self)
    }

    pub fn url(&self) -> &ResourceUrl {
        &self.url
    }

    pub fn headers(&self) -> &HttpHeaders {
        &self.headers
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    /// Shells echo this back in `HttpError::Timeout` so failures can be
    /// matched to the request in logs.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpOperation {
    Get(HttpRequest),
}

impl HttpOperation {
    pub fn request(&self) -> &HttpRequest {
        match self {
            HttpOperation::Get(request) => request,
        }
    }
}

impl Operation for HttpOperation {
    type Output = HttpResult;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HttpHeaders,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// A response with no headers, which is all the core ever looks at.
    pub fn with_body(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: HttpHeaders::new(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub type HttpResult = Result<HttpResponse, HttpError>;

pub struct Http<Ev> {
    context: CapabilityContext<HttpOperation, Ev>,
}

impl<Ev> Clone for Http<Ev> {
    fn clone(&self) -> Self {
        Self {
            context: self.context.clone(),
        }
    }
}

impl<Ev> Capability<Ev> for Http<Ev> {
    type Operation = HttpOperation;
    type MappedSelf<MappedEv> = Http<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static,
    {
        Http {
            context: self.context.map_event(f),
        }
    }
}

impl<Ev> Http<Ev>
where
    Ev: Send + 'static,
{
    pub fn new(context: CapabilityContext<HttpOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn get(&self, url: &str) -> RequestBuilder<Ev> {
        RequestBuilder {
            context: self.context.clone(),
            request: HttpRequest::get(url),
        }
    }
}

#[must_use = "a request does nothing until it is sent"]
pub struct RequestBuilder<Ev> {
    context: CapabilityContext<HttpOperation, Ev>,
    request: Result<HttpRequest, HttpError>,
}

impl<Ev> RequestBuilder<Ev>
where
    Ev: Send + 'static,
{
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.request = self.request.and_then(|r| r.with_header(name, value));
        self
    }

    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.request = self.request.and_then(|r| r.with_timeout_ms(timeout_ms));
        self
    }

    /// Hand the request to the shell and turn its answer into an event. A
    /// request that failed validation never reaches the shell; the error is
    /// delivered to `make_event` straight away.
    pub fn send<F>(self, make_event: F)
    where
        F: FnOnce(HttpResult) -> Ev + Send + 'static,
    {
        match self.request {
            Ok(request) => {
                let context = self.context.clone();
                self.context.spawn(async move {
                    let result = context.request_from_shell(HttpOperation::Get(request)).await;
                    context.update_app(make_event(result));
                });
            }
            Err(e) => {
                warn!(error = %e, "http request rejected before dispatch");
                self.context.update_app(make_event(Err(e)));
            }
        }
    }
}
