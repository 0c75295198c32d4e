//! Transport seam: executes one `HttpRequest` and hands back a `RawResponse`.
//!
//! # Design
//! `Fetcher` is the only place network I/O happens. `UreqFetcher` owns one
//! `ureq::Agent` for its whole lifetime so sequential fetches reuse pooled
//! connections. Non-2xx statuses are data, not errors: the agent is built
//! with `http_status_as_error(false)`.

use std::io;
use std::time::Duration;

use tracing::debug;
use ureq::http::{HeaderName, HeaderValue, Response};
use ureq::{Agent, Body, RequestBuilder};

use crate::error::FetchError;
use crate::http::{canonical_header_name, HttpMethod, HttpRequest, RawResponse};

/// Executes requests. Implementations must not read the response body.
pub trait Fetcher: Send + Sync {
    /// Send `request`, waiting at most `deadline` for the exchange when set.
    fn execute(&self, request: &HttpRequest, deadline: Option<Duration>)
        -> Result<RawResponse, FetchError>;
}

impl<F: Fetcher + ?Sized> Fetcher for Box<F> {
    fn execute(
        &self,
        request: &HttpRequest,
        deadline: Option<Duration>,
    ) -> Result<RawResponse, FetchError> {
        (**self).execute(request, deadline)
    }
}

/// Production fetcher backed by a shared `ureq::Agent`.
#[derive(Clone)]
pub struct UreqFetcher {
    agent: Agent,
}

impl UreqFetcher {
    pub fn new() -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }

    /// Attach headers (overwriting agent defaults) and the deadline.
    fn prepare<B>(
        builder: RequestBuilder<B>,
        headers: &[(HeaderName, HeaderValue)],
        deadline: Option<Duration>,
    ) -> RequestBuilder<B> {
        let builder = headers
            .iter()
            .fold(builder, |b, (name, value)| b.header(name.clone(), value.clone()));
        match deadline {
            Some(timeout) => builder.config().timeout_global(Some(timeout)).build(),
            None => builder,
        }
    }
}

impl Default for UreqFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetcher for UreqFetcher {
    fn execute(
        &self,
        request: &HttpRequest,
        deadline: Option<Duration>,
    ) -> Result<RawResponse, FetchError> {
        debug!(method = %request.method, url = %request.url, ?deadline, "sending request");

        let headers = outbound_headers(&request.headers)?;
        let url = request.url.as_str();
        let body = request.body.as_bytes();

        // GET and HEAD carry a body only when one was given.
        let sent = match request.method {
            HttpMethod::Get if body.is_empty() => {
                Self::prepare(self.agent.get(url), &headers, deadline).call()
            }
            HttpMethod::Get => {
                Self::prepare(self.agent.get(url).force_send_body(), &headers, deadline).send(body)
            }
            HttpMethod::Head if body.is_empty() => {
                Self::prepare(self.agent.head(url), &headers, deadline).call()
            }
            HttpMethod::Head => {
                Self::prepare(self.agent.head(url).force_send_body(), &headers, deadline).send(body)
            }
            HttpMethod::Post if body.is_empty() => {
                Self::prepare(self.agent.post(url), &headers, deadline).send_empty()
            }
            HttpMethod::Post => Self::prepare(self.agent.post(url), &headers, deadline).send(body),
        };

        let response = sent.map_err(|e| transport_error(e, request, deadline))?;
        Ok(raw_response(response))
    }
}

fn outbound_headers(headers: &[(String, String)]) -> Result<Vec<(HeaderName, HeaderValue)>, FetchError> {
    headers
        .iter()
        .map(|(name, value)| {
            let invalid = |reason: String| FetchError::InvalidHeader {
                name: name.clone(),
                reason,
            };
            let header_name =
                HeaderName::from_bytes(name.as_bytes()).map_err(|e| invalid(e.to_string()))?;
            let header_value = HeaderValue::from_str(value).map_err(|e| invalid(e.to_string()))?;
            Ok((header_name, header_value))
        })
        .collect()
}

fn raw_response(response: Response<Body>) -> RawResponse {
    let (parts, body) = response.into_parts();
    let mut headers = Vec::with_capacity(parts.headers.len());
    for name in parts.headers.keys() {
        let canonical = canonical_header_name(name.as_str());
        for value in parts.headers.get_all(name) {
            headers.push((
                canonical.clone(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            ));
        }
    }

    debug!(
        status = parts.status.as_u16(),
        headers = headers.len(),
        "response received"
    );

    RawResponse {
        status: parts.status.as_u16(),
        headers,
        body: Box::new(body.into_reader()),
    }
}

fn transport_error(err: ureq::Error, request: &HttpRequest, deadline: Option<Duration>) -> FetchError {
    let url = request.url.to_string();
    let timed_out = match &err {
        ureq::Error::Timeout(_) => true,
        ureq::Error::Io(io_err) => io_err.kind() == io::ErrorKind::TimedOut,
        _ => false,
    };
    match (timed_out, deadline) {
        (true, Some(timeout)) => FetchError::Timeout { url, timeout },
        _ => FetchError::Transport {
            url,
            message: err.to_string(),
        },
    }
}

/// Whether a body read failed because the request deadline ran out. The
/// agent's deadline also covers draining the body, and the reader reports
/// it as an `io::Error` wrapping `ureq::Error::Timeout`.
pub(crate) fn is_deadline_error(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::TimedOut
        || err
            .get_ref()
            .and_then(|inner| inner.downcast_ref::<ureq::Error>())
            .is_some_and(|inner| matches!(inner, ureq::Error::Timeout(_)))
}
