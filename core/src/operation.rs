//! The fetch: validate, execute, classify, drain, fold.
//!
//! # Design
//! `FetchOperation` is split the same way at every call site:
//! `build_request` turns a `RequestSpec` into an `HttpRequest` without I/O
//! (defaulting and validation happen here, so a bad spec never reaches the
//! network), then `run` hands that request to the `Fetcher` and normalizes
//! the `RawResponse` into a `FetchResult`. The operation holds no state
//! between calls beyond the fetcher itself.

use std::io::Read;
use std::time::Duration;

use tracing::{debug, info, warn};
use url::Url;

use crate::classify::classify;
use crate::diagnostics::Diagnostics;
use crate::error::FetchError;
use crate::fetcher::{is_deadline_error, Fetcher};
use crate::headers::fold_into_map;
use crate::http::{HttpMethod, HttpRequest, RawResponse};
use crate::types::{FetchResult, RequestSpec};

/// Which lifecycle hook a fetch serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Query primitive read.
    Query,
    /// Managed-resource create.
    Create,
    /// Managed-resource read. Always sends `GET`, whatever the stored
    /// method says; a resource declared with `POST` therefore refreshes with
    /// a `GET`. Kept for compatibility with existing state.
    Refresh,
}

pub struct FetchOperation<F> {
    fetcher: F,
    timeout: Option<Duration>,
}

impl<F: Fetcher> FetchOperation<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            timeout: None,
        }
    }

    /// Bound every request by `timeout`. `None` waits indefinitely.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Resolve `spec` into the request that `run` would send.
    pub fn build_request(&self, spec: &RequestSpec, mode: FetchMode) -> Result<HttpRequest, FetchError> {
        let method = match mode {
            FetchMode::Refresh => HttpMethod::Get,
            FetchMode::Query | FetchMode::Create => match spec.method.as_deref() {
                None | Some("") => HttpMethod::Get,
                Some(token) => token.parse()?,
            },
        };

        if spec.url.is_empty() {
            return Err(FetchError::EmptyUrl);
        }
        let url = Url::parse(&spec.url).map_err(|e| FetchError::InvalidUrl {
            url: spec.url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl {
                url: spec.url.clone(),
                reason: format!("unsupported scheme {:?}, expected http or https", url.scheme()),
            });
        }

        Ok(HttpRequest {
            method,
            url,
            headers: spec
                .request_headers
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            body: spec.request_body.clone().unwrap_or_default(),
        })
    }

    /// Execute one fetch. Warnings go to `diagnostics`; failures are
    /// returned and nothing partial is produced.
    pub fn run(
        &self,
        spec: &RequestSpec,
        mode: FetchMode,
        diagnostics: &mut Diagnostics,
    ) -> Result<FetchResult, FetchError> {
        let request = self.build_request(spec, mode)?;
        info!(method = %request.method, url = %request.url, ?mode, "fetching");

        let response = self.fetcher.execute(&request, self.timeout)?;
        normalize(spec.url.clone(), response, self.timeout, diagnostics)
    }
}

/// Drain `response` into a `FetchResult` identified by `identity`.
///
/// The response is consumed here, so its connection is released whether
/// the body read succeeds or not. Running out of `deadline` while draining
/// the body is a timeout, not a body read failure.
pub fn normalize(
    identity: String,
    mut response: RawResponse,
    deadline: Option<Duration>,
    diagnostics: &mut Diagnostics,
) -> Result<FetchResult, FetchError> {
    let content_type = response.header("Content-Type").unwrap_or_default().to_string();
    if !classify(&content_type).is_text() {
        warn!(%content_type, "response content type is not text");
        diagnostics.add_warning(
            format!("Content-Type is not recognized as a text type, got {content_type:?}"),
            "If the content is binary data, the host may not properly handle the contents of the response.",
        );
    }

    let mut bytes = Vec::new();
    response
        .body
        .read_to_end(&mut bytes)
        .map_err(|e| match deadline {
            Some(timeout) if is_deadline_error(&e) => FetchError::Timeout {
                url: identity.clone(),
                timeout,
            },
            _ => FetchError::BodyRead(e),
        })?;

    let response_headers = fold_into_map(
        response
            .headers
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str())),
    );

    debug!(status = response.status, bytes = bytes.len(), "response drained");

    Ok(FetchResult {
        identity,
        status_code: response.status,
        response_headers,
        response_body: String::from_utf8_lossy(&bytes).into_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::fetcher::mock::{CannedResponse, MockFetcher};

    const URL: &str = "http://example.test/ok";

    fn operation(fetcher: MockFetcher) -> FetchOperation<MockFetcher> {
        FetchOperation::new(fetcher)
    }

    fn ok_response() -> CannedResponse {
        CannedResponse::text("hello")
            .with_header("X-Foo", "a")
            .with_header("X-Foo", "b")
    }

    #[test]
    fn empty_method_defaults_to_get() {
        let op = operation(MockFetcher::responding(ok_response()));
        for method in [None, Some("")] {
            let spec = RequestSpec {
                method: method.map(str::to_string),
                ..RequestSpec::get(URL)
            };
            let req = op.build_request(&spec, FetchMode::Query).unwrap();
            assert_eq!(req.method, HttpMethod::Get);
        }
    }

    #[test]
    fn unsupported_method_fails_before_any_request() {
        let fetcher = MockFetcher::responding(ok_response());
        let op = operation(fetcher.clone());
        let mut diags = Diagnostics::new();

        let err = op
            .run(&RequestSpec::get(URL).with_method("DELETE"), FetchMode::Create, &mut diags)
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(fetcher.recorded().is_empty());
    }

    #[test]
    fn refresh_forces_get() {
        let fetcher = MockFetcher::responding(ok_response());
        let op = operation(fetcher.clone());
        let spec = RequestSpec::get(URL).with_method("POST").with_body("q=1");

        op.run(&spec, FetchMode::Refresh, &mut Diagnostics::new()).unwrap();

        let recorded = fetcher.recorded();
        assert_eq!(recorded[0].0.method, HttpMethod::Get);
        assert_eq!(recorded[0].0.body, "q=1");
    }

    #[test]
    fn create_keeps_declared_method() {
        let fetcher = MockFetcher::responding(ok_response());
        let op = operation(fetcher.clone());
        op.run(
            &RequestSpec::get(URL).with_method("POST"),
            FetchMode::Create,
            &mut Diagnostics::new(),
        )
        .unwrap();
        assert_eq!(fetcher.recorded()[0].0.method, HttpMethod::Post);
    }

    #[test]
    fn headers_and_body_are_forwarded() {
        let fetcher = MockFetcher::responding(ok_response());
        let op = operation(fetcher.clone());
        let spec = RequestSpec::get(URL)
            .with_method("POST")
            .with_header("Authorization", "Bearer t")
            .with_body("payload");

        op.run(&spec, FetchMode::Query, &mut Diagnostics::new()).unwrap();

        let (req, _) = &fetcher.recorded()[0];
        assert_eq!(
            req.headers,
            vec![("Authorization".to_string(), "Bearer t".to_string())]
        );
        assert_eq!(req.body, "payload");
    }

    #[test]
    fn empty_url_is_a_validation_error() {
        let op = operation(MockFetcher::responding(ok_response()));
        let err = op.build_request(&RequestSpec::get(""), FetchMode::Query).unwrap_err();
        assert!(matches!(err, FetchError::EmptyUrl));
    }

    #[test]
    fn relative_or_foreign_urls_are_rejected() {
        let op = operation(MockFetcher::responding(ok_response()));
        for url in ["/relative", "ftp://example.test/file", "not a url"] {
            let err = op.build_request(&RequestSpec::get(url), FetchMode::Query).unwrap_err();
            assert!(matches!(err, FetchError::InvalidUrl { .. }), "{url}");
        }
    }

    #[test]
    fn run_normalizes_response() {
        let op = operation(MockFetcher::responding(ok_response()));
        let mut diags = Diagnostics::new();

        let result = op.run(&RequestSpec::get(URL), FetchMode::Query, &mut diags).unwrap();

        assert_eq!(result.identity, URL);
        assert_eq!(result.status_code, 200);
        assert_eq!(result.response_body, "hello");
        assert_eq!(result.response_headers.get("X-Foo").map(String::as_str), Some("a, b"));
        assert!(diags.is_empty());
    }

    #[test]
    fn binary_content_type_warns_but_keeps_body() {
        let canned = CannedResponse {
            headers: vec![("Content-Type".to_string(), "application/octet-stream".to_string())],
            ..CannedResponse::text("hello")
        };
        let op = operation(MockFetcher::responding(canned));
        let mut diags = Diagnostics::new();

        let result = op.run(&RequestSpec::get(URL), FetchMode::Query, &mut diags).unwrap();

        assert_eq!(result.response_body, "hello");
        assert!(!diags.has_error());
        let warning = diags.warnings().next().unwrap();
        assert!(warning.summary.contains("application/octet-stream"));
    }

    #[test]
    fn missing_content_type_warns() {
        let canned = CannedResponse {
            headers: Vec::new(),
            ..CannedResponse::text("hello")
        };
        let op = operation(MockFetcher::responding(canned));
        let mut diags = Diagnostics::new();
        op.run(&RequestSpec::get(URL), FetchMode::Query, &mut diags).unwrap();
        assert_eq!(diags.warnings().count(), 1);
    }

    #[test]
    fn transport_failure_is_returned() {
        let op = operation(MockFetcher::failing("connection refused"));
        let err = op
            .run(&RequestSpec::get(URL), FetchMode::Query, &mut Diagnostics::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn body_read_failure_is_returned() {
        let op = operation(MockFetcher::broken_body());
        let err = op
            .run(&RequestSpec::get(URL), FetchMode::Query, &mut Diagnostics::new())
            .unwrap_err();
        assert!(matches!(err, FetchError::BodyRead(_)));
    }

    #[test]
    fn deadline_during_body_read_is_a_timeout() {
        let timeout = Duration::from_millis(300);
        let op = FetchOperation::new(MockFetcher::stalled_body()).with_timeout(Some(timeout));

        let err = op
            .run(&RequestSpec::get(URL), FetchMode::Query, &mut Diagnostics::new())
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Transport);
        assert!(
            matches!(err, FetchError::Timeout { ref url, timeout: t } if url == URL && t == timeout),
            "got {err:?}"
        );
    }

    #[test]
    fn timed_out_body_without_deadline_is_a_body_read_error() {
        let op = operation(MockFetcher::stalled_body());
        let err = op
            .run(&RequestSpec::get(URL), FetchMode::Query, &mut Diagnostics::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BodyRead);
    }

    #[test]
    fn timeout_is_passed_to_fetcher() {
        let fetcher = MockFetcher::responding(ok_response());
        let op = FetchOperation::new(fetcher.clone()).with_timeout(Some(Duration::from_millis(300)));
        op.run(&RequestSpec::get(URL), FetchMode::Query, &mut Diagnostics::new()).unwrap();
        assert_eq!(fetcher.recorded()[0].1, Some(Duration::from_millis(300)));
    }

    #[test]
    fn identity_is_stable_across_runs() {
        let op = operation(MockFetcher::responding(ok_response()));
        let spec = RequestSpec::get(URL);
        let first = op.run(&spec, FetchMode::Query, &mut Diagnostics::new()).unwrap();
        let second = op.run(&spec, FetchMode::Query, &mut Diagnostics::new()).unwrap();
        assert_eq!(first.identity, second.identity);
    }

    #[test]
    fn invalid_utf8_body_is_decoded_lossily() {
        let canned = CannedResponse {
            body: vec![b'o', b'k', 0xff],
            ..CannedResponse::text("")
        };
        let op = operation(MockFetcher::responding(canned));
        let result = op
            .run(&RequestSpec::get(URL), FetchMode::Query, &mut Diagnostics::new())
            .unwrap();
        assert_eq!(result.response_body, "ok\u{fffd}");
    }
}
