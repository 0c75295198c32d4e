//! HTTP request and response types at the transport seam.
//!
//! # Design
//! `HttpRequest` is plain data produced by `FetchOperation::build_request`
//! after validation and defaulting, so it can be inspected without touching
//! the network. `RawResponse` is what a `Fetcher` hands back: status, the
//! header list in the order the transport delivered it, and a body reader
//! the caller has not consumed yet. Dropping a `RawResponse` releases the
//! underlying connection.

use std::fmt;
use std::io::Read;
use std::str::FromStr;

use url::Url;

use crate::error::FetchError;

/// HTTP method accepted by a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Head,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 3] = [HttpMethod::Get, HttpMethod::Head, HttpMethod::Post];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Head => "HEAD",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses the exact upper-case method token. `"get"` is rejected, matching
/// how the host validates the attribute.
impl FromStr for HttpMethod {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "HEAD" => Ok(HttpMethod::Head),
            other => Err(FetchError::InvalidMethod {
                method: other.to_string(),
            }),
        }
    }
}

/// A validated outbound request.
///
/// `headers` holds at most one entry per name; `body` is sent whenever it is
/// non-empty, whatever the method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

/// A response as returned by the transport, body still unread.
pub struct RawResponse {
    pub status: u16,
    /// One entry per header line, in arrival order. Names repeat when the
    /// server sent the same header more than once.
    pub headers: Vec<(String, String)>,
    pub body: Box<dyn Read>,
}

impl RawResponse {
    /// First value of `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Debug for RawResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Canonical MIME form of a header name: the first letter and every letter
/// after a hyphen upper-cased, the rest lower-cased (`content-type` →
/// `Content-Type`). Names containing bytes outside the token set are
/// returned unchanged.
pub fn canonical_header_name(name: &str) -> String {
    if !name.bytes().all(is_token_byte) {
        return name.to_string();
    }
    let mut upper = true;
    name.chars()
        .map(|c| {
            let out = if upper {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            };
            upper = c == '-';
            out
        })
        .collect()
}

fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_parses_known_tokens() {
        assert_eq!("GET".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
        assert_eq!("POST".parse::<HttpMethod>().unwrap(), HttpMethod::Post);
        assert_eq!("HEAD".parse::<HttpMethod>().unwrap(), HttpMethod::Head);
    }

    #[test]
    fn method_rejects_unknown_and_lowercase() {
        for bad in ["PUT", "DELETE", "get", ""] {
            let err = bad.parse::<HttpMethod>().unwrap_err();
            assert!(matches!(err, FetchError::InvalidMethod { ref method } if method == bad));
        }
    }

    #[test]
    fn method_defaults_to_get() {
        assert_eq!(HttpMethod::default(), HttpMethod::Get);
    }

    #[test]
    fn method_display_matches_token() {
        for method in HttpMethod::ALL {
            assert_eq!(method.to_string().parse::<HttpMethod>().unwrap(), method);
        }
    }

    #[test]
    fn canonical_header_name_capitalizes_segments() {
        assert_eq!(canonical_header_name("x-foo"), "X-Foo");
        assert_eq!(canonical_header_name("CONTENT-TYPE"), "Content-Type");
        assert_eq!(canonical_header_name("etag"), "Etag");
        assert_eq!(canonical_header_name("x-b3-traceid"), "X-B3-Traceid");
    }

    #[test]
    fn canonical_header_name_leaves_invalid_names_alone() {
        assert_eq!(canonical_header_name("bad header"), "bad header");
    }

    #[test]
    fn raw_response_header_lookup_is_case_insensitive() {
        let response = RawResponse {
            status: 200,
            headers: vec![
                ("Content-Type".to_string(), "text/plain".to_string()),
                ("Content-Type".to_string(), "text/html".to_string()),
            ],
            body: Box::new(std::io::empty()),
        };
        assert_eq!(response.header("content-type"), Some("text/plain"));
        assert_eq!(response.header("x-missing"), None);
    }
}
