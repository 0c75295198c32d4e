//! Attribute schema of the `http_request` object, as declared to the host.

use serde::Serialize;

use crate::http::HttpMethod;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    String,
    Int64,
    MapOfString,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    Required,
    Optional,
    Computed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attribute {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "type")]
    pub kind: AttributeType,
    pub presence: Presence,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecation_message: Option<&'static str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allowed_values: Vec<&'static str>,
}

impl Attribute {
    fn new(name: &'static str, kind: AttributeType, presence: Presence, description: &'static str) -> Self {
        Self {
            name,
            description,
            kind,
            presence,
            deprecation_message: None,
            allowed_values: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Schema {
    pub attributes: Vec<Attribute>,
}

impl Schema {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

/// Schema shared by the query and the managed-resource primitives.
pub fn http_request() -> Schema {
    use AttributeType::*;
    use Presence::*;

    let mut method = Attribute::new(
        "method",
        String,
        Optional,
        "The HTTP method for the request. Allowed methods are GET, HEAD, and POST. \
         POST support is only intended for read-only URLs, such as submitting a search.",
    );
    method.allowed_values = HttpMethod::ALL.iter().map(HttpMethod::as_str).collect();

    let mut body = Attribute::new(
        "body",
        String,
        Computed,
        "The response body returned as a string. Deprecated, use response_body instead.",
    );
    body.deprecation_message = Some("Use response_body instead");

    Schema {
        attributes: vec![
            Attribute::new("id", String, Computed, "The URL used for the request."),
            Attribute::new(
                "url",
                String,
                Required,
                "The URL for the request. Supported schemes are http and https.",
            ),
            method,
            Attribute::new(
                "request_headers",
                MapOfString,
                Optional,
                "A map of request header field names and values.",
            ),
            Attribute::new("request_body", String, Optional, "The request body as a string."),
            Attribute::new(
                "response_body",
                String,
                Computed,
                "The response body returned as a string.",
            ),
            body,
            Attribute::new(
                "response_headers",
                MapOfString,
                Computed,
                "A map of response header field names and values. \
                 Duplicate headers are concatenated according to RFC 2616 section 4.2.",
            ),
            Attribute::new("status_code", Int64, Computed, "The HTTP response status code."),
        ],
    }
}
