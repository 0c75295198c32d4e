//! Domain DTOs: fetch inputs, fetch outputs, and the host-facing model.
//!
//! # Design
//! `RequestSpec` and `FetchResult` are what the fetch pipeline consumes and
//! produces. `HttpModel` is the attribute record the host stores; it is the
//! same for the query and the managed-resource primitives. Optional inputs
//! are `Option` so JSON `null` and a missing key read the same way.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Declarative inputs to one fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestSpec {
    pub url: String,
    /// Upper-case method token; `None` or empty means `GET`.
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub request_headers: BTreeMap<String, String>,
    #[serde(default)]
    pub request_body: Option<String>,
}

impl RequestSpec {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request_headers.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.request_body = Some(body.into());
        self
    }
}

/// Normalized outcome of one fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchResult {
    /// The requested URL; stable across fetches of the same spec.
    pub identity: String,
    pub status_code: u16,
    pub response_headers: BTreeMap<String, String>,
    pub response_body: String,
}

/// Attribute record exchanged with the host for an `http_request` object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpModel {
    #[serde(default)]
    pub id: Option<String>,
    pub url: String,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub request_headers: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub request_body: Option<String>,
    #[serde(default)]
    pub response_headers: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub response_body: Option<String>,
    /// Deprecated alias of `response_body`.
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub status_code: Option<i64>,
}

impl HttpModel {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn request_spec(&self) -> RequestSpec {
        RequestSpec {
            url: self.url.clone(),
            method: self.method.clone(),
            request_headers: self.request_headers.clone().unwrap_or_default(),
            request_body: self.request_body.clone(),
        }
    }

    /// Overwrite every computed attribute from `result`. Inputs stay as
    /// declared.
    pub fn apply(&mut self, result: FetchResult) {
        self.id = Some(result.identity);
        self.status_code = Some(i64::from(result.status_code));
        self.response_headers = Some(result.response_headers);
        self.body = Some(result.response_body.clone());
        self.response_body = Some(result.response_body);
    }

    /// Copy the computed attributes of `prior` onto `self`.
    pub fn carry_outputs(&mut self, prior: &HttpModel) {
        self.id = prior.id.clone();
        self.status_code = prior.status_code;
        self.response_headers = prior.response_headers.clone();
        self.response_body = prior.response_body.clone();
        self.body = prior.body.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result() -> FetchResult {
        FetchResult {
            identity: "http://example.test/ok".to_string(),
            status_code: 200,
            response_headers: BTreeMap::from([("X-Foo".to_string(), "a, b".to_string())]),
            response_body: "hello".to_string(),
        }
    }

    #[test]
    fn request_spec_defaults_are_empty() {
        let spec: RequestSpec = serde_json::from_str(r#"{"url":"http://example.test/"}"#).unwrap();
        assert_eq!(spec.method, None);
        assert!(spec.request_headers.is_empty());
        assert_eq!(spec.request_body, None);
    }

    #[test]
    fn request_spec_rejects_missing_url() {
        let result: Result<RequestSpec, _> = serde_json::from_str(r#"{"method":"GET"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn model_accepts_null_optionals() {
        let model: HttpModel = serde_json::from_str(
            r#"{"url":"http://example.test/","method":null,"request_headers":null,"status_code":null}"#,
        )
        .unwrap();
        let spec = model.request_spec();
        assert_eq!(spec.url, "http://example.test/");
        assert!(spec.request_headers.is_empty());
    }

    #[test]
    fn apply_fills_outputs_and_body_alias() {
        let mut model = HttpModel::new("http://example.test/ok");
        model.method = Some("POST".to_string());
        model.apply(result());

        assert_eq!(model.id.as_deref(), Some("http://example.test/ok"));
        assert_eq!(model.status_code, Some(200));
        assert_eq!(model.response_body.as_deref(), Some("hello"));
        assert_eq!(model.body, model.response_body);
        assert_eq!(model.method.as_deref(), Some("POST"));
        assert_eq!(
            model.response_headers.as_ref().unwrap().get("X-Foo").map(String::as_str),
            Some("a, b")
        );
    }

    #[test]
    fn apply_replaces_previous_outputs_wholesale() {
        let mut model = HttpModel::new("http://example.test/ok");
        model.response_headers = Some(BTreeMap::from([("X-Old".to_string(), "1".to_string())]));
        model.apply(result());
        assert!(!model.response_headers.as_ref().unwrap().contains_key("X-Old"));
    }

    #[test]
    fn carry_outputs_copies_only_computed_fields() {
        let mut prior = HttpModel::new("http://example.test/ok");
        prior.apply(result());

        let mut planned = HttpModel::new("http://example.test/ok");
        planned.request_body = Some("new".to_string());
        planned.carry_outputs(&prior);

        assert_eq!(planned.status_code, Some(200));
        assert_eq!(planned.request_body.as_deref(), Some("new"));
    }
}
