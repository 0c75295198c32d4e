//! Declarative HTTP request primitive.
//!
//! # Overview
//! Performs one synchronous HTTP request from declarative inputs and
//! normalizes the response into state an orchestration host can store and
//! diff: status code, folded response headers, and the body as text.
//!
//! # Design
//! - `Fetcher` is the only I/O seam; `UreqFetcher` shares one agent across
//!   calls.
//! - `FetchOperation` splits each fetch into `build_request` (validation and
//!   defaulting, no I/O) and `run` (execute, classify, drain, fold).
//! - Failures are `FetchError` values; nothing here exits the process.
//! - Warnings and errors destined for the host go through an explicit
//!   `Diagnostics` sink; operational logging goes through `tracing`.
//! - `HttpProvider` maps the query and managed-resource lifecycle hooks onto
//!   `FetchOperation`.

pub mod classify;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod fetcher;
pub mod headers;
pub mod http;
pub mod operation;
pub mod provider;
pub mod schema;
pub mod types;

pub use classify::{classify, ContentClass};
pub use config::ProviderConfig;
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use error::{ConfigError, ErrorKind, FetchError};
pub use fetcher::{Fetcher, UreqFetcher};
pub use headers::fold_headers;
pub use http::{HttpMethod, HttpRequest, RawResponse};
pub use operation::{FetchMode, FetchOperation};
pub use provider::{HttpProvider, OperationResponse};
pub use types::{FetchResult, HttpModel, RequestSpec};
