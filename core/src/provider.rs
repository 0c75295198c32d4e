//! Lifecycle hooks for the `http_request` query and managed-resource objects.
//!
//! # Design
//! Every hook returns an `OperationResponse` instead of a `Result`: the host
//! wants diagnostics even on success (content-type warnings), and on failure
//! it must get no state at all so nothing partial is persisted.

use tracing::{debug, error};

use crate::config::ProviderConfig;
use crate::diagnostics::Diagnostics;
use crate::error::ErrorKind;
use crate::fetcher::{Fetcher, UreqFetcher};
use crate::operation::{FetchMode, FetchOperation};
use crate::schema::{self, Schema};
use crate::types::HttpModel;

pub const TYPE_NAME: &str = "http";
pub const DATA_SOURCE_NAME: &str = "http_request";
pub const RESOURCE_NAME: &str = "http_request";

/// What a hook hands back to the host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationResponse {
    /// New state. `None` after a failure or a delete.
    pub state: Option<HttpModel>,
    pub diagnostics: Diagnostics,
    /// Class of the failure, when the hook failed.
    pub error_kind: Option<ErrorKind>,
}

impl OperationResponse {
    pub fn has_error(&self) -> bool {
        self.diagnostics.has_error()
    }
}

pub struct HttpProvider<F = UreqFetcher> {
    operation: FetchOperation<F>,
    config: ProviderConfig,
}

impl HttpProvider<UreqFetcher> {
    pub fn new(config: ProviderConfig) -> Self {
        Self::with_fetcher(UreqFetcher::new(), config)
    }
}

impl<F: Fetcher> HttpProvider<F> {
    pub fn with_fetcher(fetcher: F, config: ProviderConfig) -> Self {
        let operation = FetchOperation::new(fetcher).with_timeout(config.request_timeout());
        Self { operation, config }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn schema(&self) -> Schema {
        schema::http_request()
    }

    pub fn operation(&self) -> &FetchOperation<F> {
        &self.operation
    }

    /// Query primitive: fetch on every read.
    pub fn read_data_source(&self, config: HttpModel) -> OperationResponse {
        self.fetch_into(config, FetchMode::Query)
    }

    pub fn create_resource(&self, plan: HttpModel) -> OperationResponse {
        self.fetch_into(plan, FetchMode::Create)
    }

    /// Refresh a managed resource. Sends `GET` regardless of the stored
    /// method; see `FetchMode::Refresh`.
    pub fn read_resource(&self, state: HttpModel) -> OperationResponse {
        self.fetch_into(state, FetchMode::Refresh)
    }

    /// Accept the planned inputs without contacting the endpoint. Computed
    /// attributes stay as they were until the next read.
    pub fn update_resource(&self, plan: HttpModel, prior: &HttpModel) -> OperationResponse {
        let mut state = plan;
        state.carry_outputs(prior);
        debug!(url = %state.url, "update accepted without a request");
        OperationResponse {
            state: Some(state),
            ..Default::default()
        }
    }

    /// Forget the resource. The endpoint is not contacted.
    pub fn delete_resource(&self, state: &HttpModel) -> OperationResponse {
        debug!(url = %state.url, "delete is a no-op");
        OperationResponse::default()
    }

    fn fetch_into(&self, mut model: HttpModel, mode: FetchMode) -> OperationResponse {
        let mut diagnostics = Diagnostics::new();
        let spec = model.request_spec();
        match self.operation.run(&spec, mode, &mut diagnostics) {
            Ok(result) => {
                model.apply(result);
                OperationResponse {
                    state: Some(model),
                    diagnostics,
                    error_kind: None,
                }
            }
            Err(err) => {
                error!(url = %spec.url, ?mode, error = %err, "fetch failed");
                diagnostics.add_fetch_error(&err);
                OperationResponse {
                    state: None,
                    diagnostics,
                    error_kind: Some(err.kind()),
                }
            }
        }
    }
}
