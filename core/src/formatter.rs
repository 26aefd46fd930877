//! `RequestFormatter`: endpoint, negotiation and operations behind one value.
//!
//! # Design
//! The formatter owns its `EndpointConfig`, so several formatters can target
//! different servers side by side. `init` takes `&mut self`; sharing one
//! formatter across threads needs the caller's own lock. Everything else is a
//! pure function of its inputs and the current configuration.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::endpoint::{EndpointConfig, EndpointOptions};
use crate::error::{ApiError, NegotiationViolation};
use crate::http::{RawResponse, RequestPayload};
use crate::negotiation;
use crate::operation::Operation;
use crate::registry::{OperationDescriptor, OperationRegistry};

/// A payload together with the absolute location to send it to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRequest {
    /// `host[:port]/[path/]<relative path>`, without a scheme.
    pub url: String,
    pub payload: RequestPayload,
}

#[derive(Debug, Clone)]
pub struct RequestFormatter {
    endpoint: EndpointConfig,
    extensions: BTreeSet<String>,
    registry: OperationRegistry,
}

impl Default for RequestFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestFormatter {
    /// Default endpoint (`localhost:8000/`) and the baseline operation catalog.
    pub fn new() -> Self {
        Self {
            endpoint: EndpointConfig::default(),
            extensions: BTreeSet::new(),
            registry: OperationRegistry::baseline(),
        }
    }

    /// A formatter with `options` applied on top of the defaults.
    pub fn with_endpoint(options: &EndpointOptions) -> Self {
        let mut formatter = Self::new();
        formatter.init(options);
        formatter
    }

    /// Merge `options` into the endpoint and return the recomputed `full`.
    pub fn init(&mut self, options: &EndpointOptions) -> &str {
        let full = self.endpoint.apply(options);
        debug!(endpoint = full, "endpoint configured");
        full
    }

    pub fn endpoint(&self) -> &EndpointConfig {
        &self.endpoint
    }

    /// Recognise a JSON-API extension URI in `ext` media type parameters.
    pub fn support_extension(&mut self, uri: impl Into<String>) {
        self.extensions.insert(uri.into());
    }

    pub fn validate_request(&self, headers: &[(String, String)]) -> bool {
        self.check_request(headers).is_ok()
    }

    pub fn validate_response(&self, headers: &[(String, String)]) -> bool {
        self.check_response(headers).is_ok()
    }

    pub fn check_request(&self, headers: &[(String, String)]) -> Result<(), NegotiationViolation> {
        negotiation::check_request(headers, &self.extensions).inspect_err(|violation| {
            debug!(%violation, "request headers fail content negotiation");
        })
    }

    pub fn check_response(&self, headers: &[(String, String)]) -> Result<(), NegotiationViolation> {
        negotiation::check_response(headers).inspect_err(|violation| {
            debug!(%violation, "response headers fail content negotiation");
        })
    }

    /// Add `O` to the catalog. Returns the descriptor it replaced, if any.
    pub fn register<O: Operation>(&mut self) -> Option<OperationDescriptor> {
        let replaced = self.registry.insert(OperationDescriptor::of::<O>());
        if replaced.is_some() {
            warn!(operation = O::NAME, "operation re-registered");
        }
        replaced
    }

    /// Look up an operation by name.
    pub fn operation(&self, name: &str) -> Result<&OperationDescriptor, ApiError> {
        self.registry
            .get(name)
            .ok_or_else(|| ApiError::UnknownOperation(name.to_string()))
    }

    /// Registered operation names in sorted order.
    pub fn operations(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.registry.names()
    }

    /// Shape `O` for the current endpoint.
    pub fn request<O: Operation>(&self, args: &O::Args) -> Result<PreparedRequest, ApiError> {
        let payload = O::send(args)?;
        Ok(PreparedRequest {
            url: payload.url(&self.endpoint),
            payload,
        })
    }

    /// Shape `name` for the current endpoint from JSON arguments.
    pub fn request_by_name(&self, name: &str, args: &serde_json::Value) -> Result<PreparedRequest, ApiError> {
        let payload = self.operation(name)?.send(args)?;
        Ok(PreparedRequest {
            url: payload.url(&self.endpoint),
            payload,
        })
    }

    pub fn parse<O: Operation>(&self, raw: &RawResponse) -> Result<O::Output, ApiError> {
        O::recv(raw).inspect_err(|e| debug!(operation = O::NAME, error = %e, "response rejected"))
    }
}
