//! Error types for the Kioku REST formatter.
//!
//! # Design
//! Two families. `NegotiationViolation` explains why a header set failed
//! content negotiation; it is informational and the `validate_*` helpers
//! collapse it to a `bool`. `ApiError` is returned by operations and always
//! propagates to the caller. Transport failures never appear here: the caller
//! owns the network.

use thiserror::Error;

use crate::document::ErrorObject;

/// Why a header set does not satisfy JSON-API content negotiation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NegotiationViolation {
    /// A response carried no `Content-Type` header.
    #[error("missing Content-Type header")]
    MissingContentType,

    /// `Content-Type` names some other media type.
    #[error("Content-Type is not the JSON-API media type: {0}")]
    ContentTypeMediaType(String),

    /// `Content-Type` carries a parameter that is not permitted.
    #[error("Content-Type carries unsupported parameter `{0}`")]
    ContentTypeParameter(String),

    /// `Accept` is present but never lists the JSON-API media type.
    #[error("Accept does not list the JSON-API media type")]
    AcceptMissingJsonApi,

    /// A JSON-API instance in `Accept` carries a parameter that is not permitted.
    #[error("Accept carries unsupported parameter `{0}` on the JSON-API media type")]
    AcceptParameter(String),

    /// An `ext` parameter names an extension this formatter does not know.
    #[error("unsupported JSON-API extension `{0}`")]
    UnsupportedExtension(String),

    /// The header value could not be parsed as a media type list.
    #[error("malformed {name} header: {value:?}")]
    MalformedHeader { name: String, value: String },
}

/// Errors returned by operations and the operation registry.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The response body does not have the shape the operation expects.
    #[error("malformed {operation} response: {reason}")]
    MalformedResponse { operation: &'static str, reason: String },

    /// The server answered with a JSON-API error document.
    #[error("server returned {} error object(s)", .0.len())]
    ErrorDocument(Vec<ErrorObject>),

    /// No operation is registered under this name.
    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    /// Name-addressed `send` received arguments of the wrong shape.
    #[error("invalid arguments for {operation}: {reason}")]
    InvalidArguments { operation: &'static str, reason: String },

    /// A request document or an operation output could not be serialized.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl ApiError {
    pub(crate) fn malformed(operation: &'static str, reason: impl Into<String>) -> Self {
        ApiError::MalformedResponse {
            operation,
            reason: reason.into(),
        }
    }
}
