//! Request/response formatting for the Kioku JSON-API REST interface.
//!
//! # Overview
//! Shapes outgoing requests and checks incoming responses without touching
//! the network (host-does-IO pattern). The embedding application sends each
//! `RequestPayload` with its own HTTP client and hands the `RawResponse` back
//! to the matching operation.
//!
//! # Design
//! - `RequestFormatter` owns one `EndpointConfig`; instances are independent.
//! - Content negotiation follows the JSON-API rules for
//!   `application/vnd.api+json`. `validate_*` return `bool`; `check_*` say why.
//! - Operations are typed `Operation` impls. The registry wraps them as
//!   name-addressed `{send, recv}` function pointer pairs, so adding an
//!   operation never changes the formatter or the existing catalog.
//! - HTTP status codes are the transport's business; `recv` only judges shape.

pub mod document;
pub mod endpoint;
pub mod error;
pub mod formatter;
pub mod http;
pub mod negotiation;
pub mod operation;
pub mod registry;
pub mod types;

pub use endpoint::{EndpointConfig, EndpointOptions};
pub use error::{ApiError, NegotiationViolation};
pub use formatter::{PreparedRequest, RequestFormatter};
pub use http::{HeaderSet, HttpMethod, RawResponse, RequestPayload, MEDIA_TYPE};
pub use operation::{GetCardList, GetModelRoot, GetNextCard, GetVersion, GradeCard, Operation, Test};
pub use registry::{OperationDescriptor, OperationRegistry};
pub use types::{
    Card, CardListQuery, GradeButton, GradeCardInput, GradeReceipt, ModelRoot, NextCardQuery, ScheduledCard, ServerInfo,
    Version,
};
