//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! Requests and responses are plain data. Operations produce a
//! `RequestPayload` whose `path` is relative to the configured endpoint, and
//! consume a `RawResponse` the caller assembled after doing the round-trip.
//! Nothing here touches the network.

use crate::endpoint::EndpointConfig;

/// The JSON-API media type carried by `Content-Type` and `Accept`.
pub const MEDIA_TYPE: &str = "application/vnd.api+json";

/// An ordered list of `(name, value)` header pairs. Names are matched
/// case-insensitively by every consumer in this crate.
pub type HeaderSet = Vec<(String, String)>;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// An outgoing request described as plain data.
///
/// `path` is relative to `EndpointConfig::full`; use [`RequestPayload::url`]
/// to join the two. The caller adds the scheme and executes the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestPayload {
    pub method: HttpMethod,
    pub path: String,
    pub headers: HeaderSet,
    pub body: Option<String>,
}

impl RequestPayload {
    /// A bodyless `GET` that asks for a JSON-API document.
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            path: path.into(),
            headers: vec![("accept".to_string(), MEDIA_TYPE.to_string())],
            body: None,
        }
    }

    /// A `POST` carrying a serialized JSON-API document.
    pub fn post(path: impl Into<String>, body: String) -> Self {
        Self {
            method: HttpMethod::Post,
            path: path.into(),
            headers: vec![
                ("accept".to_string(), MEDIA_TYPE.to_string()),
                ("content-type".to_string(), MEDIA_TYPE.to_string()),
            ],
            body: Some(body),
        }
    }

    /// Absolute location (without scheme) of this request for `endpoint`.
    pub fn url(&self, endpoint: &EndpointConfig) -> String {
        format!("{}{}", endpoint.full(), self.path)
    }
}

/// An HTTP response described as plain data.
///
/// Constructed by the caller after executing a `RequestPayload`, then handed
/// to an operation's `recv`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub headers: HeaderSet,
    pub body: String,
}

impl RawResponse {
    /// First value of the header `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

pub(crate) fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// Every value of the header `name`, in order.
pub(crate) fn header_values<'a>(
    headers: &'a [(String, String)],
    name: &'a str,
) -> impl Iterator<Item = &'a str> + 'a {
    headers
        .iter()
        .filter(move |(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::EndpointOptions;

    #[test]
    fn get_payload_asks_for_json_api() {
        let payload = RequestPayload::get("version");
        assert_eq!(payload.method, HttpMethod::Get);
        assert_eq!(payload.headers, vec![("accept".to_string(), MEDIA_TYPE.to_string())]);
        assert!(payload.body.is_none());
    }

    #[test]
    fn url_joins_endpoint_and_relative_path() {
        let mut endpoint = EndpointConfig::default();
        endpoint.apply(&EndpointOptions {
            path: Some("api/v1".to_string()),
            ..Default::default()
        });
        let payload = RequestPayload::get("cards");
        assert_eq!(payload.url(&endpoint), "localhost:8000/api/v1/cards");
    }

    #[test]
    fn header_lookup_ignores_case() {
        let response = RawResponse {
            status: 200,
            headers: vec![("Content-Type".to_string(), MEDIA_TYPE.to_string())],
            body: String::new(),
        };
        assert_eq!(response.header("content-type"), Some(MEDIA_TYPE));
        assert_eq!(response.header("accept"), None);
    }

    #[test]
    fn header_values_keeps_repeats_in_order() {
        let headers = vec![
            ("Accept".to_string(), "a/b".to_string()),
            ("X-Other".to_string(), "x".to_string()),
            ("accept".to_string(), "c/d".to_string()),
        ];
        let values: Vec<_> = header_values(&headers, "ACCEPT").collect();
        assert_eq!(values, ["a/b", "c/d"]);
    }
}
