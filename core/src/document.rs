//! JSON-API document shapes.
//!
//! # Design
//! Incoming bodies are first checked against the top-level document rules
//! (an object holding `data`, `errors` or `meta`, never both `data` and
//! `errors`), then operations pull typed resources out of `data`. Error
//! documents surface as `ApiError::ErrorDocument` before any operation looks
//! at the payload.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ApiError;

/// The top-level `jsonapi` member.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JsonApiObject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Map<String, Value>>,
}

/// Where in the request an error originated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pointer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>,
}

/// A member of a JSON-API `errors` array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ErrorSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Map<String, Value>>,
}

/// A resource object whose attributes deserialize into `A`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource<A> {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    pub attributes: A,
}

/// A resource object sent by the client; `id` may be left to the server.
#[derive(Debug, Clone, Serialize)]
pub struct NewResource<A> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub attributes: A,
}

/// Serialize `{"data": resource}` as a request body.
pub fn encode_data<A: Serialize>(resource: &NewResource<A>) -> Result<String, ApiError> {
    #[derive(Serialize)]
    struct Envelope<'a, A: Serialize> {
        data: &'a NewResource<A>,
    }

    serde_json::to_string(&Envelope { data: resource }).map_err(|e| ApiError::Serialization(e.to_string()))
}

/// A top-level response document that passed the structural checks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub data: Option<Value>,
    pub meta: Option<Map<String, Value>>,
    pub jsonapi: Option<JsonApiObject>,
}

#[derive(Deserialize)]
struct RawDocument {
    #[serde(default, deserialize_with = "present")]
    data: Option<Value>,
    #[serde(default)]
    errors: Option<Vec<ErrorObject>>,
    #[serde(default)]
    meta: Option<Map<String, Value>>,
    #[serde(default)]
    jsonapi: Option<JsonApiObject>,
}

// Keeps `"data": null` distinct from a missing `data` member.
fn present<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

impl Document {
    /// Parse and structurally check a response body for `operation`.
    pub fn parse(operation: &'static str, body: &str) -> Result<Self, ApiError> {
        let value: Value = serde_json::from_str(body).map_err(|e| ApiError::malformed(operation, e.to_string()))?;
        if !value.is_object() {
            return Err(ApiError::malformed(operation, "top-level value is not an object"));
        }
        let raw: RawDocument =
            serde_json::from_value(value).map_err(|e| ApiError::malformed(operation, e.to_string()))?;

        match (raw.data, raw.errors) {
            (Some(_), Some(_)) => Err(ApiError::malformed(operation, "document holds both `data` and `errors`")),
            (None, Some(errors)) => Err(ApiError::ErrorDocument(errors)),
            (None, None) if raw.meta.is_none() => Err(ApiError::malformed(
                operation,
                "document holds none of `data`, `errors`, `meta`",
            )),
            (data, None) => Ok(Document {
                data,
                meta: raw.meta,
                jsonapi: raw.jsonapi,
            }),
        }
    }

    /// The primary data as a single resource of type `kind`.
    pub fn single<A: DeserializeOwned>(&self, operation: &'static str, kind: &str) -> Result<Resource<A>, ApiError> {
        match &self.data {
            Some(value @ Value::Object(_)) => resource(operation, kind, value.clone()),
            _ => Err(ApiError::malformed(operation, "`data` is not a resource object")),
        }
    }

    /// The primary data as a collection of resources of type `kind`.
    pub fn collection<A: DeserializeOwned>(
        &self,
        operation: &'static str,
        kind: &str,
    ) -> Result<Vec<Resource<A>>, ApiError> {
        match &self.data {
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| resource(operation, kind, item.clone()))
                .collect(),
            _ => Err(ApiError::malformed(operation, "`data` is not an array of resources")),
        }
    }
}

fn resource<A: DeserializeOwned>(operation: &'static str, kind: &str, value: Value) -> Result<Resource<A>, ApiError> {
    let resource: Resource<A> =
        serde_json::from_value(value).map_err(|e| ApiError::malformed(operation, e.to_string()))?;
    if resource.kind != kind {
        return Err(ApiError::malformed(
            operation,
            format!("expected `{kind}` resource, got `{}`", resource.kind),
        ));
    }
    Ok(resource)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Attrs {
        name: String,
    }

    #[test]
    fn meta_only_document_is_accepted() {
        let doc = Document::parse("Test", r#"{"meta":{"ok":true}}"#).unwrap();
        assert!(doc.data.is_none());
        assert_eq!(doc.meta.unwrap()["ok"], true);
    }

    #[test]
    fn null_data_counts_as_present() {
        let doc = Document::parse("Test", r#"{"data":null}"#).unwrap();
        assert_eq!(doc.data, Some(Value::Null));
    }

    #[test]
    fn empty_object_is_malformed() {
        let err = Document::parse("Test", "{}").unwrap_err();
        assert!(matches!(err, ApiError::MalformedResponse { operation: "Test", .. }));
    }

    #[test]
    fn non_object_is_malformed() {
        assert!(matches!(
            Document::parse("Test", "[1,2]").unwrap_err(),
            ApiError::MalformedResponse { .. }
        ));
        assert!(matches!(
            Document::parse("Test", "not json").unwrap_err(),
            ApiError::MalformedResponse { .. }
        ));
    }

    #[test]
    fn data_and_errors_together_is_malformed() {
        let err = Document::parse("Test", r#"{"data":null,"errors":[]}"#).unwrap_err();
        assert!(matches!(err, ApiError::MalformedResponse { .. }));
    }

    #[test]
    fn errors_become_error_document() {
        let body = r#"{"errors":[{"status":"404","title":"Not Found","source":{"parameter":"id"}}]}"#;
        match Document::parse("GetNextCard", body).unwrap_err() {
            ApiError::ErrorDocument(errors) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].status.as_deref(), Some("404"));
                assert_eq!(errors[0].source.as_ref().unwrap().parameter.as_deref(), Some("id"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn single_checks_resource_type() {
        let doc = Document::parse("Test", r#"{"data":{"type":"people","id":"1","attributes":{"name":"x"}}}"#).unwrap();
        let person: Resource<Attrs> = doc.single("Test", "people").unwrap();
        assert_eq!(person.id, "1");
        assert_eq!(person.attributes, Attrs { name: "x".to_string() });

        let err = doc.single::<Attrs>("Test", "cards").unwrap_err();
        assert!(matches!(err, ApiError::MalformedResponse { .. }));
    }

    #[test]
    fn collection_requires_array() {
        let doc = Document::parse("Test", r#"{"data":{"type":"people","id":"1","attributes":{"name":"x"}}}"#).unwrap();
        assert!(doc.collection::<Attrs>("Test", "people").is_err());
    }

    #[test]
    fn encode_data_omits_missing_id() {
        let body = encode_data(&NewResource {
            kind: "grades",
            id: None,
            attributes: serde_json::json!({"grade": 3}),
        })
        .unwrap();
        let value: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value, serde_json::json!({"data":{"type":"grades","attributes":{"grade":3}}}));
    }
}
