//! The operation catalog.
//!
//! # Design
//! Each operation is a unit type implementing [`Operation`]: a pure `send`
//! that shapes a `RequestPayload` from typed arguments and a `recv` that
//! shape-checks a `RawResponse` into a typed output. Paths are relative to the
//! configured endpoint, which on a Kioku server points at `api/v1`.
//! Status codes are not inspected; the body alone decides success.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::document::{encode_data, Document, NewResource, Resource};
use crate::error::ApiError;
use crate::http::{RawResponse, RequestPayload};
use crate::types::{
    Card, CardAttributes, CardListQuery, GradeButton, GradeCardInput, GradeReceipt, ModelRoot, NextCardQuery,
    ScheduledCard, ServerInfo, Version,
};

/// A named request/response pair.
pub trait Operation {
    /// Registry key.
    const NAME: &'static str;
    type Args: DeserializeOwned;
    type Output: Serialize;

    fn send(args: &Self::Args) -> Result<RequestPayload, ApiError>;
    fn recv(raw: &RawResponse) -> Result<Self::Output, ApiError>;
}

/// Connectivity probe: fetches the API root and reports which operations the
/// server claims to implement.
#[derive(Debug, Clone, Copy)]
pub struct Test;

impl Operation for Test {
    const NAME: &'static str = "Test";
    type Args = ();
    type Output = ServerInfo;

    fn send(_: &()) -> Result<RequestPayload, ApiError> {
        Ok(RequestPayload::get(""))
    }

    fn recv(raw: &RawResponse) -> Result<ServerInfo, ApiError> {
        let doc = Document::parse(Self::NAME, &raw.body)?;
        let operations = doc
            .meta
            .as_ref()
            .and_then(|meta| meta.get("operations"))
            .ok_or_else(|| ApiError::malformed(Self::NAME, "missing `meta.operations`"))?;
        let operations: Vec<String> = serde_json::from_value(operations.clone())
            .map_err(|e| ApiError::malformed(Self::NAME, format!("`meta.operations`: {e}")))?;
        Ok(ServerInfo {
            jsonapi_version: doc.jsonapi.and_then(|j| j.version),
            operations,
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GetVersion;

impl Operation for GetVersion {
    const NAME: &'static str = "GetVersion";
    type Args = ();
    type Output = Version;

    fn send(_: &()) -> Result<RequestPayload, ApiError> {
        Ok(RequestPayload::get("version"))
    }

    fn recv(raw: &RawResponse) -> Result<Version, ApiError> {
        #[derive(Deserialize)]
        struct Attributes {
            version: String,
        }

        let resource: Resource<Attributes> = Document::parse(Self::NAME, &raw.body)?.single(Self::NAME, "version")?;
        Ok(Version {
            version: resource.attributes.version,
        })
    }
}

/// Where the server keeps its decks on disk.
#[derive(Debug, Clone, Copy)]
pub struct GetModelRoot;

impl Operation for GetModelRoot {
    const NAME: &'static str = "GetModelRoot";
    type Args = ();
    type Output = ModelRoot;

    fn send(_: &()) -> Result<RequestPayload, ApiError> {
        Ok(RequestPayload::get("model-root"))
    }

    fn recv(raw: &RawResponse) -> Result<ModelRoot, ApiError> {
        #[derive(Deserialize)]
        struct Attributes {
            #[serde(rename = "model-root")]
            root: String,
        }

        let resource: Resource<Attributes> =
            Document::parse(Self::NAME, &raw.body)?.single(Self::NAME, "model-root")?;
        Ok(ModelRoot {
            root: resource.attributes.root,
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GetCardList;

impl Operation for GetCardList {
    const NAME: &'static str = "GetCardList";
    type Args = CardListQuery;
    type Output = Vec<Card>;

    fn send(args: &CardListQuery) -> Result<RequestPayload, ApiError> {
        let path = match &args.deck {
            Some(deck) => format!("cards?{}", deck_filter(deck)),
            None => "cards".to_string(),
        };
        Ok(RequestPayload::get(path))
    }

    fn recv(raw: &RawResponse) -> Result<Vec<Card>, ApiError> {
        let resources: Vec<Resource<CardAttributes>> =
            Document::parse(Self::NAME, &raw.body)?.collection(Self::NAME, "cards")?;
        Ok(resources.into_iter().map(|r| card(r).0).collect())
    }
}

/// The card due next in a deck.
#[derive(Debug, Clone, Copy)]
pub struct GetNextCard;

impl Operation for GetNextCard {
    const NAME: &'static str = "GetNextCard";
    type Args = NextCardQuery;
    type Output = ScheduledCard;

    fn send(args: &NextCardQuery) -> Result<RequestPayload, ApiError> {
        if args.deck.is_empty() {
            return Err(invalid(Self::NAME, "deck must not be empty"));
        }
        Ok(RequestPayload::get(format!("cards/next?{}", deck_filter(&args.deck))))
    }

    fn recv(raw: &RawResponse) -> Result<ScheduledCard, ApiError> {
        let resource: Resource<CardAttributes> = Document::parse(Self::NAME, &raw.body)?.single(Self::NAME, "cards")?;
        let (card, buttons) = card(resource);
        if buttons.is_empty() {
            return Err(ApiError::malformed(Self::NAME, "scheduled card offers no grade buttons"));
        }
        Ok(ScheduledCard { card, buttons })
    }
}

/// Record the user's grade for a card.
#[derive(Debug, Clone, Copy)]
pub struct GradeCard;

#[derive(Debug, Serialize, Deserialize)]
struct GradeAttributes {
    grade: u8,
}

impl Operation for GradeCard {
    const NAME: &'static str = "GradeCard";
    type Args = GradeCardInput;
    type Output = GradeReceipt;

    fn send(args: &GradeCardInput) -> Result<RequestPayload, ApiError> {
        if !is_path_segment(&args.card_id) {
            return Err(invalid(Self::NAME, format!("card id {:?} is not a plain path segment", args.card_id)));
        }
        let body = encode_data(&NewResource {
            kind: "grades",
            id: None,
            attributes: GradeAttributes { grade: args.grade },
        })?;
        Ok(RequestPayload::post(format!("cards/{}/grade", args.card_id), body))
    }

    fn recv(raw: &RawResponse) -> Result<GradeReceipt, ApiError> {
        let resource: Resource<GradeAttributes> =
            Document::parse(Self::NAME, &raw.body)?.single(Self::NAME, "grades")?;
        Ok(GradeReceipt {
            card_id: resource.id,
            grade: resource.attributes.grade,
        })
    }
}

fn card(resource: Resource<CardAttributes>) -> (Card, Vec<GradeButton>) {
    let attributes = resource.attributes;
    let card = Card {
        id: resource.id,
        deck: attributes.deck,
        front: attributes.front,
        back: attributes.back,
    };
    (card, attributes.buttons)
}

fn deck_filter(deck: &str) -> String {
    form_urlencoded::Serializer::new(String::new())
        .append_pair("filter[deck]", deck)
        .finish()
}

// RFC 3986 unreserved characters only.
fn is_path_segment(s: &str) -> bool {
    !s.is_empty()
        && s.bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~'))
}

fn invalid(operation: &'static str, reason: impl Into<String>) -> ApiError {
    ApiError::InvalidArguments {
        operation,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpMethod, MEDIA_TYPE};

    fn ok(body: &str) -> RawResponse {
        RawResponse {
            status: 200,
            headers: vec![("content-type".to_string(), MEDIA_TYPE.to_string())],
            body: body.to_string(),
        }
    }

    #[test]
    fn get_version_needs_no_arguments() {
        let req = GetVersion::send(&()).unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.path, "version");
        assert!(req.body.is_none());
    }

    #[test]
    fn get_version_parses_version_resource() {
        let raw = ok(r#"{"data":{"type":"version","id":"kioku","attributes":{"version":"0.1.0"}}}"#);
        assert_eq!(GetVersion::recv(&raw).unwrap().version, "0.1.0");
    }

    #[test]
    fn get_version_without_version_field_is_malformed() {
        let raw = ok(r#"{"data":{"type":"version","id":"kioku","attributes":{}}}"#);
        let err = GetVersion::recv(&raw).unwrap_err();
        assert!(matches!(err, ApiError::MalformedResponse { operation: "GetVersion", .. }));
    }

    #[test]
    fn get_model_root_reads_hyphenated_attribute() {
        let req = GetModelRoot::send(&()).unwrap();
        assert_eq!(req.path, "model-root");
        let raw = ok(r#"{"data":{"type":"model-root","id":"kioku","attributes":{"model-root":"decks"}}}"#);
        assert_eq!(GetModelRoot::recv(&raw).unwrap().root, "decks");
    }

    #[test]
    fn get_model_root_rejects_other_resource_types() {
        let raw = ok(r#"{"data":{"type":"version","id":"kioku","attributes":{"model-root":"decks"}}}"#);
        let err = GetModelRoot::recv(&raw).unwrap_err();
        assert!(matches!(err, ApiError::MalformedResponse { operation: "GetModelRoot", .. }));
    }

    #[test]
    fn test_probe_reads_meta_operations() {
        let raw = ok(r#"{"jsonapi":{"version":"1.1"},"meta":{"operations":["Test","GetVersion"]}}"#);
        let info = Test::recv(&raw).unwrap();
        assert_eq!(info.jsonapi_version.as_deref(), Some("1.1"));
        assert!(info.supports_all(["Test", "GetVersion"]));
    }

    #[test]
    fn test_probe_without_operations_is_malformed() {
        let err = Test::recv(&ok(r#"{"meta":{}}"#)).unwrap_err();
        assert!(matches!(err, ApiError::MalformedResponse { .. }));
    }

    #[test]
    fn card_list_encodes_deck_filter() {
        let req = GetCardList::send(&CardListQuery {
            deck: Some("client/test deck".to_string()),
        })
        .unwrap();
        assert_eq!(req.path, "cards?filter%5Bdeck%5D=client%2Ftest+deck");

        let req = GetCardList::send(&CardListQuery::default()).unwrap();
        assert_eq!(req.path, "cards");
    }

    #[test]
    fn card_list_rejects_wrong_resource_type() {
        let raw = ok(r#"{"data":[{"type":"notes","id":"1","attributes":{"front":"a","back":"b"}}]}"#);
        assert!(matches!(
            GetCardList::recv(&raw).unwrap_err(),
            ApiError::MalformedResponse { .. }
        ));
    }

    #[test]
    fn card_list_empty_array_is_fine() {
        assert!(GetCardList::recv(&ok(r#"{"data":[]}"#)).unwrap().is_empty());
    }

    #[test]
    fn next_card_requires_buttons() {
        let raw = ok(r#"{"data":{"type":"cards","id":"c1","attributes":{"front":"f","back":"b"}}}"#);
        assert!(matches!(
            GetNextCard::recv(&raw).unwrap_err(),
            ApiError::MalformedResponse { .. }
        ));
    }

    #[test]
    fn next_card_rejects_empty_deck() {
        let err = GetNextCard::send(&NextCardQuery { deck: String::new() }).unwrap_err();
        assert!(matches!(err, ApiError::InvalidArguments { operation: "GetNextCard", .. }));
    }

    #[test]
    fn grade_card_posts_grade_document() {
        let req = GradeCard::send(&GradeCardInput {
            card_id: "c1".to_string(),
            grade: 3,
        })
        .unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.path, "cards/c1/grade");
        assert!(req
            .headers
            .contains(&("content-type".to_string(), MEDIA_TYPE.to_string())));
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({"data":{"type":"grades","attributes":{"grade":3}}}));
    }

    #[test]
    fn grade_card_rejects_path_breaking_ids() {
        for id in ["", "a/b", "../x", "a b"] {
            let err = GradeCard::send(&GradeCardInput {
                card_id: id.to_string(),
                grade: 1,
            })
            .unwrap_err();
            assert!(matches!(err, ApiError::InvalidArguments { .. }), "{id:?}");
        }
    }
}
