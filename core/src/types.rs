//! Domain DTOs for the Kioku REST API.
//!
//! # Design
//! Output types derive `Serialize` so the registry can hand them back as JSON.
//! The mock-server crate defines its own copies; the integration tests catch
//! drift between the two.

use serde::{Deserialize, Serialize};

/// Result of the `Test` probe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    /// Version of the JSON-API format the server speaks, if it says.
    pub jsonapi_version: Option<String>,
    /// Operation names the server claims to implement.
    pub operations: Vec<String>,
}

impl ServerInfo {
    /// Whether the server lists every operation in `names`.
    pub fn supports_all<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> bool {
        names
            .into_iter()
            .all(|name| self.operations.iter().any(|op| op == name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub version: String,
}

/// Directory the server loads its decks from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRoot {
    pub root: String,
}

/// A flashcard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deck: Option<String>,
    pub front: String,
    pub back: String,
}

/// Attributes of a `cards` resource.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CardAttributes {
    #[serde(default)]
    pub deck: Option<String>,
    pub front: String,
    pub back: String,
    #[serde(default)]
    pub buttons: Vec<GradeButton>,
}

/// A grading choice offered alongside a scheduled card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeButton {
    pub title: String,
    pub grade: u8,
}

/// The card due next in a deck and the grades the user may give it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledCard {
    pub card: Card,
    pub buttons: Vec<GradeButton>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardListQuery {
    /// Restrict the listing to one deck.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deck: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextCardQuery {
    pub deck: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeCardInput {
    pub card_id: String,
    pub grade: u8,
}

/// Server acknowledgement of a grade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeReceipt {
    pub card_id: String,
    pub grade: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supports_all_requires_every_name() {
        let info = ServerInfo {
            jsonapi_version: None,
            operations: vec!["Test".to_string(), "GetVersion".to_string()],
        };
        assert!(info.supports_all(["Test"]));
        assert!(!info.supports_all(["Test", "GetCardList"]));
    }

    #[test]
    fn card_list_query_accepts_empty_object() {
        let query: CardListQuery = serde_json::from_str("{}").unwrap();
        assert!(query.deck.is_none());
    }

    #[test]
    fn next_card_query_requires_deck() {
        assert!(serde_json::from_str::<NextCardQuery>("{}").is_err());
    }
}
