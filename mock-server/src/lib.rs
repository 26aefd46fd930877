use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const MEDIA_TYPE: &str = "application/vnd.api+json";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Directory the decks are reported to live under.
pub const MODEL_ROOT: &str = "decks";
pub const OPERATIONS: [&str; 6] = [
    "Test",
    "GetVersion",
    "GetModelRoot",
    "GetCardList",
    "GetNextCard",
    "GradeCard",
];

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Card {
    pub id: Uuid,
    pub deck: String,
    pub front: String,
    pub back: String,
    pub reviews: u32,
}

#[derive(Deserialize)]
pub struct DeckFilter {
    #[serde(rename = "filter[deck]")]
    pub deck: Option<String>,
}

#[derive(Deserialize)]
pub struct GradeDocument {
    pub data: GradeResource,
}

#[derive(Deserialize)]
pub struct GradeResource {
    #[serde(rename = "type")]
    pub kind: String,
    pub attributes: GradeAttributes,
}

#[derive(Deserialize)]
pub struct GradeAttributes {
    pub grade: u8,
}

pub type Db = Arc<RwLock<HashMap<Uuid, Card>>>;

/// Cards every fresh server starts with.
pub fn seed() -> Vec<Card> {
    [
        ("client/testdeck", "hello", "こんにちは"),
        ("client/testdeck", "thank you", "ありがとう"),
        ("client/testdeck", "memory", "記憶"),
        ("client/kanji", "木", "tree"),
    ]
    .into_iter()
    .map(|(deck, front, back)| Card {
        id: Uuid::new_v4(),
        deck: deck.to_string(),
        front: front.to_string(),
        back: back.to_string(),
        reviews: 0,
    })
    .collect()
}

pub fn app() -> Router {
    app_with(seed())
}

pub fn app_with(cards: Vec<Card>) -> Router {
    let db: Db = Arc::new(RwLock::new(cards.into_iter().map(|c| (c.id, c)).collect()));
    Router::new()
        .route("/api/v1/", get(root))
        .route("/api/v1/version", get(version))
        .route("/api/v1/model-root", get(model_root))
        .route("/api/v1/cards", get(list_cards))
        .route("/api/v1/cards/next", get(next_card))
        .route("/api/v1/cards/{id}/grade", post(grade_card))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn document(status: StatusCode, body: Value) -> Response {
    (status, [(header::CONTENT_TYPE, MEDIA_TYPE)], Json(body)).into_response()
}

fn error(status: StatusCode, title: &str, detail: String) -> Response {
    tracing::debug!(%status, %detail, "request rejected");
    document(
        status,
        json!({"errors": [{"status": status.as_u16().to_string(), "title": title, "detail": detail}]}),
    )
}

fn card_resource(card: &Card) -> Value {
    json!({
        "type": "cards",
        "id": card.id,
        "attributes": {"deck": card.deck, "front": card.front, "back": card.back},
    })
}

async fn root() -> Response {
    document(
        StatusCode::OK,
        json!({"jsonapi": {"version": "1.1"}, "meta": {"operations": OPERATIONS}}),
    )
}

async fn version() -> Response {
    document(
        StatusCode::OK,
        json!({"data": {"type": "version", "id": "kioku", "attributes": {"version": VERSION}}}),
    )
}

async fn model_root() -> Response {
    document(
        StatusCode::OK,
        json!({"data": {"type": "model-root", "id": "kioku", "attributes": {"model-root": MODEL_ROOT}}}),
    )
}

async fn list_cards(State(db): State<Db>, Query(filter): Query<DeckFilter>) -> Response {
    let cards = db.read().await;
    let mut selected: Vec<&Card> = cards
        .values()
        .filter(|c| filter.deck.as_deref().map_or(true, |deck| c.deck == deck))
        .collect();
    selected.sort_by(|a, b| (&a.deck, &a.front).cmp(&(&b.deck, &b.front)));
    let data: Vec<Value> = selected.into_iter().map(card_resource).collect();
    document(StatusCode::OK, json!({ "data": data }))
}

async fn next_card(State(db): State<Db>, Query(filter): Query<DeckFilter>) -> Response {
    let Some(deck) = filter.deck else {
        return error(StatusCode::BAD_REQUEST, "Missing deck", "filter[deck] is required".to_string());
    };
    let cards = db.read().await;
    let next = cards
        .values()
        .filter(|c| c.deck == deck)
        .min_by(|a, b| (a.reviews, &a.front).cmp(&(b.reviews, &b.front)));
    let Some(card) = next else {
        return error(StatusCode::NOT_FOUND, "Not Found", format!("Deck [{deck}] has no cards"));
    };

    let mut resource = card_resource(card);
    resource["attributes"]["buttons"] = json!([
        {"title": "Again", "grade": 1},
        {"title": "Good", "grade": 3},
        {"title": "Easy", "grade": 4},
    ]);
    document(StatusCode::OK, json!({ "data": resource }))
}

async fn grade_card(State(db): State<Db>, Path(id): Path<String>, headers: HeaderMap, body: String) -> Response {
    let content_type = headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok());
    if content_type != Some(MEDIA_TYPE) {
        return error(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "Unsupported Media Type",
            format!("expected Content-Type {MEDIA_TYPE}"),
        );
    }
    let grade = match serde_json::from_str::<GradeDocument>(&body) {
        Ok(doc) if doc.data.kind == "grades" => doc.data.attributes.grade,
        Ok(doc) => {
            return error(
                StatusCode::CONFLICT,
                "Conflict",
                format!("expected `grades` resource, got `{}`", doc.data.kind),
            )
        }
        Err(e) => return error(StatusCode::BAD_REQUEST, "Bad Request", e.to_string()),
    };
    if !(1..=4).contains(&grade) {
        return error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Invalid grade",
            format!("grade {grade} is outside 1..=4"),
        );
    }

    // Ids that are not UUIDs name no card; answer like any other unknown id.
    let mut cards = db.write().await;
    let Some(card) = Uuid::parse_str(&id).ok().and_then(|uuid| cards.get_mut(&uuid)) else {
        return error(StatusCode::NOT_FOUND, "Not Found", format!("Card [{id}] does not exist"));
    };
    card.reviews += 1;
    tracing::info!(card = %id, grade, reviews = card.reviews, "card graded");
    document(
        StatusCode::OK,
        json!({"data": {"type": "grades", "id": id, "attributes": {"grade": grade}}}),
    )
}
