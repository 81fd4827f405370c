//! Item endpoints
//!
//! Both handlers check the database state before using the pool. The
//! create body is extracted up front but only inspected once the state is
//! Ready, so a degraded service answers 503 even for a malformed body.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::db::{Item, ItemRepo, DEFAULT_LIST_LIMIT};
use crate::http::error::ApiError;
use crate::models::{ItemName, NewItem};
use crate::state::AppState;

/// Create item request
#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl TryFrom<CreateItemRequest> for NewItem {
    type Error = crate::models::ValidationError;

    fn try_from(req: CreateItemRequest) -> Result<Self, Self::Error> {
        Ok(NewItem {
            name: ItemName::new(req.name)?,
            description: req.description,
        })
    }
}

/// Item response
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemResponse {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub created_at: Option<String>,
}

impl From<Item> for ItemResponse {
    fn from(item: Item) -> Self {
        Self {
            id: item.id,
            name: item.name,
            description: item.description,
            created_at: item.created_at.map(|ts| ts.to_string()),
        }
    }
}

/// GET /items - newest items first, at most 100
async fn list_items(State(state): State<AppState>) -> Result<Json<Vec<ItemResponse>>, ApiError> {
    tracing::info!("Fetching items from database");

    let mut session = state.db().acquire().await?;
    let items = ItemRepo::new(&mut session).list(DEFAULT_LIST_LIMIT).await?;
    tracing::info!(count = items.len(), "Retrieved items");

    Ok(Json(items.into_iter().map(ItemResponse::from).collect()))
}

/// POST /items - create a new item
async fn create_item(
    State(state): State<AppState>,
    body: Result<Json<CreateItemRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ItemResponse>), ApiError> {
    if !state.db().is_ready() {
        return Err(ApiError::Unavailable);
    }

    let Json(req) = body?;
    let new_item = NewItem::try_from(req)?;
    tracing::info!(name = %new_item.name.as_str(), "Creating item");

    let mut session = state.db().acquire().await?;
    let item = ItemRepo::new(&mut session).create(new_item).await?;
    tracing::info!(id = item.id, "Item created successfully");

    Ok((StatusCode::CREATED, Json(ItemResponse::from(item))))
}

/// Item routes
pub fn router() -> Router<AppState> {
    Router::new().route("/items", get(list_items).post(create_item))
}
