//! Route handlers.

use crate::error::ApiError;
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    Json,
};
use laneboard_core::{Client, ClientId, Lane, Reassignment};
use laneboard_store::ClientStore;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Arc, MutexGuard, PoisonError};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    status: Option<String>,
}

/// Body of `PUT /api/v1/clients/{id}`.
///
/// Fields stay raw JSON so a wrongly typed field is reported as a bad
/// status or priority rather than a bad body.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateRequest {
    /// Target lane
    #[serde(default)]
    status: Option<Value>,
    /// Target priority
    #[serde(default)]
    priority: Option<Value>,
}

impl UpdateRequest {
    /// Parse a request body; an empty body means no changes.
    fn from_bytes(body: &[u8]) -> Result<Self, ApiError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body)
            .map_err(|err| ApiError::bad_request("Invalid body", err.to_string()))
    }
}

// Poisoning is recoverable: an unfinished transaction rolls back on drop.
fn lock_store(state: &AppState) -> MutexGuard<'_, ClientStore> {
    state.store.lock().unwrap_or_else(PoisonError::into_inner)
}

fn parse_id(raw: &str) -> Result<ClientId, ApiError> {
    raw.parse::<ClientId>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::invalid_id(raw))
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn list_clients(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Client>>, ApiError> {
    let lane = query.status.as_deref().map(str::parse::<Lane>).transpose()?;
    let clients = lock_store(&state).list(lane)?;
    Ok(Json(clients))
}

pub async fn get_client(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Client>, ApiError> {
    let id = parse_id(&id)?;
    let client = lock_store(&state).get(id)?;
    Ok(Json(client))
}

pub async fn update_client(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Vec<Client>>, ApiError> {
    let id = parse_id(&id)?;
    let body = UpdateRequest::from_bytes(&body)?;

    // Validate everything before touching the store.
    let request = Reassignment::from_json(id, body.status.as_ref(), body.priority.as_ref())?;
    let clients = lock_store(&state).reassign(&request)?;
    Ok(Json(clients))
}
