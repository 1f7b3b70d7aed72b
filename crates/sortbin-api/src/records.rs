//! Handlers for `/records` endpoints.
//!
//! | Method   | Path            | Notes |
//! |----------|-----------------|-------|
//! | `GET`    | `/records`      | Optional `?year=2025&q=plastic`; newest first |
//! | `POST`   | `/records`      | Body: [`NewRecord`]; 201 `{"id": …}` |
//! | `GET`    | `/records/{id}` | 404 if not found |
//! | `PATCH`  | `/records/{id}` | Body: [`RecordPatch`]; returns the record |
//! | `DELETE` | `/records/{id}` | 204; 404 if already gone |

use axum::{
  Json,
  extract::{Path, Query, State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use sortbin_core::{
  record::{NewRecord, RecordPatch, WasteRecord},
  store::DirectoryStore,
};
use uuid::Uuid;

use crate::{AppState, auth::Principal, error::ApiError};

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub year: Option<i32>,
  /// Case-insensitive filter over category, sub-category and item type.
  pub q:    Option<String>,
}

/// `GET /records[?year=<year>][&q=<text>]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  _: Principal,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<WasteRecord>>, ApiError>
where
  S: DirectoryStore + 'static,
{
  let records = match (params.year, params.q.as_deref()) {
    (year, Some(term)) if !term.trim().is_empty() => state.records.search(year, term).await?,
    (Some(year), _) => state.records.list_by_year(year).await?,
    (None, _) => state.records.list().await?,
  };
  Ok(Json(records))
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// `POST /records`. The caller becomes `recorded_by`.
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Principal(caller): Principal,
  body: Result<Json<NewRecord>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DirectoryStore + 'static,
{
  let Json(record) = body?;
  let id = state
    .records
    .add(record, &caller.identity.subject_id)
    .await?;
  Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /records/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  _: Principal,
  Path(id): Path<Uuid>,
) -> Result<Json<WasteRecord>, ApiError>
where
  S: DirectoryStore + 'static,
{
  Ok(Json(state.records.get(id).await?))
}

// ─── Update ──────────────────────────────────────────────────────────────────

/// `PATCH /records/{id}`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  _: Principal,
  Path(id): Path<Uuid>,
  body: Result<Json<RecordPatch>, JsonRejection>,
) -> Result<Json<WasteRecord>, ApiError>
where
  S: DirectoryStore + 'static,
{
  let Json(patch) = body?;
  state.records.update(id, patch).await?;
  Ok(Json(state.records.get(id).await?))
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// `DELETE /records/{id}`
pub async fn remove<S>(
  State(state): State<AppState<S>>,
  _: Principal,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: DirectoryStore + 'static,
{
  state.records.delete(id).await?;
  Ok(StatusCode::NO_CONTENT)
}
