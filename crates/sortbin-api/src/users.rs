//! Handlers for `/users` endpoints. Every route requires the `admin` role.
//!
//! | Method   | Path                        | Notes |
//! |----------|-----------------------------|-------|
//! | `GET`    | `/users`                    | All whitelist entries |
//! | `PUT`    | `/users/{subject_id}`       | Body: `{"role", "email"?, "display_name"?}` |
//! | `PUT`    | `/users/{subject_id}/role`  | Body: `{"role": "admin"\|"user"}` |
//! | `DELETE` | `/users/{subject_id}`       | 204 whether or not the entry existed |

use axum::{
  Json,
  extract::{Path, State, rejection::JsonRejection},
  http::StatusCode,
};
use serde::Deserialize;
use sortbin_core::{
  identity::Role,
  store::DirectoryStore,
  whitelist::{EntryPatch, WhitelistEntry},
};
use tracing::info;

use crate::{AppState, auth::Admin, error::ApiError};

/// `GET /users`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  _: Admin,
) -> Result<Json<Vec<WhitelistEntry>>, ApiError>
where
  S: DirectoryStore + 'static,
{
  Ok(Json(state.users.list_all().await?))
}

/// `PUT /users/{subject_id}`
pub async fn upsert<S>(
  State(state): State<AppState<S>>,
  Admin(admin): Admin,
  Path(subject_id): Path<String>,
  body: Result<Json<EntryPatch>, JsonRejection>,
) -> Result<Json<WhitelistEntry>, ApiError>
where
  S: DirectoryStore + 'static,
{
  let Json(patch) = body?;
  let entry = state.users.upsert(&subject_id, patch).await?;
  info!(by = %admin.identity.subject_id, subject_id = %entry.subject_id, "user upserted");
  Ok(Json(entry))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoleBody {
  pub role: Role,
}

/// `PUT /users/{subject_id}/role`
pub async fn set_role<S>(
  State(state): State<AppState<S>>,
  Admin(admin): Admin,
  Path(subject_id): Path<String>,
  body: Result<Json<RoleBody>, JsonRejection>,
) -> Result<Json<WhitelistEntry>, ApiError>
where
  S: DirectoryStore + 'static,
{
  let Json(RoleBody { role }) = body?;
  let entry = state.users.set_role(&subject_id, role).await?;
  info!(by = %admin.identity.subject_id, subject_id = %entry.subject_id, %role, "role changed");
  Ok(Json(entry))
}

/// `DELETE /users/{subject_id}`
pub async fn remove<S>(
  State(state): State<AppState<S>>,
  Admin(admin): Admin,
  Path(subject_id): Path<String>,
) -> Result<StatusCode, ApiError>
where
  S: DirectoryStore + 'static,
{
  state.users.remove(&subject_id).await?;
  info!(by = %admin.identity.subject_id, subject_id, "user removed");
  Ok(StatusCode::NO_CONTENT)
}
