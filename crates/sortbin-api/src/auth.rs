//! HTTP Basic-auth credential adapter and the role-guarding extractors.
//!
//! Credentials only establish an [`Identity`]. Whether that identity may use
//! the system, and with which role, is decided by the same
//! [`AccessPolicy`](sortbin_core::policy::AccessPolicy) the session layer
//! uses, on every request.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
  Json,
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use serde::Deserialize;
use sortbin_core::{
  identity::{self, Identity},
  store::DirectoryStore,
};
use tracing::debug;

use crate::{AppState, error::ApiError};

/// A local account able to sign in with a password.
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
  /// Whitelist key for this account.
  pub subject_id:    String,
  pub email:         String,
  #[serde(default)]
  pub display_name:  Option<String>,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
}

/// The configured accounts, looked up by email.
#[derive(Debug, Clone, Default)]
pub struct Accounts {
  accounts: Vec<Account>,
}

impl Accounts {
  pub fn new(accounts: Vec<Account>) -> Self { Self { accounts } }

  /// Verify the `Authorization: Basic` header and return the matching
  /// identity.
  pub fn verify(&self, headers: &HeaderMap) -> Result<Identity, ApiError> {
    let header_val = headers
      .get(header::AUTHORIZATION)
      .and_then(|v| v.to_str().ok())
      .ok_or(ApiError::Unauthorized)?;

    let encoded = header_val
      .strip_prefix("Basic ")
      .ok_or(ApiError::Unauthorized)?;

    let decoded = B64.decode(encoded).map_err(|_| ApiError::Unauthorized)?;
    let creds = std::str::from_utf8(&decoded).map_err(|_| ApiError::Unauthorized)?;

    let (email, password) = creds.split_once(':').ok_or(ApiError::Unauthorized)?;

    let account = self
      .accounts
      .iter()
      .find(|a| a.email == email)
      .ok_or(ApiError::Unauthorized)?;

    let parsed_hash =
      PasswordHash::new(&account.password_hash).map_err(|_| ApiError::Unauthorized)?;

    Argon2::default()
      .verify_password(password.as_bytes(), &parsed_hash)
      .map_err(|_| {
        debug!(email, "password mismatch");
        ApiError::Unauthorized
      })?;

    Ok(Identity {
      subject_id:   account.subject_id.clone(),
      email:        account.email.clone(),
      display_name: account.display_name.clone(),
    })
  }
}

// ─── Extractors ──────────────────────────────────────────────────────────────

/// An authenticated caller that passed the access policy, with any role.
pub struct Principal(pub identity::Principal);

/// An authenticated caller whose whitelist role is `admin`.
pub struct Admin(pub identity::Principal);

impl<S> FromRequestParts<AppState<S>> for Principal
where
  S: DirectoryStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let identity = state.accounts.verify(&parts.headers)?;
    let principal = state
      .policy
      .evaluate(&identity, state.store.as_ref())
      .await
      .into_principal(identity)?;
    Ok(Self(principal))
  }
}

impl<S> FromRequestParts<AppState<S>> for Admin
where
  S: DirectoryStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let Principal(principal) = Principal::from_request_parts(parts, state).await?;
    if !principal.is_admin() {
      return Err(ApiError::Forbidden);
    }
    Ok(Self(principal))
  }
}

/// `GET /session`: the caller's identity and role.
pub async fn session(Principal(principal): Principal) -> Json<identity::Principal> {
  Json(principal)
}
