//! JSON HTTP API for sortbin.
//!
//! Exposes an axum [`Router`] backed by any [`DirectoryStore`]. Callers
//! authenticate with HTTP Basic credentials of a configured [`Account`];
//! every request is then run through the access policy.
//!
//! [`Account`]: auth::Account

pub mod auth;
pub mod error;
pub mod records;
pub mod summary;
pub mod users;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, put},
};
use serde::Deserialize;
use sortbin_core::{
  config::AccessConfig, policy::AccessPolicy, repository::RecordRepository,
  store::DirectoryStore, users::UserDirectory,
};
use tower_http::trace::TraceLayer;

use auth::{Account, Accounts};

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `SORTBIN_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  pub store_path: PathBuf,
  #[serde(default)]
  pub access:     AccessConfig,
  #[serde(default)]
  pub accounts:   Vec<Account>,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8080 }

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub store:    Arc<S>,
  pub policy:   AccessPolicy,
  pub accounts: Arc<Accounts>,
  pub records:  RecordRepository<S>,
  pub users:    UserDirectory<S>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      policy:   self.policy.clone(),
      accounts: Arc::clone(&self.accounts),
      records:  self.records.clone(),
      users:    self.users.clone(),
    }
  }
}

impl<S: DirectoryStore> AppState<S> {
  /// Wire the services over `store`. Fails if the access configuration is
  /// invalid.
  pub fn new(store: Arc<S>, config: &ServerConfig) -> sortbin_core::Result<Self> {
    let access = config.access.clone().validated()?;
    let users = UserDirectory::new(Arc::clone(&store), &access.user_collection);
    Ok(Self {
      records: RecordRepository::new(Arc::clone(&store)),
      accounts: Arc::new(Accounts::new(config.accounts.clone())),
      policy: AccessPolicy::new(access),
      users,
      store,
    })
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the API router for `state`.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: DirectoryStore + 'static,
{
  Router::new()
    .route("/session",                 get(auth::session))
    .route("/categories",              get(summary::categories))
    .route("/summary",                 get(summary::summary::<S>))
    .route("/records",                 get(records::list::<S>).post(records::create::<S>))
    .route(
      "/records/{id}",
      get(records::get_one::<S>)
        .patch(records::update::<S>)
        .delete(records::remove::<S>),
    )
    .route("/users",                   get(users::list::<S>))
    .route("/users/{subject_id}",      put(users::upsert::<S>).delete(users::remove::<S>))
    .route("/users/{subject_id}/role", put(users::set_role::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
