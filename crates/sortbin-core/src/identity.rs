//! Identities, roles, and the identity-provider capability.
//!
//! The provider is a third-party federated sign-in service. This crate never
//! talks to it directly; adapters implement [`IdentityProvider`] and the
//! session layer drives it.

use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;

use crate::error::BoxError;

// ─── Identity ────────────────────────────────────────────────────────────────

/// A signed-in account as reported by the identity provider.
///
/// Immutable for the lifetime of a provider session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
  /// Stable identifier; the whitelist is keyed on it.
  pub subject_id:   String,
  pub email:        String,
  pub display_name: Option<String>,
}

// ─── Role ────────────────────────────────────────────────────────────────────

/// Authorisation level attached to a whitelist entry.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
  Admin,
  #[default]
  User,
}

/// An identity that passed the access policy, together with its role.
///
/// The only way to get a role is to get one of these, which keeps "role set
/// iff identity set and allowed" true by construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
  pub identity: Identity,
  pub role:     Role,
}

impl Principal {
  pub fn is_admin(&self) -> bool { self.role == Role::Admin }
}

// ─── Provider capability ─────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ProviderError {
  /// The user aborted the interactive sign-in.
  #[error("sign-in cancelled by the user")]
  Cancelled,

  #[error("identity provider failure: {0}")]
  Failed(#[source] BoxError),
}

/// Federated sign-in service consumed by the session layer.
pub trait IdentityProvider: Send + Sync {
  /// Run the interactive sign-in. `hint` is the preferred account domain;
  /// providers may ignore it, so callers must still check the result.
  fn sign_in<'a>(
    &'a self,
    hint: Option<&'a str>,
  ) -> impl Future<Output = Result<Identity, ProviderError>> + Send + 'a;

  /// Terminate the provider session. Signing out with no active session is
  /// not an error.
  fn sign_out(
    &self,
  ) -> impl Future<Output = Result<(), ProviderError>> + Send + '_;

  /// Subscribe to state-change notifications, delivered in arrival order.
  /// `None` means no identity is signed in. Dropping the receiver
  /// unsubscribes.
  fn subscribe(&self) -> broadcast::Receiver<Option<Identity>>;
}
