//! The access policy: domain check, whitelist lookup, role derivation.
//!
//! Interactive login, provider notifications and per-request HTTP auth all
//! admit identities through [`AccessPolicy::evaluate`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
  ErrorKind,
  config::AccessConfig,
  identity::{Identity, Principal, Role},
  store::DirectoryStore,
};

/// Why an identity was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "kebab-case")]
pub enum Rejection {
  #[error("access is restricted to @{domain} accounts")]
  DomainRejected { domain: String },

  #[error("{subject_id} is not authorised to use this system; contact an administrator")]
  NotWhitelisted { subject_id: String },

  #[error("user directory unavailable: {message}")]
  DirectoryUnavailable { message: String },
}

impl Rejection {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::DomainRejected { .. } => ErrorKind::DomainRejected,
      Self::NotWhitelisted { .. } => ErrorKind::NotWhitelisted,
      Self::DirectoryUnavailable { .. } => ErrorKind::DirectoryUnavailable,
    }
  }
}

/// Outcome of [`AccessPolicy::evaluate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
  Allow(Role),
  Reject(Rejection),
}

impl Decision {
  pub fn is_allowed(&self) -> bool { matches!(self, Self::Allow(_)) }

  pub fn role(&self) -> Option<Role> {
    match self {
      Self::Allow(role) => Some(*role),
      Self::Reject(_) => None,
    }
  }

  /// Pair an allowed decision with the identity it was made for.
  pub fn into_principal(self, identity: Identity) -> Result<Principal, Rejection> {
    match self {
      Self::Allow(role) => Ok(Principal { identity, role }),
      Self::Reject(rejection) => Err(rejection),
    }
  }
}

/// Evaluates identities against an [`AccessConfig`].
///
/// Clones share one configuration.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
  config: Arc<AccessConfig>,
}

impl AccessPolicy {
  pub fn new(config: AccessConfig) -> Self { Self { config: Arc::new(config) } }

  pub fn config(&self) -> &AccessConfig { &self.config }

  /// Decide whether `identity` may use the system and with which role.
  ///
  /// Checks run in order and short-circuit:
  /// 1. the email must end with `@{domain}` (exact, case-sensitive);
  /// 2. with the whitelist enforced, an entry must exist and supplies the
  ///    role;
  /// 3. otherwise an existing entry supplies the role, and a missing one
  ///    means [`Role::User`]. Nothing is written in that case.
  ///
  /// A failed directory lookup rejects (fail closed). Callers holding a
  /// provider session must sign it out on any rejection.
  pub async fn evaluate<S>(&self, identity: &Identity, store: &S) -> Decision
  where
    S: DirectoryStore,
  {
    if !identity.email.ends_with(&self.config.email_suffix()) {
      warn!(
        subject_id = %identity.subject_id,
        email = %identity.email,
        "rejected identity outside the allowed domain"
      );
      return Decision::Reject(Rejection::DomainRejected {
        domain: self.config.domain.clone(),
      });
    }

    let entry = match store
      .get_entry(&self.config.user_collection, &identity.subject_id)
      .await
    {
      Ok(entry) => entry,
      Err(e) => {
        warn!(
          subject_id = %identity.subject_id,
          error = %e,
          "whitelist lookup failed; denying access"
        );
        return Decision::Reject(Rejection::DirectoryUnavailable {
          message: e.to_string(),
        });
      }
    };

    match entry {
      Some(entry) => {
        debug!(subject_id = %identity.subject_id, role = %entry.role, "access granted");
        Decision::Allow(entry.role)
      }
      None if self.config.require_whitelist => {
        warn!(subject_id = %identity.subject_id, "rejected identity missing from whitelist");
        Decision::Reject(Rejection::NotWhitelisted {
          subject_id: identity.subject_id.clone(),
        })
      }
      None => {
        debug!(subject_id = %identity.subject_id, "no whitelist entry; defaulting to user");
        Decision::Allow(Role::User)
      }
    }
  }
}
