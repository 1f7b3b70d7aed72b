//! Error types for `sortbin-core`.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{identity::ProviderError, policy::Rejection};

/// Boxed error from a collaborator (store backend, identity provider).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Stable, serialisable classification of an [`Error`].
///
/// These names are what the presentation layer sees, so they never change
/// with the message wording.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::AsRefStr,
  strum::IntoStaticStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ErrorKind {
  DomainRejected,
  NotWhitelisted,
  DirectoryUnavailable,
  ValidationError,
  NotFound,
  StoreError,
  AuthCancelled,
  ProviderError,
}

/// A record or selection that does not fit the fixed record shape.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
  #[error("unknown category {0:?}")]
  UnknownCategory(String),

  #[error("unknown sub-category {sub_category:?} in category {category:?}")]
  UnknownSubCategory {
    category:     String,
    sub_category: String,
  },

  #[error("unknown item type {item_type:?} in {category}/{sub_category}")]
  UnknownItemType {
    category:     String,
    sub_category: String,
    item_type:    String,
  },

  #[error("no category selected")]
  MissingCategory,

  #[error("no sub-category selected")]
  MissingSubCategory,

  #[error("no item type selected")]
  MissingItemType,

  #[error("weight must be a finite, non-negative number (got {0})")]
  InvalidWeight(f64),

  #[error("subject id must not be empty")]
  EmptySubjectId,

  #[error("subject id {0:?} has leading or trailing whitespace")]
  PaddedSubjectId(String),
}

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Rejected(#[from] Rejection),

  #[error("validation error: {0}")]
  Validation(#[from] ValidationError),

  #[error("record not found: {0}")]
  RecordNotFound(Uuid),

  #[error("store error: {0}")]
  Store(#[source] BoxError),

  #[error("sign-in cancelled")]
  AuthCancelled,

  #[error("identity provider error: {0}")]
  Provider(#[source] BoxError),

  #[error("invalid configuration: {0}")]
  InvalidConfig(String),
}

impl Error {
  /// Wrap a store backend error.
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }

  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::Rejected(r) => r.kind(),
      Self::Validation(_) | Self::InvalidConfig(_) => ErrorKind::ValidationError,
      Self::RecordNotFound(_) => ErrorKind::NotFound,
      Self::Store(_) => ErrorKind::StoreError,
      Self::AuthCancelled => ErrorKind::AuthCancelled,
      Self::Provider(_) => ErrorKind::ProviderError,
    }
  }
}

impl From<ProviderError> for Error {
  fn from(e: ProviderError) -> Self {
    match e {
      ProviderError::Cancelled => Self::AuthCancelled,
      ProviderError::Failed(inner) => Self::Provider(inner),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn kinds_serialise_kebab_case() {
    let json = serde_json::to_value(ErrorKind::DirectoryUnavailable).unwrap();
    assert_eq!(json, "directory-unavailable");
    assert_eq!(ErrorKind::NotWhitelisted.to_string(), "not-whitelisted");
  }

  #[test]
  fn cancelled_sign_in_is_not_a_rejection() {
    let err = Error::from(ProviderError::Cancelled);
    assert_eq!(err.kind(), ErrorKind::AuthCancelled);
  }

  #[test]
  fn negative_weight_is_a_validation_error() {
    let err = Error::from(ValidationError::InvalidWeight(-1.0));
    assert_eq!(err.kind(), ErrorKind::ValidationError);
  }
}
