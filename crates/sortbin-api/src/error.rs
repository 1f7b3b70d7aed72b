//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::JsonRejection,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use sortbin_core::{ErrorKind, policy::Rejection};
use thiserror::Error;
use tracing::error;

/// An error returned by an API handler or extractor.
#[derive(Debug, Error)]
pub enum ApiError {
  /// Missing or wrong credentials.
  #[error("authentication required")]
  Unauthorized,

  /// Authenticated, but not an administrator.
  #[error("administrator role required")]
  Forbidden,

  #[error(transparent)]
  Rejected(#[from] Rejection),

  #[error(transparent)]
  Core(#[from] sortbin_core::Error),

  #[error(transparent)]
  Body(#[from] JsonRejection),
}

impl ApiError {
  fn status_and_kind(&self) -> (StatusCode, &'static str) {
    match self {
      Self::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthenticated"),
      Self::Forbidden => (StatusCode::FORBIDDEN, "forbidden"),
      Self::Rejected(r) => kind_status(r.kind()),
      Self::Core(e) => kind_status(e.kind()),
      Self::Body(r) => (r.status(), "validation-error"),
    }
  }
}

fn kind_status(kind: ErrorKind) -> (StatusCode, &'static str) {
  let status = match kind {
    ErrorKind::DomainRejected | ErrorKind::NotWhitelisted => StatusCode::FORBIDDEN,
    ErrorKind::DirectoryUnavailable => StatusCode::SERVICE_UNAVAILABLE,
    ErrorKind::ValidationError => StatusCode::UNPROCESSABLE_ENTITY,
    ErrorKind::NotFound => StatusCode::NOT_FOUND,
    ErrorKind::AuthCancelled => StatusCode::UNAUTHORIZED,
    ErrorKind::ProviderError => StatusCode::BAD_GATEWAY,
    ErrorKind::StoreError => StatusCode::INTERNAL_SERVER_ERROR,
  };
  (status, kind.into())
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, kind) = self.status_and_kind();
    let message = match &self {
      Self::Body(r) => r.body_text(),
      other => other.to_string(),
    };
    if status.is_server_error() {
      error!(kind, error = %message, "request failed");
    }

    let mut res = (status, Json(json!({ "error": message, "kind": kind }))).into_response();
    if status == StatusCode::UNAUTHORIZED {
      res
        .headers_mut()
        .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Basic realm=\"sortbin\""));
    }
    res
  }
}
