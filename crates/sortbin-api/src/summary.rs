//! Public, read-only endpoints backing the dashboard and the entry form.

use axum::{
  Json,
  extract::{Query, State},
};
use chrono::{Datelike as _, Utc};
use serde::{Deserialize, Serialize};
use sortbin_core::{
  aggregate::{Slice, Summary},
  category::{self, Category},
  store::DirectoryStore,
};

use crate::{AppState, error::ApiError};

/// `GET /categories`: the fixed category tree.
pub async fn categories() -> Json<&'static [Category]> { Json(category::categories()) }

#[derive(Debug, Deserialize)]
pub struct SummaryParams {
  /// Defaults to the current UTC year.
  pub year: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
  pub year:            i32,
  pub recycled_weight: f64,
  pub recycle_rate:    f64,
  pub composition:     Vec<Slice>,
  #[serde(flatten)]
  pub summary:         Summary,
}

/// `GET /summary[?year=<year>]`
pub async fn summary<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<SummaryParams>,
) -> Result<Json<SummaryResponse>, ApiError>
where
  S: DirectoryStore + 'static,
{
  let year = params.year.unwrap_or_else(|| Utc::now().year());
  let summary = state.records.summary_for_year(year).await?;
  Ok(Json(SummaryResponse {
    year,
    recycled_weight: summary.recycled_weight(),
    recycle_rate: summary.recycle_rate(),
    composition: summary.composition(),
    summary,
  }))
}
