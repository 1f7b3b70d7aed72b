//! Waste records and the fixed shapes callers may write.
//!
//! Callers never hand a free-form document to the store. New records arrive
//! as [`NewRecord`], edits as [`RecordPatch`]; everything else on a
//! [`WasteRecord`] is assigned by the repository or the store.

use chrono::{DateTime, Datelike as _, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ValidationError, category};

// ─── Stored record ───────────────────────────────────────────────────────────

/// A persisted weight observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WasteRecord {
  /// Assigned by the store.
  pub id:           Uuid,
  pub category:     String,
  pub sub_category: String,
  pub item_type:    String,
  /// Kilograms; never negative.
  pub weight:       f64,
  /// Subject id of the account that created the record.
  pub recorded_by:  String,
  /// Server-assigned creation time; never taken from the client.
  pub date:         DateTime<Utc>,
  /// Calendar year of `date` (UTC).
  pub year:         i32,
  /// Calendar month of `date` (UTC), 1–12.
  pub month:        u32,
  pub updated_at:   Option<DateTime<Utc>>,
}

impl WasteRecord {
  /// Case-insensitive substring match on the category path. A blank term
  /// matches everything.
  pub fn matches(&self, term: &str) -> bool {
    let term = term.trim().to_lowercase();
    [&self.category, &self.sub_category, &self.item_type]
      .into_iter()
      .any(|field| field.to_lowercase().contains(&term))
  }
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Input to [`RecordRepository::add`](crate::repository::RecordRepository::add).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewRecord {
  pub category:     String,
  pub sub_category: String,
  pub item_type:    String,
  pub weight:       f64,
}

impl NewRecord {
  pub fn validate(&self) -> Result<(), ValidationError> {
    category::resolve(&self.category, &self.sub_category, &self.item_type)?;
    validate_weight(self.weight)
  }
}

/// Merge-style edit: `None` fields are left as stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecordPatch {
  pub category:     Option<String>,
  pub sub_category: Option<String>,
  pub item_type:    Option<String>,
  pub weight:       Option<f64>,
}

impl RecordPatch {
  pub fn weight(weight: f64) -> Self {
    Self { weight: Some(weight), ..Self::default() }
  }

  /// Replace the whole category path.
  pub fn path(
    category: impl Into<String>,
    sub_category: impl Into<String>,
    item_type: impl Into<String>,
  ) -> Self {
    Self {
      category: Some(category.into()),
      sub_category: Some(sub_category.into()),
      item_type: Some(item_type.into()),
      weight: None,
    }
  }

  /// Whether any of the three path fields is set.
  pub fn touches_path(&self) -> bool {
    self.category.is_some() || self.sub_category.is_some() || self.item_type.is_some()
  }

  /// The category path `record` would have after applying this patch.
  pub fn merged_path<'a>(&'a self, record: &'a WasteRecord) -> (&'a str, &'a str, &'a str) {
    (
      self.category.as_deref().unwrap_or(&record.category),
      self.sub_category.as_deref().unwrap_or(&record.sub_category),
      self.item_type.as_deref().unwrap_or(&record.item_type),
    )
  }
}

/// A validated record with its server-assigned fields, ready to insert.
/// The store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDraft {
  pub category:     String,
  pub sub_category: String,
  pub item_type:    String,
  pub weight:       f64,
  pub recorded_by:  String,
  pub date:         DateTime<Utc>,
  pub year:         i32,
  pub month:        u32,
}

impl RecordDraft {
  /// Stamp `record` with its author and creation time, deriving the year and
  /// month buckets from `date`.
  pub fn stamp(record: NewRecord, recorded_by: impl Into<String>, date: DateTime<Utc>) -> Self {
    Self {
      category: record.category,
      sub_category: record.sub_category,
      item_type: record.item_type,
      weight: record.weight,
      recorded_by: recorded_by.into(),
      date,
      year: date.year(),
      month: date.month(),
    }
  }

  pub fn into_record(self, id: Uuid) -> WasteRecord {
    WasteRecord {
      id,
      category: self.category,
      sub_category: self.sub_category,
      item_type: self.item_type,
      weight: self.weight,
      recorded_by: self.recorded_by,
      date: self.date,
      year: self.year,
      month: self.month,
      updated_at: None,
    }
  }
}

pub fn validate_weight(weight: f64) -> Result<(), ValidationError> {
  if weight.is_finite() && weight >= 0.0 {
    Ok(())
  } else {
    Err(ValidationError::InvalidWeight(weight))
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone as _;

  use super::*;

  fn plastic(weight: f64) -> NewRecord {
    NewRecord {
      category: "Recycle".into(),
      sub_category: "Plastic".into(),
      item_type: "ขวดรวมฝา".into(),
      weight,
    }
  }

  #[test]
  fn weight_bounds() {
    assert!(plastic(0.0).validate().is_ok());
    assert!(plastic(3.25).validate().is_ok());
    assert_eq!(plastic(-0.5).validate(), Err(ValidationError::InvalidWeight(-0.5)));
    assert!(plastic(f64::NAN).validate().is_err());
    assert!(plastic(f64::INFINITY).validate().is_err());
  }

  #[test]
  fn stamp_derives_year_and_month() {
    let at = Utc.with_ymd_and_hms(2025, 3, 14, 8, 30, 0).unwrap();
    let draft = RecordDraft::stamp(plastic(4.0), "uid-1", at);
    assert_eq!((draft.year, draft.month), (2025, 3));
    assert_eq!(draft.recorded_by, "uid-1");

    let record = draft.into_record(Uuid::nil());
    assert_eq!(record.date, at);
    assert!(record.updated_at.is_none());
  }

  #[test]
  fn unknown_fields_are_refused() {
    let body = r#"{"category":"Recycle","sub_category":"Plastic","item_type":"ฝาขวด","weight":1,"recorded_by":"someone-else"}"#;
    assert!(serde_json::from_str::<NewRecord>(body).is_err());

    let patch = r#"{"weight":2,"year":1999}"#;
    assert!(serde_json::from_str::<RecordPatch>(patch).is_err());
  }

  #[test]
  fn merged_path_prefers_patch_fields() {
    let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    let record = RecordDraft::stamp(plastic(1.0), "uid", at).into_record(Uuid::nil());

    let patch = RecordPatch { item_type: Some("ฝาขวด".into()), ..RecordPatch::default() };
    assert!(patch.touches_path());
    assert_eq!(patch.merged_path(&record), ("Recycle", "Plastic", "ฝาขวด"));

    assert!(!RecordPatch::weight(2.0).touches_path());
  }

  #[test]
  fn matches_any_path_field_ignoring_case() {
    let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    let record = RecordDraft::stamp(plastic(1.0), "uid", at).into_record(Uuid::nil());

    assert!(record.matches("recycle"));
    assert!(record.matches("PLAST"));
    assert!(record.matches("ขวด"));
    assert!(record.matches(""));
    assert!(!record.matches("glass"));
    assert!(!record.matches("uid"));
  }
}
