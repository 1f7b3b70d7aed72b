//! Dashboard figures derived from a set of records.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::warn;

use crate::{category::CategoryKind, record::WasteRecord};

/// Short Thai month names, January first.
pub const MONTH_LABELS: [&str; 12] = [
  "ม.ค.", "ก.พ.", "มี.ค.", "เม.ย.", "พ.ค.", "มิ.ย.", "ก.ค.", "ส.ค.", "ก.ย.", "ต.ค.", "พ.ย.", "ธ.ค.",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyBucket {
  /// 1–12.
  pub month:        u32,
  pub label:        &'static str,
  pub total:        f64,
  /// Always holds all three top-level categories.
  pub per_category: BTreeMap<CategoryKind, f64>,
}

impl MonthlyBucket {
  fn empty(month: u32) -> Self {
    Self {
      month,
      label: MONTH_LABELS[(month - 1) as usize],
      total: 0.0,
      per_category: CategoryKind::ALL.iter().map(|k| (*k, 0.0)).collect(),
    }
  }
}

/// A slice of the composition chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slice {
  pub category: String,
  pub weight:   f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
  pub total_weight:      f64,
  /// Keyed by the record's category string, including unknown ones.
  pub total_by_category: BTreeMap<String, f64>,
  /// Exactly twelve buckets, January first.
  pub monthly:           Vec<MonthlyBucket>,
}

impl Summary {
  pub fn recycled_weight(&self) -> f64 {
    self
      .total_by_category
      .get(CategoryKind::Recycle.as_ref())
      .copied()
      .unwrap_or(0.0)
  }

  /// Recycled weight over total weight, or `0` for an empty year.
  pub fn recycle_rate(&self) -> f64 {
    if self.total_weight > 0.0 { self.recycled_weight() / self.total_weight } else { 0.0 }
  }

  /// Categories with a non-zero total.
  pub fn composition(&self) -> Vec<Slice> {
    self
      .total_by_category
      .iter()
      .filter(|(_, w)| **w > 0.0)
      .map(|(category, weight)| Slice { category: category.clone(), weight: *weight })
      .collect()
  }
}

/// Fold `records` into totals and twelve monthly buckets.
///
/// A record whose month is outside 1–12 still counts toward the totals but
/// lands in no bucket.
pub fn aggregate(records: &[WasteRecord]) -> Summary {
  let mut total_weight = 0.0;
  let mut total_by_category = BTreeMap::<String, f64>::new();
  let mut monthly: Vec<_> = (1..=12).map(MonthlyBucket::empty).collect();

  for record in records {
    total_weight += record.weight;
    *total_by_category.entry(record.category.clone()).or_default() += record.weight;

    let Some(bucket) = record
      .month
      .checked_sub(1)
      .and_then(|i| monthly.get_mut(i as usize))
    else {
      warn!(record_id = %record.id, month = record.month, "record month out of range");
      continue;
    };
    bucket.total += record.weight;
    if let Some(kind) = CategoryKind::from_key(&record.category) {
      *bucket.per_category.entry(kind).or_default() += record.weight;
    }
  }

  Summary { total_weight, total_by_category, monthly }
}
