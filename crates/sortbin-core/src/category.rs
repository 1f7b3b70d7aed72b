//! The static waste taxonomy: category → sub-category → item type.
//!
//! The tree is compiled in and shared read-only. Every record's
//! `(category, sub_category, item_type)` triple must resolve to a path in it
//! at write time.

use serde::{Deserialize, Serialize};

use crate::{
  ValidationError,
  record::{NewRecord, WasteRecord},
};

// ─── Tree ────────────────────────────────────────────────────────────────────

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct Category {
  pub key:            &'static str,
  pub label:          &'static str,
  pub sub_categories: &'static [SubCategory],
}

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct SubCategory {
  pub key:   &'static str,
  pub label: &'static str,
  pub items: &'static [&'static str],
}

static CATEGORIES: &[Category] = &[
  Category {
    key:            "Organic",
    label:          "ขยะอินทรีย์",
    sub_categories: &[SubCategory {
      key:   "Food Waste",
      label: "เศษอาหาร",
      items: &["ชั่งน้ำหนัก", "ขายเป็นอาหารสัตว์"],
    }],
  },
  Category {
    key:            "Recycle",
    label:          "ขยะรีไซเคิล",
    sub_categories: &[
      SubCategory {
        key:   "Plastic",
        label: "พลาสติก",
        items: &["ขวดรวมฝา", "ขวดแยกฝา", "ฝาขวด"],
      },
      SubCategory {
        key:   "Metal",
        label: "โลหะ",
        items: &["อลูมิเนียม (กระป๋อง/ฝา)", "อื่นๆ"],
      },
      SubCategory {
        key:   "Other",
        label: "อื่นๆ",
        items: &["ชั่งน้ำหนัก", "ขาย"],
      },
      SubCategory {
        key:   "Glass",
        label: "แก้ว/กระดาษ",
        items: &["ชั่งน้ำหนัก"],
      },
    ],
  },
  Category {
    key:            "General",
    label:          "ขยะทั่วไป",
    sub_categories: &[
      SubCategory {
        key:   "Combustible",
        label: "เผาได้",
        items: &["ชั่งน้ำหนัก", "ขายเป็น RDF"],
      },
      SubCategory {
        key:   "NonCombustible",
        label: "เผาไม่ได้",
        items: &["ชั่งน้ำหนัก", "ส่งต่อ กทม."],
      },
    ],
  },
];

/// The top-level categories, in display order.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::AsRefStr,
)]
pub enum CategoryKind {
  Organic,
  Recycle,
  General,
}

impl CategoryKind {
  pub const ALL: [CategoryKind; 3] =
    [CategoryKind::Organic, CategoryKind::Recycle, CategoryKind::General];

  pub fn from_key(key: &str) -> Option<Self> { key.parse().ok() }
}

// ─── Lookups ─────────────────────────────────────────────────────────────────

pub fn categories() -> &'static [Category] { CATEGORIES }

pub fn category(key: &str) -> Option<&'static Category> {
  CATEGORIES.iter().find(|c| c.key == key)
}

/// Sub-categories of `category`, or an empty slice for unknown keys.
pub fn sub_categories_of(category_key: &str) -> &'static [SubCategory] {
  category(category_key).map(|c| c.sub_categories).unwrap_or(&[])
}

/// Item types of `category/sub_category`, or an empty slice for unknown keys.
pub fn items_of(category_key: &str, sub_category_key: &str) -> &'static [&'static str] {
  sub_categories_of(category_key)
    .iter()
    .find(|s| s.key == sub_category_key)
    .map(|s| s.items)
    .unwrap_or(&[])
}

/// Resolve a path, reporting the first segment that does not exist.
pub fn resolve(
  category_key: &str,
  sub_category_key: &str,
  item_type: &str,
) -> Result<(&'static Category, &'static SubCategory, &'static str), ValidationError> {
  let cat = category(category_key)
    .ok_or_else(|| ValidationError::UnknownCategory(category_key.to_string()))?;

  let sub = cat
    .sub_categories
    .iter()
    .find(|s| s.key == sub_category_key)
    .ok_or_else(|| ValidationError::UnknownSubCategory {
      category:     category_key.to_string(),
      sub_category: sub_category_key.to_string(),
    })?;

  let item = sub
    .items
    .iter()
    .copied()
    .find(|i| *i == item_type)
    .ok_or_else(|| ValidationError::UnknownItemType {
      category:     category_key.to_string(),
      sub_category: sub_category_key.to_string(),
      item_type:    item_type.to_string(),
    })?;

  Ok((cat, sub, item))
}

pub fn validate_path(category_key: &str, sub_category_key: &str, item_type: &str) -> bool {
  resolve(category_key, sub_category_key, item_type).is_ok()
}

// ─── Cascading selection ─────────────────────────────────────────────────────

/// A partially filled category path, as driven by a data-entry form.
///
/// Choosing a category clears the sub-category and item; choosing a
/// sub-category clears the item. Choices outside the tree are rejected and
/// leave the selection unchanged, so a `Selection` only ever holds a prefix of
/// a valid path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
  category:     Option<&'static Category>,
  sub_category: Option<&'static SubCategory>,
  item_type:    Option<&'static str>,
}

impl Selection {
  pub fn new() -> Self { Self::default() }

  /// Pre-fill from an existing record, e.g. when opening it for editing.
  pub fn from_record(record: &WasteRecord) -> Result<Self, ValidationError> {
    let (category, sub_category, item_type) =
      resolve(&record.category, &record.sub_category, &record.item_type)?;
    Ok(Self {
      category:     Some(category),
      sub_category: Some(sub_category),
      item_type:    Some(item_type),
    })
  }

  pub fn select_category(&mut self, key: &str) -> Result<(), ValidationError> {
    let found =
      category(key).ok_or_else(|| ValidationError::UnknownCategory(key.to_string()))?;
    *self = Self { category: Some(found), ..Self::default() };
    Ok(())
  }

  pub fn select_sub_category(&mut self, key: &str) -> Result<(), ValidationError> {
    let cat = self.category.ok_or(ValidationError::MissingCategory)?;
    let found = cat
      .sub_categories
      .iter()
      .find(|s| s.key == key)
      .ok_or_else(|| ValidationError::UnknownSubCategory {
        category:     cat.key.to_string(),
        sub_category: key.to_string(),
      })?;
    self.sub_category = Some(found);
    self.item_type = None;
    Ok(())
  }

  pub fn select_item(&mut self, item_type: &str) -> Result<(), ValidationError> {
    let cat = self.category.ok_or(ValidationError::MissingCategory)?;
    let sub = self.sub_category.ok_or(ValidationError::MissingSubCategory)?;
    let found = sub
      .items
      .iter()
      .copied()
      .find(|i| *i == item_type)
      .ok_or_else(|| ValidationError::UnknownItemType {
        category:     cat.key.to_string(),
        sub_category: sub.key.to_string(),
        item_type:    item_type.to_string(),
      })?;
    self.item_type = Some(found);
    Ok(())
  }

  pub fn category(&self) -> Option<&'static Category> { self.category }

  pub fn sub_category(&self) -> Option<&'static SubCategory> { self.sub_category }

  pub fn item_type(&self) -> Option<&'static str> { self.item_type }

  /// Sub-categories offered for the current category.
  pub fn sub_category_options(&self) -> &'static [SubCategory] {
    self.category.map(|c| c.sub_categories).unwrap_or(&[])
  }

  /// Item types offered for the current sub-category.
  pub fn item_options(&self) -> &'static [&'static str] {
    self.sub_category.map(|s| s.items).unwrap_or(&[])
  }

  pub fn is_complete(&self) -> bool { self.item_type.is_some() }

  /// Turn a complete selection into a record ready for
  /// [`RecordRepository::add`](crate::repository::RecordRepository::add).
  pub fn into_record(self, weight: f64) -> Result<NewRecord, ValidationError> {
    let category = self.category.ok_or(ValidationError::MissingCategory)?;
    let sub_category = self.sub_category.ok_or(ValidationError::MissingSubCategory)?;
    let item_type = self.item_type.ok_or(ValidationError::MissingItemType)?;
    let record = NewRecord {
      category: category.key.to_string(),
      sub_category: sub_category.key.to_string(),
      item_type: item_type.to_string(),
      weight,
    };
    record.validate()?;
    Ok(record)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn known_path_is_valid() {
    assert!(validate_path("Recycle", "Plastic", "ขวดรวมฝา"));
  }

  #[test]
  fn unknown_item_is_invalid() {
    assert!(!validate_path("Recycle", "Plastic", "NotAnItem"));
    assert_eq!(
      resolve("Recycle", "Plastic", "NotAnItem").unwrap_err(),
      ValidationError::UnknownItemType {
        category:     "Recycle".into(),
        sub_category: "Plastic".into(),
        item_type:    "NotAnItem".into(),
      }
    );
  }

  #[test]
  fn sub_category_must_belong_to_category() {
    // "Plastic" exists, but not under "Organic".
    assert!(!validate_path("Organic", "Plastic", "ขวดรวมฝา"));
    assert!(matches!(
      resolve("Organic", "Plastic", "ขวดรวมฝา"),
      Err(ValidationError::UnknownSubCategory { .. })
    ));
  }

  #[test]
  fn lookups_preserve_order() {
    let keys: Vec<_> = categories().iter().map(|c| c.key).collect();
    assert_eq!(keys, ["Organic", "Recycle", "General"]);

    let subs: Vec<_> = sub_categories_of("Recycle").iter().map(|s| s.key).collect();
    assert_eq!(subs, ["Plastic", "Metal", "Other", "Glass"]);

    assert_eq!(items_of("General", "NonCombustible"), ["ชั่งน้ำหนัก", "ส่งต่อ กทม."]);
    assert!(items_of("General", "Plastic").is_empty());
    assert!(sub_categories_of("Hazardous").is_empty());
  }

  #[test]
  fn top_level_keys_match_category_kinds() {
    for (cat, kind) in categories().iter().zip(CategoryKind::ALL) {
      assert_eq!(CategoryKind::from_key(cat.key), Some(kind));
    }
    assert_eq!(CategoryKind::from_key("Hazardous"), None);
  }

  #[test]
  fn changing_category_clears_dependent_fields() {
    let mut sel = Selection::new();
    sel.select_category("Recycle").unwrap();
    sel.select_sub_category("Plastic").unwrap();
    sel.select_item("ฝาขวด").unwrap();
    assert!(sel.is_complete());

    sel.select_category("General").unwrap();
    assert_eq!(sel.category().map(|c| c.key), Some("General"));
    assert!(sel.sub_category().is_none());
    assert!(sel.item_type().is_none());
  }

  #[test]
  fn changing_sub_category_clears_item() {
    let mut sel = Selection::new();
    sel.select_category("Recycle").unwrap();
    sel.select_sub_category("Plastic").unwrap();
    sel.select_item("ฝาขวด").unwrap();

    sel.select_sub_category("Metal").unwrap();
    assert!(sel.item_type().is_none());
    assert_eq!(sel.item_options(), ["อลูมิเนียม (กระป๋อง/ฝา)", "อื่นๆ"]);
  }

  #[test]
  fn rejected_choice_leaves_selection_untouched() {
    let mut sel = Selection::new();
    sel.select_category("Organic").unwrap();
    sel.select_sub_category("Food Waste").unwrap();
    let before = sel;

    assert!(sel.select_category("Hazardous").is_err());
    assert!(sel.select_sub_category("Plastic").is_err());
    assert_eq!(sel, before);
  }

  #[test]
  fn out_of_order_choices_are_rejected() {
    let mut sel = Selection::new();
    assert_eq!(
      sel.select_sub_category("Plastic"),
      Err(ValidationError::MissingCategory)
    );
    sel.select_category("Recycle").unwrap();
    assert_eq!(sel.select_item("ขวดรวมฝา"), Err(ValidationError::MissingSubCategory));
    assert!(sel.sub_category_options().len() == 4);
  }

  #[test]
  fn complete_selection_becomes_a_record() {
    let mut sel = Selection::new();
    sel.select_category("Organic").unwrap();
    sel.select_sub_category("Food Waste").unwrap();
    assert_eq!(sel.into_record(1.0), Err(ValidationError::MissingItemType));

    sel.select_item("ขายเป็นอาหารสัตว์").unwrap();
    let record = sel.into_record(12.5).unwrap();
    assert_eq!(record.category, "Organic");
    assert_eq!(record.sub_category, "Food Waste");
    assert_eq!(record.weight, 12.5);

    assert_eq!(sel.into_record(-2.0), Err(ValidationError::InvalidWeight(-2.0)));
  }
}
