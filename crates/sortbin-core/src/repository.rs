//! [`RecordRepository`], the only writer of waste records.

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::{
  Error, Result,
  aggregate::{Summary, aggregate},
  category,
  record::{NewRecord, RecordDraft, RecordPatch, WasteRecord, validate_weight},
  store::DirectoryStore,
};

/// CRUD and queries over waste records.
pub struct RecordRepository<S> {
  store: Arc<S>,
}

impl<S> Clone for RecordRepository<S> {
  fn clone(&self) -> Self { Self { store: Arc::clone(&self.store) } }
}

impl<S: DirectoryStore> RecordRepository<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  /// Validate and persist a new record on behalf of `actor` (a subject id).
  ///
  /// `date` comes from the store clock; `year` and `month` are derived from
  /// it.
  pub async fn add(&self, record: NewRecord, actor: &str) -> Result<Uuid> {
    record.validate()?;

    let draft = RecordDraft::stamp(record, actor, self.store.now());
    let stored = self.store.insert_record(draft).await.map_err(Error::store)?;

    info!(
      record_id = %stored.id,
      recorded_by = %stored.recorded_by,
      category = %stored.category,
      weight = stored.weight,
      "waste record added"
    );
    Ok(stored.id)
  }

  /// Merge `patch` into record `id` and stamp `updated_at`.
  ///
  /// A supplied weight must be valid. If any path field is supplied, the
  /// path the record would end up with must exist in the category tree.
  pub async fn update(&self, id: Uuid, patch: RecordPatch) -> Result<()> {
    if let Some(weight) = patch.weight {
      validate_weight(weight)?;
    }

    if patch.touches_path() {
      let current = self.get(id).await?;
      let (category, sub_category, item_type) = patch.merged_path(&current);
      category::resolve(category, sub_category, item_type)?;
    }

    let updated = self
      .store
      .update_record(id, patch, self.store.now())
      .await
      .map_err(Error::store)?;
    if !updated {
      return Err(Error::RecordNotFound(id));
    }

    debug!(record_id = %id, "waste record updated");
    Ok(())
  }

  /// Delete record `id`. Deleting a missing record is an error.
  pub async fn delete(&self, id: Uuid) -> Result<()> {
    let deleted = self.store.delete_record(id).await.map_err(Error::store)?;
    if !deleted {
      return Err(Error::RecordNotFound(id));
    }
    info!(record_id = %id, "waste record deleted");
    Ok(())
  }

  pub async fn get(&self, id: Uuid) -> Result<WasteRecord> {
    self
      .store
      .get_record(id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::RecordNotFound(id))
  }

  /// Every record, newest first.
  pub async fn list(&self) -> Result<Vec<WasteRecord>> {
    self.store.list_records(None).await.map_err(Error::store)
  }

  /// Records of one calendar year, newest first.
  pub async fn list_by_year(&self, year: i32) -> Result<Vec<WasteRecord>> {
    self.store.list_records(Some(year)).await.map_err(Error::store)
  }

  /// Records whose category, sub-category or item type contains `term`,
  /// ignoring case, newest first. `year` narrows the search when given.
  pub async fn search(&self, year: Option<i32>, term: &str) -> Result<Vec<WasteRecord>> {
    let mut records = self.store.list_records(year).await.map_err(Error::store)?;
    records.retain(|r| r.matches(term));
    debug!(term, matched = records.len(), "record search");
    Ok(records)
  }

  /// Dashboard figures for `year`.
  pub async fn summary_for_year(&self, year: i32) -> Result<Summary> {
    let records = self.list_by_year(year).await?;
    Ok(aggregate(&records))
  }
}
