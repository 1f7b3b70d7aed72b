//! The `DirectoryStore` trait.
//!
//! Implemented by storage backends (e.g. `sortbin-store-sqlite`). The
//! services in this crate depend on this abstraction, not on any concrete
//! backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  record::{RecordDraft, RecordPatch, WasteRecord},
  whitelist::{EntryPatch, WhitelistEntry},
};

/// Persistent home of whitelist entries and waste records.
///
/// Whitelist entries live in named collections so the access policy can be
/// pointed at a configurable one. Single-document operations are expected to
/// be read-after-write consistent; nothing here needs cross-document
/// transactions.
///
/// All methods return `Send` futures so the trait can be used from
/// multi-threaded runtimes (e.g. tokio with `axum`).
pub trait DirectoryStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// The store's notion of "now", used to stamp creation and update times.
  fn now(&self) -> DateTime<Utc> { Utc::now() }

  // ── Whitelist ─────────────────────────────────────────────────────────

  /// Look up a whitelist entry. Returns `None` if absent.
  fn get_entry<'a>(
    &'a self,
    collection: &'a str,
    subject_id: &'a str,
  ) -> impl Future<Output = Result<Option<WhitelistEntry>, Self::Error>> + Send + 'a;

  /// Create or merge-update an entry and return the stored result.
  fn upsert_entry<'a>(
    &'a self,
    collection: &'a str,
    subject_id: &'a str,
    patch: EntryPatch,
    updated_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<WhitelistEntry, Self::Error>> + Send + 'a;

  /// All entries in `collection`, ordered by subject id.
  fn list_entries<'a>(
    &'a self,
    collection: &'a str,
  ) -> impl Future<Output = Result<Vec<WhitelistEntry>, Self::Error>> + Send + 'a;

  /// Delete an entry. Returns `false` if it did not exist.
  fn delete_entry<'a>(
    &'a self,
    collection: &'a str,
    subject_id: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  // ── Records ───────────────────────────────────────────────────────────

  /// Persist a draft, assigning it an id.
  fn insert_record(
    &self,
    draft: RecordDraft,
  ) -> impl Future<Output = Result<WasteRecord, Self::Error>> + Send + '_;

  fn get_record(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<WasteRecord>, Self::Error>> + Send + '_;

  /// Merge `patch` into the record and set `updated_at`. Returns `false` if
  /// the record does not exist.
  fn update_record(
    &self,
    id: Uuid,
    patch: RecordPatch,
    updated_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Delete a record. Returns `false` if it did not exist.
  fn delete_record(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Records ordered by `date` descending, optionally restricted to one
  /// `year`.
  fn list_records(
    &self,
    year: Option<i32>,
  ) -> impl Future<Output = Result<Vec<WasteRecord>, Self::Error>> + Send + '_;
}
