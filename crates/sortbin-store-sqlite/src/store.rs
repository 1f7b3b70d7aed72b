//! [`SqliteStore`], the SQLite implementation of [`DirectoryStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use tracing::debug;
use uuid::Uuid;

use sortbin_core::{
  record::{RecordDraft, RecordPatch, WasteRecord},
  store::DirectoryStore,
  whitelist::{EntryPatch, WhitelistEntry},
};

use crate::{
  Result,
  encode::{RawEntry, RawRecord, encode_dt, encode_role, encode_uuid},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A sortbin directory backed by a single SQLite file.
///
/// Clones share one connection.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref().to_owned();
    let conn = tokio_rusqlite::Connection::open(&path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    debug!(path = %path.display(), "sqlite store opened");
    Ok(store)
  }

  /// Open an in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── DirectoryStore impl ─────────────────────────────────────────────────────

impl DirectoryStore for SqliteStore {
  type Error = crate::Error;

  // ── Whitelist ─────────────────────────────────────────────────────────────

  async fn get_entry(&self, collection: &str, subject_id: &str) -> Result<Option<WhitelistEntry>> {
    let collection = collection.to_owned();
    let subject_id = subject_id.to_owned();

    let raw: Option<RawEntry> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {} FROM whitelist WHERE collection = ?1 AND subject_id = ?2",
                RawEntry::COLUMNS
              ),
              rusqlite::params![collection, subject_id],
              RawEntry::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawEntry::into_entry).transpose()
  }

  async fn upsert_entry(
    &self,
    collection: &str,
    subject_id: &str,
    patch: EntryPatch,
    updated_at: DateTime<Utc>,
  ) -> Result<WhitelistEntry> {
    let collection = collection.to_owned();
    let subject_id = subject_id.to_owned();
    let role_str   = encode_role(patch.role);
    let at_str     = encode_dt(updated_at);

    let raw: RawEntry = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO whitelist (collection, subject_id, role, email, display_name, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)
           ON CONFLICT (collection, subject_id) DO UPDATE SET
             role         = excluded.role,
             email        = COALESCE(excluded.email, whitelist.email),
             display_name = COALESCE(excluded.display_name, whitelist.display_name),
             updated_at   = excluded.updated_at",
          rusqlite::params![
            collection,
            subject_id,
            role_str,
            patch.email,
            patch.display_name,
            at_str,
          ],
        )?;
        let raw = tx.query_row(
          &format!(
            "SELECT {} FROM whitelist WHERE collection = ?1 AND subject_id = ?2",
            RawEntry::COLUMNS
          ),
          rusqlite::params![collection, subject_id],
          RawEntry::from_row,
        )?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.into_entry()
  }

  async fn list_entries(&self, collection: &str) -> Result<Vec<WhitelistEntry>> {
    let collection = collection.to_owned();

    let raws: Vec<RawEntry> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM whitelist WHERE collection = ?1 ORDER BY subject_id",
          RawEntry::COLUMNS
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![collection], RawEntry::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEntry::into_entry).collect()
  }

  async fn delete_entry(&self, collection: &str, subject_id: &str) -> Result<bool> {
    let collection = collection.to_owned();
    let subject_id = subject_id.to_owned();

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM whitelist WHERE collection = ?1 AND subject_id = ?2",
          rusqlite::params![collection, subject_id],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }

  // ── Records ───────────────────────────────────────────────────────────────

  async fn insert_record(&self, draft: RecordDraft) -> Result<WasteRecord> {
    let record = draft.into_record(Uuid::new_v4());

    let id_str          = encode_uuid(record.id);
    let date_str        = encode_dt(record.date);
    let category        = record.category.clone();
    let sub_category    = record.sub_category.clone();
    let item_type       = record.item_type.clone();
    let recorded_by     = record.recorded_by.clone();
    let (weight, year, month) = (record.weight, record.year, record.month);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO waste_records (
             record_id, category, sub_category, item_type, weight,
             recorded_by, date, year, month, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, NULL)",
          rusqlite::params![
            id_str,
            category,
            sub_category,
            item_type,
            weight,
            recorded_by,
            date_str,
            year,
            month,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(record)
  }

  async fn get_record(&self, id: Uuid) -> Result<Option<WasteRecord>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawRecord> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {} FROM waste_records WHERE record_id = ?1", RawRecord::COLUMNS),
              rusqlite::params![id_str],
              RawRecord::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawRecord::into_record).transpose()
  }

  async fn update_record(
    &self,
    id: Uuid,
    patch: RecordPatch,
    updated_at: DateTime<Utc>,
  ) -> Result<bool> {
    let id_str = encode_uuid(id);
    let at_str = encode_dt(updated_at);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE waste_records SET
             category     = COALESCE(?2, category),
             sub_category = COALESCE(?3, sub_category),
             item_type    = COALESCE(?4, item_type),
             weight       = COALESCE(?5, weight),
             updated_at   = ?6
           WHERE record_id = ?1",
          rusqlite::params![
            id_str,
            patch.category,
            patch.sub_category,
            patch.item_type,
            patch.weight,
            at_str,
          ],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }

  async fn delete_record(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM waste_records WHERE record_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }

  async fn list_records(&self, year: Option<i32>) -> Result<Vec<WasteRecord>> {
    let raws: Vec<RawRecord> = self
      .conn
      .call(move |conn| {
        let rows = if let Some(y) = year {
          let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM waste_records WHERE year = ?1 ORDER BY date DESC",
            RawRecord::COLUMNS
          ))?;
          stmt
            .query_map(rusqlite::params![y], RawRecord::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        } else {
          let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM waste_records ORDER BY date DESC",
            RawRecord::COLUMNS
          ))?;
          stmt
            .query_map([], RawRecord::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRecord::into_record).collect()
  }
}
