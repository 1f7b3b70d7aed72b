//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 UTC strings with nanosecond precision
//! and a `Z` suffix, so string order equals time order. UUIDs are stored as
//! hyphenated lowercase strings. Roles use their lowercase names.

use chrono::{DateTime, SecondsFormat, Utc};
use sortbin_core::{identity::Role, record::WasteRecord, whitelist::WhitelistEntry};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Nanos, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Role ────────────────────────────────────────────────────────────────────

pub fn encode_role(role: Role) -> &'static str {
  match role {
    Role::Admin => "admin",
    Role::User => "user",
  }
}

pub fn decode_role(s: &str) -> Result<Role> {
  s.parse().map_err(|_| Error::Corrupt { column: "role", value: s.to_owned() })
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `whitelist` row.
pub struct RawEntry {
  pub subject_id:   String,
  pub role:         String,
  pub email:        Option<String>,
  pub display_name: Option<String>,
  pub updated_at:   String,
}

impl RawEntry {
  pub const COLUMNS: &'static str = "subject_id, role, email, display_name, updated_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      subject_id:   row.get(0)?,
      role:         row.get(1)?,
      email:        row.get(2)?,
      display_name: row.get(3)?,
      updated_at:   row.get(4)?,
    })
  }

  pub fn into_entry(self) -> Result<WhitelistEntry> {
    Ok(WhitelistEntry {
      role:         decode_role(&self.role)?,
      updated_at:   decode_dt(&self.updated_at)?,
      subject_id:   self.subject_id,
      email:        self.email,
      display_name: self.display_name,
    })
  }
}

/// Raw values read directly from a `waste_records` row.
pub struct RawRecord {
  pub record_id:    String,
  pub category:     String,
  pub sub_category: String,
  pub item_type:    String,
  pub weight:       f64,
  pub recorded_by:  String,
  pub date:         String,
  pub year:         i32,
  pub month:        u32,
  pub updated_at:   Option<String>,
}

impl RawRecord {
  pub const COLUMNS: &'static str = "record_id, category, sub_category, item_type, weight, \
                                     recorded_by, date, year, month, updated_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      record_id:    row.get(0)?,
      category:     row.get(1)?,
      sub_category: row.get(2)?,
      item_type:    row.get(3)?,
      weight:       row.get(4)?,
      recorded_by:  row.get(5)?,
      date:         row.get(6)?,
      year:         row.get(7)?,
      month:        row.get(8)?,
      updated_at:   row.get(9)?,
    })
  }

  pub fn into_record(self) -> Result<WasteRecord> {
    Ok(WasteRecord {
      id:           decode_uuid(&self.record_id)?,
      date:         decode_dt(&self.date)?,
      updated_at:   self.updated_at.as_deref().map(decode_dt).transpose()?,
      category:     self.category,
      sub_category: self.sub_category,
      item_type:    self.item_type,
      weight:       self.weight,
      recorded_by:  self.recorded_by,
      year:         self.year,
      month:        self.month,
    })
  }
}
