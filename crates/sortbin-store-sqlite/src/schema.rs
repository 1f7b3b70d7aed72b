//! SQL schema for the sortbin SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per subject per named collection.
CREATE TABLE IF NOT EXISTS whitelist (
    collection    TEXT NOT NULL,
    subject_id    TEXT NOT NULL,
    role          TEXT NOT NULL CHECK (role IN ('admin', 'user')),
    email         TEXT,
    display_name  TEXT,
    updated_at    TEXT NOT NULL,   -- RFC 3339 UTC, fixed width
    PRIMARY KEY (collection, subject_id)
);

CREATE TABLE IF NOT EXISTS waste_records (
    record_id     TEXT PRIMARY KEY,
    category      TEXT NOT NULL,
    sub_category  TEXT NOT NULL,
    item_type     TEXT NOT NULL,
    weight        REAL NOT NULL CHECK (weight >= 0),
    recorded_by   TEXT NOT NULL,
    date          TEXT NOT NULL,   -- RFC 3339 UTC, fixed width; sorts lexically
    year          INTEGER NOT NULL,
    month         INTEGER NOT NULL,
    updated_at    TEXT
);

CREATE INDEX IF NOT EXISTS waste_records_year_idx ON waste_records(year);
CREATE INDEX IF NOT EXISTS waste_records_date_idx ON waste_records(date);

PRAGMA user_version = 1;
";
