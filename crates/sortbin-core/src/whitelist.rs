//! Whitelist entries: the set of subjects allowed to sign in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::Role;

/// A directory record granting a subject access with a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhitelistEntry {
  /// Identity-provider subject id; stable across sessions.
  pub subject_id:   String,
  pub role:         Role,
  pub email:        Option<String>,
  pub display_name: Option<String>,
  pub updated_at:   DateTime<Utc>,
}

/// Merge-style write for a whitelist entry.
///
/// `role` is always written. `email` and `display_name` only overwrite the
/// stored value when set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntryPatch {
  pub role:         Role,
  #[serde(default)]
  pub email:        Option<String>,
  #[serde(default)]
  pub display_name: Option<String>,
}

impl EntryPatch {
  pub fn role(role: Role) -> Self {
    Self { role, email: None, display_name: None }
  }
}
