//! [`UserDirectory`]: administration of whitelist entries.
//!
//! The service does not check the caller's role. It must only be reachable
//! from behind a boundary that already requires `admin` (the HTTP layer's
//! `Admin` extractor).

use std::sync::Arc;

use tracing::{debug, info};

use crate::{
  Error, Result, ValidationError,
  identity::Role,
  store::DirectoryStore,
  whitelist::{EntryPatch, WhitelistEntry},
};

/// Subject ids are matched exactly, so blank or padded ones are refused
/// rather than normalised.
fn check_subject_id(subject_id: &str) -> Result<&str, ValidationError> {
  if subject_id.trim().is_empty() {
    Err(ValidationError::EmptySubjectId)
  } else if subject_id.trim() != subject_id {
    Err(ValidationError::PaddedSubjectId(subject_id.to_string()))
  } else {
    Ok(subject_id)
  }
}

pub struct UserDirectory<S> {
  store:      Arc<S>,
  collection: Arc<str>,
}

impl<S> Clone for UserDirectory<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), collection: Arc::clone(&self.collection) }
  }
}

impl<S: DirectoryStore> UserDirectory<S> {
  /// A directory over the whitelist collection named `collection`.
  pub fn new(store: Arc<S>, collection: &str) -> Self {
    Self { store, collection: Arc::from(collection) }
  }

  pub fn collection(&self) -> &str { &self.collection }

  /// Create or merge-update an entry. Repeating the same call leaves the
  /// same single entry behind.
  pub async fn upsert(&self, subject_id: &str, patch: EntryPatch) -> Result<WhitelistEntry> {
    let subject_id = check_subject_id(subject_id)?;
    let entry = self
      .store
      .upsert_entry(&self.collection, subject_id, patch, self.store.now())
      .await
      .map_err(Error::store)?;

    info!(subject_id = %entry.subject_id, role = %entry.role, "whitelist entry saved");
    Ok(entry)
  }

  pub async fn set_role(&self, subject_id: &str, role: Role) -> Result<WhitelistEntry> {
    self.upsert(subject_id, EntryPatch::role(role)).await
  }

  pub async fn get(&self, subject_id: &str) -> Result<Option<WhitelistEntry>> {
    let subject_id = check_subject_id(subject_id)?;
    self
      .store
      .get_entry(&self.collection, subject_id)
      .await
      .map_err(Error::store)
  }

  pub async fn list_all(&self) -> Result<Vec<WhitelistEntry>> {
    self.store.list_entries(&self.collection).await.map_err(Error::store)
  }

  /// Remove the directory entry. The identity provider's own account is
  /// untouched; access ends at the subject's next policy check. Removing an
  /// absent entry succeeds.
  pub async fn remove(&self, subject_id: &str) -> Result<()> {
    let subject_id = check_subject_id(subject_id)?;
    let removed = self
      .store
      .delete_entry(&self.collection, subject_id)
      .await
      .map_err(Error::store)?;
    if removed {
      info!(subject_id, "whitelist entry removed");
    } else {
      debug!(subject_id, "no whitelist entry to remove");
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{ErrorKind, testing::MemoryStore};

  fn directory() -> (Arc<MemoryStore>, UserDirectory<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    (Arc::clone(&store), UserDirectory::new(store, "users"))
  }

  fn staff() -> EntryPatch {
    EntryPatch {
      role:         Role::User,
      email:        Some("t@nr.ac.th".into()),
      display_name: Some("Somchai".into()),
    }
  }

  #[tokio::test]
  async fn upsert_twice_is_one_entry() {
    let (_, dir) = directory();
    let first = dir.upsert("uid-1", staff()).await.unwrap();
    let second = dir.upsert("uid-1", staff()).await.unwrap();

    let all = dir.list_all().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(
      (&second.role, &second.email, &second.display_name),
      (&first.role, &first.email, &first.display_name)
    );
  }

  #[tokio::test]
  async fn set_role_keeps_profile_fields() {
    let (_, dir) = directory();
    dir.upsert("uid-1", staff()).await.unwrap();
    let entry = dir.set_role("uid-1", Role::Admin).await.unwrap();

    assert_eq!(entry.role, Role::Admin);
    assert_eq!(entry.email.as_deref(), Some("t@nr.ac.th"));
    assert_eq!(entry.display_name.as_deref(), Some("Somchai"));
  }

  #[tokio::test]
  async fn set_role_creates_missing_entry() {
    let (_, dir) = directory();
    dir.set_role("uid-2", Role::Admin).await.unwrap();
    let entry = dir.get("uid-2").await.unwrap().unwrap();
    assert_eq!(entry.role, Role::Admin);
    assert!(entry.email.is_none());
  }

  #[tokio::test]
  async fn remove_is_idempotent() {
    let (_, dir) = directory();
    dir.upsert("uid-1", staff()).await.unwrap();
    dir.remove("uid-1").await.unwrap();
    dir.remove("uid-1").await.unwrap();
    assert!(dir.get("uid-1").await.unwrap().is_none());
  }

  #[tokio::test]
  async fn collections_are_isolated() {
    let (store, dir) = directory();
    let other = UserDirectory::new(store, "staff");
    dir.upsert("uid-1", staff()).await.unwrap();
    assert!(other.list_all().await.unwrap().is_empty());
    assert_eq!(other.collection(), "staff");
  }

  #[tokio::test]
  async fn blank_subject_id_is_refused() {
    let (_, dir) = directory();
    let err = dir.upsert("  ", staff()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationError);
  }

  #[tokio::test]
  async fn padded_subject_id_is_refused_everywhere() {
    let (_, dir) = directory();
    dir.upsert("uid-1", staff()).await.unwrap();

    let err = dir.upsert(" uid-1 ", staff()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationError);
    let err = dir.set_role("uid-1\t", Role::Admin).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationError);
    assert!(dir.get(" uid-1").await.is_err());

    let err = dir.remove(" uid-1 ").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationError);
    assert!(dir.get("uid-1").await.unwrap().is_some());
    assert_eq!(dir.list_all().await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn store_failure_propagates() {
    let (store, dir) = directory();
    store.fail_writes(true);
    assert_eq!(dir.list_all().await.unwrap_err().kind(), ErrorKind::StoreError);
  }
}
