//! In-memory doubles for the store and identity-provider traits.

use std::{
  collections::{BTreeMap, HashMap},
  sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
  },
};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::{Notify, broadcast};
use uuid::Uuid;

use crate::{
  identity::{Identity, IdentityProvider, ProviderError},
  record::{RecordDraft, RecordPatch, WasteRecord},
  store::DirectoryStore,
  whitelist::{EntryPatch, WhitelistEntry},
};

// ─── MemoryStore ─────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
#[error("memory store unavailable")]
pub struct Unavailable;

/// A parked whitelist lookup. `entered` fires when the lookup starts;
/// `release` lets it finish.
pub struct Gate {
  pub entered: Arc<Notify>,
  pub release: Arc<Notify>,
}

#[derive(Default)]
pub struct MemoryStore {
  entries:     Mutex<BTreeMap<(String, String), WhitelistEntry>>,
  records:     Mutex<HashMap<Uuid, WasteRecord>>,
  gates:       Mutex<HashMap<String, Gate>>,
  fail_lookup: AtomicBool,
  fail_writes: AtomicBool,
  clock:       Mutex<Option<DateTime<Utc>>>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  pub fn seed_entry(&self, collection: &str, subject_id: &str, patch: EntryPatch) {
    let entry = WhitelistEntry {
      subject_id:   subject_id.to_string(),
      role:         patch.role,
      email:        patch.email,
      display_name: patch.display_name,
      updated_at:   Utc::now(),
    };
    self
      .entries
      .lock()
      .unwrap()
      .insert((collection.to_string(), subject_id.to_string()), entry);
  }

  pub fn remove_entry(&self, collection: &str, subject_id: &str) {
    self
      .entries
      .lock()
      .unwrap()
      .remove(&(collection.to_string(), subject_id.to_string()));
  }

  /// Make every whitelist lookup fail.
  pub fn fail_lookups(&self, fail: bool) { self.fail_lookup.store(fail, Ordering::SeqCst); }

  /// Make every operation except whitelist lookups fail.
  pub fn fail_writes(&self, fail: bool) { self.fail_writes.store(fail, Ordering::SeqCst); }

  /// Pin `now()` to a fixed instant.
  pub fn set_now(&self, at: DateTime<Utc>) { *self.clock.lock().unwrap() = Some(at); }

  /// Park the next whitelist lookup for `subject_id` until released.
  pub fn pause_lookup(&self, subject_id: &str) -> Gate {
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    self.gates.lock().unwrap().insert(
      subject_id.to_string(),
      Gate { entered: Arc::clone(&entered), release: Arc::clone(&release) },
    );
    Gate { entered, release }
  }

  fn check_writes(&self) -> Result<(), Unavailable> {
    if self.fail_writes.load(Ordering::SeqCst) { Err(Unavailable) } else { Ok(()) }
  }
}

impl DirectoryStore for MemoryStore {
  type Error = Unavailable;

  fn now(&self) -> DateTime<Utc> { self.clock.lock().unwrap().unwrap_or_else(Utc::now) }

  async fn get_entry(&self, collection: &str, subject_id: &str) -> Result<Option<WhitelistEntry>, Unavailable> {
    let gate = self.gates.lock().unwrap().remove(subject_id);
    if let Some(gate) = gate {
      gate.entered.notify_one();
      gate.release.notified().await;
    }
    if self.fail_lookup.load(Ordering::SeqCst) {
      return Err(Unavailable);
    }
    let key = (collection.to_string(), subject_id.to_string());
    Ok(self.entries.lock().unwrap().get(&key).cloned())
  }

  async fn upsert_entry(
    &self,
    collection: &str,
    subject_id: &str,
    patch: EntryPatch,
    updated_at: DateTime<Utc>,
  ) -> Result<WhitelistEntry, Unavailable> {
    self.check_writes()?;
    let mut entries = self.entries.lock().unwrap();
    let entry = entries
      .entry((collection.to_string(), subject_id.to_string()))
      .or_insert_with(|| WhitelistEntry {
        subject_id: subject_id.to_string(),
        role: patch.role,
        email: None,
        display_name: None,
        updated_at,
      });
    entry.role = patch.role;
    if patch.email.is_some() {
      entry.email = patch.email;
    }
    if patch.display_name.is_some() {
      entry.display_name = patch.display_name;
    }
    entry.updated_at = updated_at;
    Ok(entry.clone())
  }

  async fn list_entries(&self, collection: &str) -> Result<Vec<WhitelistEntry>, Unavailable> {
    self.check_writes()?;
    Ok(
      self
        .entries
        .lock()
        .unwrap()
        .iter()
        .filter(|((c, _), _)| c == collection)
        .map(|(_, e)| e.clone())
        .collect(),
    )
  }

  async fn delete_entry(&self, collection: &str, subject_id: &str) -> Result<bool, Unavailable> {
    self.check_writes()?;
    let key = (collection.to_string(), subject_id.to_string());
    Ok(self.entries.lock().unwrap().remove(&key).is_some())
  }

  async fn insert_record(&self, draft: RecordDraft) -> Result<WasteRecord, Unavailable> {
    self.check_writes()?;
    let record = draft.into_record(Uuid::new_v4());
    self.records.lock().unwrap().insert(record.id, record.clone());
    Ok(record)
  }

  async fn get_record(&self, id: Uuid) -> Result<Option<WasteRecord>, Unavailable> {
    self.check_writes()?;
    Ok(self.records.lock().unwrap().get(&id).cloned())
  }

  async fn update_record(
    &self,
    id: Uuid,
    patch: RecordPatch,
    updated_at: DateTime<Utc>,
  ) -> Result<bool, Unavailable> {
    self.check_writes()?;
    let mut records = self.records.lock().unwrap();
    let Some(record) = records.get_mut(&id) else {
      return Ok(false);
    };
    if let Some(v) = patch.category {
      record.category = v;
    }
    if let Some(v) = patch.sub_category {
      record.sub_category = v;
    }
    if let Some(v) = patch.item_type {
      record.item_type = v;
    }
    if let Some(v) = patch.weight {
      record.weight = v;
    }
    record.updated_at = Some(updated_at);
    Ok(true)
  }

  async fn delete_record(&self, id: Uuid) -> Result<bool, Unavailable> {
    self.check_writes()?;
    Ok(self.records.lock().unwrap().remove(&id).is_some())
  }

  async fn list_records(&self, year: Option<i32>) -> Result<Vec<WasteRecord>, Unavailable> {
    self.check_writes()?;
    let mut records: Vec<_> = self
      .records
      .lock()
      .unwrap()
      .values()
      .filter(|r| year.is_none_or(|y| r.year == y))
      .cloned()
      .collect();
    records.sort_by(|a, b| b.date.cmp(&a.date));
    Ok(records)
  }
}

// ─── ScriptedProvider ────────────────────────────────────────────────────────

/// An identity provider whose sign-in results are queued by the test.
pub struct ScriptedProvider {
  current:        Mutex<Option<Identity>>,
  next:           Mutex<Option<Result<Identity, ProviderError>>>,
  last_hint:      Mutex<Option<String>>,
  sign_out_calls: AtomicUsize,
  on_sign_out:    Mutex<Option<Box<dyn Fn() + Send + Sync>>>,
  changes:        broadcast::Sender<Option<Identity>>,
}

impl ScriptedProvider {
  pub fn new() -> Self {
    let (changes, _) = broadcast::channel(16);
    Self {
      current: Mutex::new(None),
      next: Mutex::new(None),
      last_hint: Mutex::new(None),
      sign_out_calls: AtomicUsize::new(0),
      on_sign_out: Mutex::new(None),
      changes,
    }
  }

  /// Pretend a provider session already exists, without notifying.
  pub fn set_current(&self, identity: Option<Identity>) { *self.current.lock().unwrap() = identity; }

  pub fn next_sign_in(&self, result: Result<Identity, ProviderError>) {
    *self.next.lock().unwrap() = Some(result);
  }

  pub fn is_signed_in(&self) -> bool { self.current.lock().unwrap().is_some() }

  pub fn sign_out_calls(&self) -> usize { self.sign_out_calls.load(Ordering::SeqCst) }

  pub fn last_hint(&self) -> Option<String> { self.last_hint.lock().unwrap().clone() }

  /// Run `hook` at the start of every `sign_out` call.
  pub fn on_sign_out(&self, hook: impl Fn() + Send + Sync + 'static) {
    *self.on_sign_out.lock().unwrap() = Some(Box::new(hook));
  }
}

impl IdentityProvider for ScriptedProvider {
  async fn sign_in(&self, hint: Option<&str>) -> Result<Identity, ProviderError> {
    *self.last_hint.lock().unwrap() = hint.map(str::to_string);
    let result = self
      .next
      .lock()
      .unwrap()
      .take()
      .unwrap_or(Err(ProviderError::Cancelled));
    let identity = result?;
    *self.current.lock().unwrap() = Some(identity.clone());
    let _ = self.changes.send(Some(identity.clone()));
    Ok(identity)
  }

  async fn sign_out(&self) -> Result<(), ProviderError> {
    self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
    if let Some(hook) = self.on_sign_out.lock().unwrap().as_ref() {
      hook();
    }
    *self.current.lock().unwrap() = None;
    let _ = self.changes.send(None);
    Ok(())
  }

  fn subscribe(&self) -> broadcast::Receiver<Option<Identity>> { self.changes.subscribe() }
}
