//! The session state manager.
//!
//! Holds the single process-wide [`Session`] and updates it in response to
//! identity-provider notifications and explicit [`login`](SessionManager::login)
//! / [`logout`](SessionManager::logout) calls. Every update goes through the
//! same [`AccessPolicy`].
//!
//! # Ordering
//!
//! Evaluations are asynchronous and can complete out of order. Each one is
//! tagged with a generation number when it starts; its result is committed
//! only if no newer evaluation has started since. A stale result is dropped
//! together with its side effects.
//!
//! A rejection signs the provider out before the reason is published. The
//! empty notification caused by that sign-out does not make the rejection
//! stale; only a newer identity does.

use std::sync::{
  Arc,
  atomic::{AtomicU64, Ordering},
};

use serde::Serialize;
use tokio::{
  sync::{broadcast::error::RecvError, watch},
  task::JoinHandle,
};
use tracing::{debug, error, info, warn};

use crate::{
  Error, ErrorKind, Result,
  identity::{Identity, IdentityProvider, Principal, Role},
  policy::{AccessPolicy, Rejection},
  store::DirectoryStore,
};

// ─── Session value ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
  /// No notification has been processed yet.
  #[default]
  Initializing,
  /// An identity is being checked against the access policy.
  Evaluating,
  Unauthenticated,
  Authenticated,
}

/// The last failure seen while establishing a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LastError {
  pub kind:    ErrorKind,
  pub message: String,
}

impl From<&Error> for LastError {
  fn from(e: &Error) -> Self { Self { kind: e.kind(), message: e.to_string() } }
}

impl From<&Rejection> for LastError {
  fn from(r: &Rejection) -> Self { Self { kind: r.kind(), message: r.to_string() } }
}

/// Snapshot of the current authentication state.
///
/// While `ready` is false nothing gated should be shown or decided on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Session {
  principal:  Option<Principal>,
  phase:      Phase,
  ready:      bool,
  last_error: Option<LastError>,
}

impl Session {
  pub fn principal(&self) -> Option<&Principal> { self.principal.as_ref() }

  pub fn identity(&self) -> Option<&Identity> {
    self.principal.as_ref().map(|p| &p.identity)
  }

  pub fn role(&self) -> Option<Role> { self.principal.as_ref().map(|p| p.role) }

  pub fn phase(&self) -> Phase { self.phase }

  pub fn is_ready(&self) -> bool { self.ready }

  pub fn is_admin(&self) -> bool { self.principal.as_ref().is_some_and(Principal::is_admin) }

  pub fn last_error(&self) -> Option<&LastError> { self.last_error.as_ref() }

  fn authenticate(&mut self, principal: Principal) {
    self.principal = Some(principal);
    self.phase = Phase::Authenticated;
    self.ready = true;
    self.last_error = None;
  }

  /// Drop to unauthenticated. `last_error` is kept so a rejection reason
  /// survives the sign-out notification that follows it.
  fn sign_out(&mut self) {
    self.principal = None;
    self.phase = Phase::Unauthenticated;
    self.ready = true;
  }

  /// Enter [`Phase::Evaluating`] for `identity`. A different identity hides
  /// the previous principal until its own result is in.
  fn evaluating(&mut self, identity: &Identity) {
    if self.identity() != Some(identity) {
      self.principal = None;
      self.ready = false;
    }
    self.phase = Phase::Evaluating;
  }

  fn reject(&mut self, rejection: &Rejection) {
    self.sign_out();
    self.last_error = Some(rejection.into());
  }
}

// ─── Manager ─────────────────────────────────────────────────────────────────

/// Owns the [`Session`] and the only entry points that change it.
pub struct SessionManager<P, S> {
  provider:   Arc<P>,
  store:      Arc<S>,
  policy:     AccessPolicy,
  generation: AtomicU64,
  /// Newest generation that carried an identity.
  identified: AtomicU64,
  state:      watch::Sender<Session>,
}

impl<P, S> SessionManager<P, S>
where
  P: IdentityProvider,
  S: DirectoryStore,
{
  pub fn new(provider: Arc<P>, store: Arc<S>, policy: AccessPolicy) -> Self {
    let (state, _) = watch::channel(Session::default());
    Self {
      provider,
      store,
      policy,
      generation: AtomicU64::new(0),
      identified: AtomicU64::new(0),
      state,
    }
  }

  /// The current session.
  pub fn session(&self) -> Session { self.state.borrow().clone() }

  /// Subscribe to session changes.
  pub fn watch(&self) -> watch::Receiver<Session> { self.state.subscribe() }

  /// Process one provider notification.
  pub async fn handle_state_change(&self, identity: Option<Identity>) {
    let generation = self.begin(identity.is_some());
    self.process(generation, identity).await;
  }

  /// Interactive sign-in, restricted (as a hint) to the configured domain.
  ///
  /// The result is checked with the same policy the notification path uses,
  /// so a rejection is reported here without waiting for the notification.
  /// On rejection the provider session is terminated before the reason is
  /// published or returned.
  pub async fn login(&self) -> Result<Principal> {
    self.state.send_modify(|s| s.last_error = None);

    let identity = match self.provider.sign_in(Some(self.policy.config().domain.as_str())).await {
      Ok(identity) => identity,
      Err(e) => {
        let err = Error::from(e);
        info!(kind = %err.kind(), "sign-in did not complete");
        self.state.send_modify(|s| s.last_error = Some((&err).into()));
        return Err(err);
      }
    };

    let generation = self.begin(true);
    match self.evaluate(generation, identity).await {
      Ok(principal) => Ok(principal),
      Err(rejection) => {
        // Signed out even when a newer notification superseded the update.
        self.force_sign_out().await;
        self.commit_rejection(generation, &rejection);
        Err(rejection.into())
      }
    }
  }

  /// Terminate the provider session and drop to unauthenticated.
  pub async fn logout(&self) -> Result<()> {
    self.provider.sign_out().await?;
    self.handle_state_change(None).await;
    Ok(())
  }

  /// Start following provider notifications.
  ///
  /// Generations are assigned in arrival order, then each notification is
  /// evaluated on its own task. Aborting the returned handle unsubscribes.
  pub fn listen(self: &Arc<Self>) -> JoinHandle<()>
  where
    P: 'static,
    S: 'static,
  {
    let manager = Arc::clone(self);
    let mut changes = self.provider.subscribe();

    tokio::spawn(async move {
      loop {
        match changes.recv().await {
          Ok(identity) => {
            let generation = manager.begin(identity.is_some());
            let manager = Arc::clone(&manager);
            tokio::spawn(async move { manager.process(generation, identity).await });
          }
          Err(RecvError::Lagged(skipped)) => {
            warn!(skipped, "session listener lagged behind provider notifications");
          }
          Err(RecvError::Closed) => {
            debug!("identity provider closed its notification channel");
            break;
          }
        }
      }
    })
  }

  // ── Internals ─────────────────────────────────────────────────────────

  fn begin(&self, carries_identity: bool) -> u64 {
    let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
    if carries_identity {
      self.identified.fetch_max(generation, Ordering::SeqCst);
    }
    generation
  }

  fn is_current(&self, generation: u64) -> bool {
    self.generation.load(Ordering::SeqCst) == generation
  }

  /// Apply `update` if `generation` is still the newest. Returns whether it
  /// was applied.
  fn commit(&self, generation: u64, update: impl FnOnce(&mut Session)) -> bool {
    Self::commit_against(&self.state, &self.generation, generation, update)
  }

  /// Publish `rejection` unless a newer identity has arrived since
  /// `generation`. Empty notifications in between do not count.
  fn commit_rejection(&self, generation: u64, rejection: &Rejection) -> bool {
    Self::commit_against(&self.state, &self.identified, generation, |s| s.reject(rejection))
  }

  fn commit_against(
    state: &watch::Sender<Session>,
    counter: &AtomicU64,
    generation: u64,
    update: impl FnOnce(&mut Session),
  ) -> bool {
    state.send_if_modified(|session| {
      let latest = counter.load(Ordering::SeqCst);
      if latest != generation {
        debug!(generation, latest, "discarding stale session update");
        return false;
      }
      update(session);
      true
    })
  }

  async fn process(&self, generation: u64, identity: Option<Identity>) {
    match identity {
      None => {
        self.commit(generation, Session::sign_out);
      }
      Some(identity) => {
        let Err(rejection) = self.evaluate(generation, identity).await else {
          return;
        };
        if !self.is_current(generation) {
          debug!(generation, "dropping stale rejection");
          return;
        }
        self.force_sign_out().await;
        self.commit_rejection(generation, &rejection);
      }
    }
  }

  /// Run the policy under `generation`. Only success is committed here; the
  /// caller publishes a rejection once the provider is signed out.
  async fn evaluate(&self, generation: u64, identity: Identity) -> Result<Principal, Rejection> {
    self.commit(generation, |s| s.evaluating(&identity));

    let decision = self.policy.evaluate(&identity, &*self.store).await;
    let principal = decision.into_principal(identity)?;
    if self.commit(generation, |s| s.authenticate(principal.clone())) {
      info!(
        subject_id = %principal.identity.subject_id,
        role = %principal.role,
        "session authenticated"
      );
    }
    Ok(principal)
  }

  async fn force_sign_out(&self) {
    if let Err(e) = self.provider.sign_out().await {
      error!(error = %e, "failed to terminate provider session after rejection");
    }
  }
}
