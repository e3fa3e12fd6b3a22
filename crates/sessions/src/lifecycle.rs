//! Conversation lifecycle — the live conversation and its backing session.
//!
//! The controller owns the in-memory conversation and the id of the session
//! it is saved under.  Appending a turn never writes; [`commit`] is the only
//! path to storage.  A user/assistant exchange is a two-phase operation:
//! [`begin`] appends the user turn and hands out a [`PendingExchange`];
//! [`resolve`] appends the reply (or a fixed failure turn) and commits once.
//!
//! Replacing or resetting the conversation bumps a generation counter, so a
//! reply that arrives after `start_new`/`load`/`remove`/`clear_all` is
//! discarded instead of landing in the wrong conversation.
//!
//! [`commit`]: LifecycleController::commit
//! [`begin`]: LifecycleController::begin
//! [`resolve`]: LifecycleController::resolve

use parley_domain::error::Result;
use parley_domain::trace::TraceEvent;
use parley_domain::turn::{has_user_turn, Turn};
use parley_domain::{CompletionGateway, ResponseMode};

use crate::store::{Session, SessionStore};

/// Assistant turn recorded when the completion gateway fails.
pub const FAILURE_MESSAGE: &str = "Sorry, something went wrong. Please try again.";

/// Handle for an exchange whose reply has not arrived yet.
#[derive(Debug, Clone)]
pub struct PendingExchange {
    id: u64,
    generation: u64,
    turns: Vec<Turn>,
}

impl PendingExchange {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The conversation as it stood right after the user turn was appended.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }
}

/// Outcome of [`LifecycleController::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The reply was appended and the conversation committed.
    Applied {
        session_id: Option<String>,
        failed: bool,
    },
    /// The exchange no longer belongs to the current conversation.
    Stale,
}

pub struct LifecycleController {
    store: SessionStore,
    conversation: Vec<Turn>,
    active_session_id: Option<String>,
    cached_sessions: Vec<Session>,
    generation: u64,
    next_exchange_id: u64,
    in_flight: Option<u64>,
}

impl LifecycleController {
    pub fn new(store: SessionStore) -> Self {
        let cached_sessions = store.list_sessions();
        tracing::info!(sessions = cached_sessions.len(), "session history loaded");
        Self {
            store,
            conversation: Vec::new(),
            active_session_id: None,
            cached_sessions,
            generation: 0,
            next_exchange_id: 1,
            in_flight: None,
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────

    pub fn conversation(&self) -> &[Turn] {
        &self.conversation
    }

    pub fn active_session_id(&self) -> Option<&str> {
        self.active_session_id.as_deref()
    }

    /// Cached history, most recently saved first.
    pub fn sessions(&self) -> &[Session] {
        &self.cached_sessions
    }

    /// `true` while an exchange is waiting for its reply.  Advisory only.
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    // ── Conversation edits ────────────────────────────────────────────

    pub fn append_turn(&mut self, turn: Turn) {
        self.conversation.push(turn);
    }

    /// Save the conversation under the active session id (minting one on
    /// first save).  Does nothing when the conversation has no user turn.
    pub fn commit(&mut self) {
        if !has_user_turn(&self.conversation) {
            return;
        }

        match self
            .store
            .upsert_session(&self.conversation, self.active_session_id.as_deref())
        {
            Ok(id) => self.active_session_id = Some(id),
            Err(e) => {
                tracing::warn!(
                    session_id = ?self.active_session_id,
                    error = %e,
                    "failed to save conversation"
                );
            }
        }
        self.refresh();
    }

    /// Replace the conversation with a saved session.  Unknown ids are
    /// ignored (the listing may be older than the store).
    pub fn load(&mut self, id: &str) {
        let Some(session) = self.cached_sessions.iter().find(|s| s.id == id) else {
            tracing::debug!(session_id = %id, "load of unknown session ignored");
            return;
        };
        self.conversation = session.messages.clone();
        self.active_session_id = Some(session.id.clone());
        self.bump_generation("session loaded");
    }

    /// Save any unsaved user work, then start an empty conversation.
    pub fn start_new(&mut self) {
        if has_user_turn(&self.conversation) {
            self.commit();
        }
        self.reset_conversation();
        self.bump_generation("new conversation");
    }

    /// Delete a saved session.  Deleting the active session also clears the
    /// live conversation.
    pub fn remove(&mut self, id: &str) {
        if let Err(e) = self.store.delete_session(id) {
            tracing::warn!(session_id = %id, error = %e, "failed to delete session");
        }
        self.refresh();

        if self.active_session_id.as_deref() == Some(id) {
            self.reset_conversation();
            self.bump_generation("active session deleted");
        }
    }

    /// Wipe all history along with the live conversation.
    pub fn clear_all(&mut self) {
        if let Err(e) = self.store.clear_all() {
            tracing::warn!(error = %e, "failed to clear session history");
        }
        self.reset_conversation();
        self.cached_sessions.clear();
        self.bump_generation("history cleared");
    }

    // ── Two-phase exchange ────────────────────────────────────────────

    /// Append the user turn and mark an exchange in flight.
    ///
    /// Beginning while another exchange is in flight supersedes it: the
    /// older handle will resolve as [`Resolution::Stale`].
    pub fn begin(&mut self, turn: Turn) -> PendingExchange {
        self.conversation.push(turn);

        let id = self.next_exchange_id;
        self.next_exchange_id += 1;
        if let Some(previous) = self.in_flight.replace(id) {
            tracing::debug!(previous, exchange_id = id, "exchange superseded");
        }

        PendingExchange {
            id,
            generation: self.generation,
            turns: self.conversation.clone(),
        }
    }

    /// Record the gateway outcome for `pending` and commit.
    pub fn resolve(&mut self, pending: &PendingExchange, outcome: Result<Turn>) -> Resolution {
        if self.in_flight != Some(pending.id) || self.generation != pending.generation {
            TraceEvent::ExchangeDiscarded {
                exchange_id: pending.id,
                reason: "conversation changed while waiting for reply".into(),
            }
            .emit();
            return Resolution::Stale;
        }
        self.in_flight = None;

        let (reply, failed) = match outcome {
            Ok(turn) => (turn, false),
            Err(e) => {
                tracing::warn!(exchange_id = pending.id, error = %e, "completion failed");
                (Turn::assistant(FAILURE_MESSAGE), true)
            }
        };
        self.conversation.push(reply);
        self.commit();

        TraceEvent::ExchangeResolved {
            exchange_id: pending.id,
            session_id: self.active_session_id.clone(),
            failed,
        }
        .emit();

        Resolution::Applied {
            session_id: self.active_session_id.clone(),
            failed,
        }
    }

    /// Run one full exchange against `gateway`: begin, await, resolve.
    pub async fn exchange(
        &mut self,
        gateway: &dyn CompletionGateway,
        text: impl Into<String>,
        mode: ResponseMode,
    ) -> Resolution {
        let pending = self.begin(Turn::user(text));
        let outcome = gateway.complete(pending.turns(), mode).await;
        self.resolve(&pending, outcome)
    }

    // ── Private helpers ───────────────────────────────────────────────

    fn refresh(&mut self) {
        self.cached_sessions = self.store.list_sessions();
    }

    fn reset_conversation(&mut self) {
        self.conversation.clear();
        self.active_session_id = None;
    }

    fn bump_generation(&mut self, reason: &str) {
        self.generation += 1;
        if let Some(id) = self.in_flight.take() {
            tracing::debug!(exchange_id = id, reason, "in-flight exchange invalidated");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::{MemoryPort, PersistencePort};
    use parley_domain::error::Error;
    use parley_domain::Role;
    use std::sync::Arc;

    fn controller() -> (Arc<MemoryPort>, LifecycleController) {
        let port = Arc::new(MemoryPort::new());
        let store = SessionStore::new(port.clone());
        (port, LifecycleController::new(store))
    }

    struct EchoGateway;

    #[async_trait::async_trait]
    impl CompletionGateway for EchoGateway {
        async fn complete(&self, turns: &[Turn], mode: ResponseMode) -> Result<Turn> {
            let last = turns.last().map(|t| t.content.as_str()).unwrap_or("");
            Ok(Turn::assistant(format!("[{mode}] {last}")))
        }
    }

    struct FailingGateway;

    #[async_trait::async_trait]
    impl CompletionGateway for FailingGateway {
        async fn complete(&self, _turns: &[Turn], _mode: ResponseMode) -> Result<Turn> {
            Err(Error::Http("connection refused".into()))
        }
    }

    #[test]
    fn two_commits_update_one_session() {
        let (_port, mut ctl) = controller();

        ctl.append_turn(Turn::user("hi"));
        ctl.commit();
        let id = ctl.active_session_id().unwrap().to_owned();
        let first = ctl.store().get_session(&id).unwrap();
        assert_eq!(first.messages.len(), 1);

        ctl.append_turn(Turn::assistant("hello"));
        ctl.commit();

        assert_eq!(ctl.active_session_id(), Some(id.as_str()));
        assert_eq!(ctl.sessions().len(), 1);
        let second = &ctl.sessions()[0];
        assert_eq!(second.id, id);
        assert_eq!(second.messages.len(), 2);
        assert!(second.timestamp >= first.timestamp);
    }

    #[test]
    fn empty_commit_creates_nothing() {
        let (port, mut ctl) = controller();
        ctl.start_new();
        ctl.commit();

        assert!(ctl.sessions().is_empty());
        assert!(ctl.active_session_id().is_none());
        assert_eq!(port.write_count(), 0);
    }

    #[test]
    fn loading_a_deleted_session_changes_nothing() {
        let (_port, mut ctl) = controller();
        ctl.append_turn(Turn::user("old"));
        ctl.commit();
        let old_id = ctl.active_session_id().unwrap().to_owned();

        ctl.start_new();
        ctl.append_turn(Turn::user("current"));
        ctl.commit();
        let current_id = ctl.active_session_id().unwrap().to_owned();

        ctl.remove(&old_id);
        ctl.load(&old_id);

        assert_eq!(ctl.active_session_id(), Some(current_id.as_str()));
        assert_eq!(ctl.conversation(), &[Turn::user("current")]);
    }

    #[test]
    fn start_new_saves_pending_user_turn() {
        let (_port, mut ctl) = controller();
        ctl.append_turn(Turn::user("unsaved"));

        ctl.start_new();

        assert!(ctl.conversation().is_empty());
        assert!(ctl.active_session_id().is_none());
        assert_eq!(ctl.sessions().len(), 1);
        assert_eq!(ctl.sessions()[0].messages, vec![Turn::user("unsaved")]);
    }

    #[test]
    fn load_replaces_conversation_with_snapshot() {
        let (_port, mut ctl) = controller();
        ctl.append_turn(Turn::user("first"));
        ctl.commit();
        let id = ctl.active_session_id().unwrap().to_owned();
        ctl.start_new();

        ctl.load(&id);
        assert_eq!(ctl.active_session_id(), Some(id.as_str()));
        ctl.append_turn(Turn::user("more"));

        // The live edit does not leak into the cached snapshot.
        assert_eq!(ctl.sessions()[0].messages.len(), 1);
        assert_eq!(ctl.conversation().len(), 2);
    }

    #[test]
    fn removing_active_session_clears_conversation() {
        let (_port, mut ctl) = controller();
        ctl.append_turn(Turn::user("bye"));
        ctl.commit();
        let id = ctl.active_session_id().unwrap().to_owned();

        ctl.remove(&id);

        assert!(ctl.conversation().is_empty());
        assert!(ctl.active_session_id().is_none());
        assert!(ctl.sessions().is_empty());
    }

    #[test]
    fn removing_other_session_keeps_conversation() {
        let (_port, mut ctl) = controller();
        ctl.append_turn(Turn::user("a"));
        ctl.start_new();
        ctl.append_turn(Turn::user("b"));
        ctl.commit();
        let other = ctl.sessions()[1].id.clone();

        ctl.remove(&other);

        assert_eq!(ctl.conversation(), &[Turn::user("b")]);
        assert!(ctl.active_session_id().is_some());
        assert_eq!(ctl.sessions().len(), 1);
    }

    #[test]
    fn clear_all_resets_everything() {
        let (_port, mut ctl) = controller();
        ctl.append_turn(Turn::user("a"));
        ctl.start_new();
        ctl.append_turn(Turn::user("b"));
        ctl.commit();

        ctl.clear_all();

        assert!(ctl.conversation().is_empty());
        assert!(ctl.active_session_id().is_none());
        assert!(ctl.sessions().is_empty());
        assert!(ctl.store().list_sessions().is_empty());
    }

    #[test]
    fn history_survives_a_new_controller() {
        let port = Arc::new(MemoryPort::new());
        let mut ctl = LifecycleController::new(SessionStore::new(port.clone()));
        ctl.append_turn(Turn::user("persisted"));
        ctl.commit();

        let reopened = LifecycleController::new(SessionStore::new(port));
        assert_eq!(reopened.sessions().len(), 1);
        assert!(reopened.conversation().is_empty());
    }

    #[test]
    fn exchange_commits_once_with_both_halves() {
        let (port, mut ctl) = controller();
        let pending = ctl.begin(Turn::user("ping"));
        assert!(ctl.is_busy());
        assert_eq!(port.write_count(), 0);

        let res = ctl.resolve(&pending, Ok(Turn::assistant("pong")));

        assert!(matches!(res, Resolution::Applied { failed: false, .. }));
        assert!(!ctl.is_busy());
        assert_eq!(port.write_count(), 1);
        assert_eq!(ctl.sessions()[0].messages.len(), 2);
    }

    #[test]
    fn failed_exchange_records_failure_turn() {
        let (_port, mut ctl) = controller();
        let pending = ctl.begin(Turn::user("ping"));

        let res = ctl.resolve(&pending, Err(Error::Timeout("30s".into())));

        assert!(matches!(res, Resolution::Applied { failed: true, .. }));
        let saved = &ctl.sessions()[0].messages;
        assert_eq!(saved[0], Turn::user("ping"));
        assert_eq!(saved[1].role, Role::Assistant);
        assert_eq!(saved[1].content, FAILURE_MESSAGE);
    }

    #[test]
    fn reply_after_start_new_is_discarded() {
        let (_port, mut ctl) = controller();
        let pending = ctl.begin(Turn::user("slow question"));

        ctl.start_new();
        assert!(!ctl.is_busy());
        let res = ctl.resolve(&pending, Ok(Turn::assistant("late answer")));

        assert_eq!(res, Resolution::Stale);
        assert!(ctl.conversation().is_empty());
        // The user half was saved by start_new; the late reply was not added.
        assert_eq!(ctl.sessions()[0].messages, vec![Turn::user("slow question")]);
    }

    #[test]
    fn superseded_exchange_is_stale() {
        let (_port, mut ctl) = controller();
        let first = ctl.begin(Turn::user("one"));
        let second = ctl.begin(Turn::user("two"));

        assert_eq!(ctl.resolve(&first, Ok(Turn::assistant("a1"))), Resolution::Stale);
        assert!(matches!(
            ctl.resolve(&second, Ok(Turn::assistant("a2"))),
            Resolution::Applied { .. }
        ));
        assert_eq!(ctl.conversation().len(), 3);
    }

    #[tokio::test]
    async fn exchange_runs_against_gateway() {
        let (_port, mut ctl) = controller();

        let res = ctl.exchange(&EchoGateway, "hi", ResponseMode::Fast).await;

        let Resolution::Applied { session_id, failed } = res else {
            panic!("expected applied resolution");
        };
        assert!(!failed);
        assert_eq!(session_id.as_deref(), ctl.active_session_id());
        assert_eq!(ctl.conversation()[1], Turn::assistant("[fast] hi"));
    }

    #[tokio::test]
    async fn exchange_failure_still_commits() {
        let (_port, mut ctl) = controller();

        let res = ctl.exchange(&FailingGateway, "hi", ResponseMode::Default).await;

        assert!(matches!(res, Resolution::Applied { failed: true, .. }));
        assert_eq!(ctl.sessions().len(), 1);
        assert_eq!(ctl.conversation()[1].content, FAILURE_MESSAGE);
    }

    // ── Storage failures ──────────────────────────────────────────────

    /// Memory port whose writes can be switched to fail.
    #[derive(Default)]
    struct FlakyPort {
        inner: MemoryPort,
        fail_writes: std::sync::atomic::AtomicBool,
    }

    impl FlakyPort {
        fn break_writes(&self) {
            self.fail_writes
                .store(true, std::sync::atomic::Ordering::SeqCst);
        }
    }

    impl PersistencePort for FlakyPort {
        fn read(&self) -> Result<Option<String>> {
            self.inner.read()
        }

        fn write(&self, blob: &str) -> Result<()> {
            if self.fail_writes.load(std::sync::atomic::Ordering::SeqCst) {
                return Err(Error::Storage("disk full".into()));
            }
            self.inner.write(blob)
        }
    }

    #[test]
    fn failed_first_save_keeps_conversation_unsaved() {
        let port = Arc::new(FlakyPort::default());
        port.break_writes();
        let mut ctl = LifecycleController::new(SessionStore::new(port.clone()));

        ctl.append_turn(Turn::user("hi"));
        ctl.commit();

        assert!(ctl.active_session_id().is_none());
        assert_eq!(ctl.conversation(), &[Turn::user("hi")]);
        assert!(ctl.sessions().is_empty());
    }

    #[test]
    fn failed_writes_still_reset_live_state() {
        let port = Arc::new(FlakyPort::default());
        let mut ctl = LifecycleController::new(SessionStore::new(port.clone()));

        ctl.append_turn(Turn::user("hi"));
        ctl.commit();
        let id = ctl.active_session_id().unwrap().to_owned();

        port.break_writes();

        // A failed re-save keeps the id and the new turn in memory.
        ctl.append_turn(Turn::assistant("hello"));
        ctl.commit();
        assert_eq!(ctl.active_session_id(), Some(id.as_str()));
        assert_eq!(ctl.conversation().len(), 2);

        ctl.remove(&id);
        assert!(ctl.active_session_id().is_none());
        assert!(ctl.conversation().is_empty());
        // The delete never reached storage.
        assert_eq!(ctl.sessions().len(), 1);

        ctl.append_turn(Turn::user("again"));
        ctl.clear_all();
        assert!(ctl.conversation().is_empty());
        assert!(ctl.active_session_id().is_none());
        assert!(ctl.sessions().is_empty());
    }
}
