//! Local edits versus externally supplied values.
//!
//! While the user is typing, a value arriving from the owner of the content
//! must not replace the tree (it would clobber in-flight edits and move the
//! caret). The session tracks that with three states:
//!
//! ```text
//!            input / keydown                     quiescence elapsed
//!   Idle ───────────────────────▶ UserEditing ───────────────────────▶ Idle
//!    │  ▲
//!    │  └──────── reload done ────────┐
//!    └── value differs (idle only) ─▶ ExternalSync
//! ```
//!
//! Time is always passed in, never read, so transitions are deterministic.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    UserEditing { last_edit: Instant },
    /// Transient: the tree is being rebuilt from an external value.
    ExternalSync,
}

/// What happened to an externally offered value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The editor already shows this value.
    Unchanged,
    /// The user is editing; the value is held until the session goes idle.
    Deferred,
    /// The tree was rebuilt from the value.
    Applied,
}

/// Decision returned by [`EditSession::offer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncDecision {
    Unchanged,
    Deferred,
    /// The caller must rebuild and then call [`EditSession::finish_sync`].
    Begin,
}

#[derive(Debug, Clone)]
pub struct EditSession {
    state: SyncState,
    quiescence: Duration,
    last_rendered: String,
    pending: Option<String>,
}

impl EditSession {
    pub fn new(initial: impl Into<String>, quiescence: Duration) -> Self {
        Self {
            state: SyncState::Idle,
            quiescence,
            last_rendered: initial.into(),
            pending: None,
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == SyncState::Idle
    }

    /// The content the editor last rendered or emitted.
    pub fn last_rendered(&self) -> &str {
        &self.last_rendered
    }

    /// Any input or keydown event.
    pub fn note_local_edit(&mut self, now: Instant) {
        if self.state != SyncState::ExternalSync {
            self.state = SyncState::UserEditing { last_edit: now };
        }
    }

    /// Record content the editor emitted, so its echo is not re-applied.
    ///
    /// A value still waiting for quiescence is older than this emission and
    /// is dropped.
    pub fn record_emitted(&mut self, content: &str) {
        self.last_rendered = content.to_string();
        if self.pending.take().is_some() {
            tracing::debug!("deferred value superseded by local edit");
        }
    }

    /// Advance time: leave `UserEditing` once the quiescence delay passed.
    pub fn tick(&mut self, now: Instant) {
        if let SyncState::UserEditing { last_edit } = self.state {
            if now.saturating_duration_since(last_edit) >= self.quiescence {
                self.state = SyncState::Idle;
                tracing::debug!("edit session idle");
            }
        }
    }

    /// Offer an external value.
    pub fn offer(&mut self, value: &str, now: Instant) -> SyncDecision {
        self.tick(now);
        if value == self.last_rendered {
            self.pending = None;
            return SyncDecision::Unchanged;
        }
        if !self.is_idle() {
            self.pending = Some(value.to_string());
            return SyncDecision::Deferred;
        }
        self.pending = None;
        self.state = SyncState::ExternalSync;
        SyncDecision::Begin
    }

    /// Leave `ExternalSync` after the rebuild.
    pub fn finish_sync(&mut self, rendered: &str) {
        self.last_rendered = rendered.to_string();
        self.state = SyncState::Idle;
    }

    /// A deferred value that may now be applied.
    pub fn take_ready(&mut self, now: Instant) -> Option<String> {
        self.tick(now);
        if self.is_idle() { self.pending.take() } else { None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const Q: Duration = Duration::from_millis(100);

    #[test]
    fn test_edit_then_quiesce() {
        let t0 = Instant::now();
        let mut session = EditSession::new("a", Q);
        session.note_local_edit(t0);
        assert!(matches!(session.state(), SyncState::UserEditing { .. }));
        session.tick(t0 + Duration::from_millis(99));
        assert!(!session.is_idle());
        session.tick(t0 + Q);
        assert!(session.is_idle());
    }

    #[test]
    fn test_offer_while_editing_is_deferred() {
        let t0 = Instant::now();
        let mut session = EditSession::new("a", Q);
        session.note_local_edit(t0);
        assert_eq!(session.offer("b", t0 + Duration::from_millis(10)), SyncDecision::Deferred);
        assert_eq!(session.take_ready(t0 + Duration::from_millis(50)), None);
        assert_eq!(session.take_ready(t0 + Q).as_deref(), Some("b"));
        assert_eq!(session.take_ready(t0 + Q), None);
    }

    #[test]
    fn test_offer_idle_begins_sync() {
        let t0 = Instant::now();
        let mut session = EditSession::new("a", Q);
        assert_eq!(session.offer("a", t0), SyncDecision::Unchanged);
        assert_eq!(session.offer("b", t0), SyncDecision::Begin);
        assert_eq!(session.state(), SyncState::ExternalSync);
        session.note_local_edit(t0);
        assert_eq!(session.state(), SyncState::ExternalSync);
        session.finish_sync("b");
        assert!(session.is_idle());
        assert_eq!(session.last_rendered(), "b");
    }

    #[test]
    fn test_local_emission_drops_deferred_value() {
        let t0 = Instant::now();
        let mut session = EditSession::new("a", Q);
        session.note_local_edit(t0);
        assert_eq!(session.offer("x", t0 + Duration::from_millis(10)), SyncDecision::Deferred);
        session.note_local_edit(t0 + Duration::from_millis(20));
        session.record_emitted("ac");
        assert_eq!(session.take_ready(t0 + Duration::from_secs(1)), None);
        assert_eq!(session.last_rendered(), "ac");
    }

    #[test]
    fn test_echo_of_emitted_value_is_unchanged() {
        let t0 = Instant::now();
        let mut session = EditSession::new("a", Q);
        session.note_local_edit(t0);
        session.record_emitted("ab");
        assert_eq!(session.offer("ab", t0), SyncDecision::Unchanged);
    }
}
