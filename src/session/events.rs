// src/session/events.rs

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{models::submission::SubmitTrigger, session::controller::SessionState};

/// Hooks the presentation layer subscribes to.
/// Every method has a no-op default so observers pick what they need.
pub trait SessionObserver: Send + Sync {
    fn on_warning(&self, _message: &str) {}

    fn on_forced_submit(&self, _trigger: SubmitTrigger) {}

    fn on_state_change(&self, _from: SessionState, _to: SessionState) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl SessionObserver for NoopObserver {}

/// One recorded observer callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEventKind {
    Warning { message: String },
    ForcedSubmit { trigger: SubmitTrigger },
    StateChange { from: SessionState, to: SessionState },
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionEvent {
    /// Position in the log, starting at 0. Clients poll with `?since=`.
    pub seq: usize,
    #[serde(flatten)]
    pub kind: SessionEventKind,
    pub at: DateTime<Utc>,
}

/// Observer that keeps every event for polling and mirrors them to the log.
#[derive(Debug, Default)]
pub struct EventLog {
    label: String,
    events: Mutex<Vec<SessionEvent>>,
}

impl EventLog {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            events: Mutex::new(Vec::new()),
        }
    }

    /// Events with `seq >= since`.
    pub fn since(&self, since: usize) -> Vec<SessionEvent> {
        let events = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        events.iter().skip(since).cloned().collect()
    }

    pub fn kinds(&self) -> Vec<SessionEventKind> {
        self.since(0).into_iter().map(|e| e.kind).collect()
    }

    fn push(&self, kind: SessionEventKind) {
        let mut events = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        let seq = events.len();
        events.push(SessionEvent {
            seq,
            kind,
            at: Utc::now(),
        });
    }
}

impl SessionObserver for EventLog {
    fn on_warning(&self, message: &str) {
        tracing::warn!(session = %self.label, "Warning raised: {}", message);
        self.push(SessionEventKind::Warning {
            message: message.to_string(),
        });
    }

    fn on_forced_submit(&self, trigger: SubmitTrigger) {
        tracing::warn!(
            session = %self.label,
            trigger = trigger.as_str(),
            "Forced submit initiated"
        );
        self.push(SessionEventKind::ForcedSubmit { trigger });
    }

    fn on_state_change(&self, from: SessionState, to: SessionState) {
        tracing::info!(session = %self.label, "Session state {:?} -> {:?}", from, to);
        self.push(SessionEventKind::StateChange { from, to });
    }
}
