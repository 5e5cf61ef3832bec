// src/services/live.rs

use std::{collections::HashMap, sync::Arc, time::Duration};

use chrono::Utc;
use serde::Serialize;
use tokio::{
    sync::{Mutex, RwLock},
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};
use uuid::Uuid;

use crate::{
    models::{
        participant::Participant,
        quiz::PublicQuestion,
        submission::{AttemptSummary, Score, SubmitTrigger},
    },
    session::{
        AntiCheatMonitor, EventLog, MonitorAction, QuizSession, SessionError, SessionEvent,
        SessionSnapshot, Signal, SubmitOutcome, TickOutcome,
    },
    store::QuizStore,
};

/// Whether the finished attempt reached the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RecordStatus {
    NotSubmitted,
    Pending,
    Recorded,
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct LiveSnapshot {
    pub session_id: Uuid,
    #[serde(flatten)]
    pub session: SessionSnapshot,
    pub record: RecordStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitResult {
    pub score: Score,
    pub record: RecordStatus,
}

struct Inner {
    session: QuizSession,
    record: RecordStatus,
    finished_at: Option<Instant>,
}

impl Inner {
    /// Bookkeeping after a `submit` call. Returns the summary to persist, if any.
    fn finish(&mut self, outcome: SubmitOutcome) -> Option<AttemptSummary> {
        let summary = outcome.summary?;
        self.record = RecordStatus::Pending;
        self.finished_at = Some(Instant::now());
        Some(summary)
    }
}

/// One participant's attempt running on the tokio runtime.
///
/// Every controller call goes through `inner`, so the countdown task, the
/// anti-cheat grace task and HTTP handlers never mutate the attempt at the
/// same time.
pub struct LiveSession {
    id: Uuid,
    inner: Mutex<Inner>,
    events: Arc<EventLog>,
    store: Arc<dyn QuizStore>,
    monitor: AntiCheatMonitor,
}

impl LiveSession {
    /// Joins a quiz and starts its countdown.
    pub async fn join(
        store: Arc<dyn QuizStore>,
        monitor: AntiCheatMonitor,
        code: &str,
        participant: &Participant,
    ) -> Result<(Arc<Self>, Vec<PublicQuestion>), SessionError> {
        let id = Uuid::new_v4();
        let events = Arc::new(EventLog::new(id.to_string()));
        let mut session = QuizSession::new(events.clone());

        let questions = session
            .join(store.as_ref(), code, participant, Utc::now())
            .await?;

        let live = Arc::new(Self {
            id,
            inner: Mutex::new(Inner {
                session,
                record: RecordStatus::NotSubmitted,
                finished_at: None,
            }),
            events,
            store,
            monitor,
        });
        live.start_countdown().await;

        Ok((live, questions))
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub async fn snapshot(&self) -> LiveSnapshot {
        let inner = self.inner.lock().await;
        LiveSnapshot {
            session_id: self.id,
            session: inner.session.snapshot(),
            record: inner.record.clone(),
        }
    }

    /// Time since the attempt was submitted, `None` while it is still running.
    pub async fn finished_for(&self) -> Option<Duration> {
        self.inner.lock().await.finished_at.map(|at| at.elapsed())
    }

    pub fn events_since(&self, since: usize) -> Vec<SessionEvent> {
        self.events.since(since)
    }

    pub async fn select_answer(
        &self,
        question_index: usize,
        option_index: usize,
    ) -> Result<(), SessionError> {
        self.inner
            .lock()
            .await
            .session
            .select_answer(question_index, option_index)
    }

    pub async fn navigate(&self, delta: i64) -> Result<usize, SessionError> {
        self.inner.lock().await.session.navigate(delta)
    }

    pub async fn jump_to(&self, index: usize) -> Result<usize, SessionError> {
        self.inner.lock().await.session.jump_to(index)
    }

    /// Feeds an environment signal to the anti-cheat monitor.
    /// Schedules the forced submit when the monitor asks for one.
    pub async fn signal(self: &Arc<Self>, signal: &Signal) -> MonitorAction {
        let action = {
            let mut inner = self.inner.lock().await;
            self.monitor.observe(&mut inner.session, signal)
        };

        if let MonitorAction::ForcedSubmitScheduled { grace } = action {
            let live = Arc::clone(self);
            tokio::spawn(async move {
                tokio::time::sleep(grace).await;
                live.forced_submit(SubmitTrigger::AntiCheat).await;
            });
        }

        action
    }

    /// Participant-initiated submit. The caller has already confirmed.
    pub async fn submit(&self) -> Result<SubmitResult, SessionError> {
        let (score, summary) = {
            let mut inner = self.inner.lock().await;
            let outcome = inner.session.submit(SubmitTrigger::User)?;
            let score = outcome.score;
            (score, inner.finish(outcome))
        };

        if let Some(summary) = summary {
            self.persist(summary).await;
        }

        let record = self.inner.lock().await.record.clone();
        Ok(SubmitResult { score, record })
    }

    /// Abandons or tears down the attempt.
    pub async fn leave(&self) {
        self.inner.lock().await.session.reset();
    }

    async fn forced_submit(&self, trigger: SubmitTrigger) {
        let summary = {
            let mut inner = self.inner.lock().await;
            match inner.session.submit(trigger) {
                Ok(outcome) => inner.finish(outcome),
                Err(e) => {
                    tracing::debug!("Forced submit skipped for {}: {}", self.id, e);
                    None
                }
            }
        };

        if let Some(summary) = summary {
            self.persist(summary).await;
        }
    }

    async fn start_countdown(self: &Arc<Self>) {
        let live = Arc::clone(self);
        let handle = tokio::spawn(async move { live.run_countdown().await });
        self.inner
            .lock()
            .await
            .session
            .attach_countdown(Box::new(handle.abort_handle()));
    }

    async fn run_countdown(self: Arc<Self>) {
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        interval.tick().await;

        loop {
            interval.tick().await;

            let summary = {
                let mut inner = self.inner.lock().await;
                match inner.session.tick() {
                    TickOutcome::Running { .. } => continue,
                    TickOutcome::Expired(outcome) => inner.finish(outcome),
                    TickOutcome::Inactive => None,
                }
            };

            // Expiry cancels this very task, so persist from a fresh one.
            if let Some(summary) = summary {
                let live = Arc::clone(&self);
                tokio::spawn(async move { live.persist(summary).await });
            }
            break;
        }
    }

    /// Records the attempt. Failures are kept for the snapshot; the score stands.
    async fn persist(&self, summary: AttemptSummary) {
        let status = match self.store.record_attempt(&summary).await {
            Ok(()) => RecordStatus::Recorded,
            Err(e) => {
                tracing::error!(
                    "Failed to record attempt for quiz {} ({}): {}",
                    summary.quiz_code,
                    self.id,
                    e
                );
                RecordStatus::Failed {
                    error: e.to_string(),
                }
            }
        };
        self.inner.lock().await.record = status;
    }
}

/// Live sessions keyed by id.
///
/// Finished attempts stay readable for `retention` so clients can fetch the
/// score and events, then `sweep` drops them.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, Arc<LiveSession>>>,
    retention: Duration,
}

impl SessionRegistry {
    pub fn new(retention: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            retention,
        }
    }

    pub async fn insert(&self, session: Arc<LiveSession>) {
        self.sessions.write().await.insert(session.id(), session);
    }

    pub async fn get(&self, id: Uuid) -> Option<Arc<LiveSession>> {
        self.sessions.read().await.get(&id).cloned()
    }

    pub async fn remove(&self, id: Uuid) -> Option<Arc<LiveSession>> {
        self.sessions.write().await.remove(&id)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Removes sessions that finished at least `retention` ago.
    /// Returns how many were evicted.
    pub async fn sweep(&self) -> usize {
        let live: Vec<Arc<LiveSession>> = self.sessions.read().await.values().cloned().collect();

        let mut expired = Vec::new();
        for session in live {
            if session
                .finished_for()
                .await
                .is_some_and(|age| age >= self.retention)
            {
                expired.push(session.id());
            }
        }

        if expired.is_empty() {
            return 0;
        }

        let mut sessions = self.sessions.write().await;
        let evicted = expired
            .iter()
            .filter(|id| sessions.remove(*id).is_some())
            .count();
        tracing::debug!("Evicted {} finished sessions", evicted);
        evicted
    }

    /// Runs `sweep` every `period` until the task is aborted.
    pub fn spawn_reaper(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let registry = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                registry.sweep().await;
            }
        })
    }
}
