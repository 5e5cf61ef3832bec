// src/session/controller.rs

use std::{collections::BTreeMap, sync::Arc};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    config::QUIZ_CODE_LEN,
    models::{
        participant::Participant,
        quiz::{PublicQuestion, Quiz},
        submission::{AttemptSummary, Score, SubmitTrigger},
    },
    session::{
        countdown::Countdown, error::SessionError, events::SessionObserver,
        scoring::calculate_score,
    },
    store::QuizStore,
};

/// Lifecycle of one participant's attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Loading,
    Active,
    Submitting,
    Completed,
}

/// Result of a `submit` call.
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub score: Score,
    /// Present only for the call that actually completed the attempt.
    /// Repeat calls after `Completed` get `None` and must not persist again.
    pub summary: Option<AttemptSummary>,
}

impl SubmitOutcome {
    pub fn is_first(&self) -> bool {
        self.summary.is_some()
    }
}

/// Result of one countdown tick.
#[derive(Debug, Clone)]
pub enum TickOutcome {
    Running { remaining_secs: u32 },
    /// Remaining time hit zero and the attempt was auto-submitted.
    Expired(SubmitOutcome),
    /// Session was not active. Nothing happened.
    Inactive,
}

/// Read-only view handed to the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub quiz_code: Option<String>,
    pub quiz_title: Option<String>,
    pub participant: Option<Participant>,
    pub question: Option<PublicQuestion>,
    pub cursor: usize,
    pub question_count: usize,
    pub remaining_secs: u32,
    pub tab_switches: u32,
    pub answers: BTreeMap<usize, usize>,
    pub score: Option<Score>,
    pub trigger: Option<SubmitTrigger>,
}

struct Completion {
    score: Score,
    trigger: SubmitTrigger,
}

struct Attempt {
    quiz: Quiz,
    participant: Participant,
    answers: BTreeMap<usize, usize>,
    cursor: usize,
    remaining_secs: u32,
    tab_switches: u32,
    started_at: DateTime<Utc>,
    forced_submit_requested: bool,
    completion: Option<Completion>,
}

/// Owns the lifecycle of a single quiz attempt.
///
/// `Idle -> Loading -> Active -> Submitting -> Completed`, with
/// `Loading -> Idle` when the quiz cannot be loaded and `reset` returning
/// to `Idle`. All mutation goes through `&mut self`, so callers that share a
/// session across tasks must serialize access (see `services::live`).
pub struct QuizSession {
    state: SessionState,
    attempt: Option<Attempt>,
    countdown: Option<Box<dyn Countdown>>,
    observer: Arc<dyn SessionObserver>,
}

impl QuizSession {
    pub fn new(observer: Arc<dyn SessionObserver>) -> Self {
        Self {
            state: SessionState::Idle,
            attempt: None,
            countdown: None,
            observer,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    pub fn remaining_secs(&self) -> u32 {
        self.attempt.as_ref().map_or(0, |a| a.remaining_secs)
    }

    pub fn tab_switches(&self) -> u32 {
        self.attempt.as_ref().map_or(0, |a| a.tab_switches)
    }

    pub fn cursor(&self) -> usize {
        self.attempt.as_ref().map_or(0, |a| a.cursor)
    }

    pub fn score(&self) -> Option<Score> {
        self.attempt
            .as_ref()
            .and_then(|a| a.completion.as_ref())
            .map(|c| c.score)
    }

    pub fn forced_submit_requested(&self) -> bool {
        self.attempt
            .as_ref()
            .is_some_and(|a| a.forced_submit_requested)
    }

    /// Resolves the quiz by code and starts the attempt.
    ///
    /// Validation failures leave the session `Idle` without ever entering
    /// `Loading`. Lookup failures roll back from `Loading` to `Idle`.
    pub async fn join(
        &mut self,
        store: &dyn QuizStore,
        code: &str,
        participant: &Participant,
        now: DateTime<Utc>,
    ) -> Result<Vec<PublicQuestion>, SessionError> {
        if self.state != SessionState::Idle {
            return Err(SessionError::NotActive(self.state));
        }

        let code = code.trim();
        if code.chars().count() != QUIZ_CODE_LEN {
            return Err(SessionError::invalid(format!(
                "Quiz code must be exactly {} characters.",
                QUIZ_CODE_LEN
            )));
        }

        let participant = participant.trimmed();
        if let Err(validation_errors) = participant.validate() {
            return Err(SessionError::invalid(validation_errors.to_string()));
        }

        self.transition(SessionState::Loading);

        let quiz = match store.find_quiz_by_code(code).await {
            Ok(Some(quiz)) if quiz.is_active => quiz,
            Ok(_) => {
                self.transition(SessionState::Idle);
                return Err(SessionError::NotFound(code.to_string()));
            }
            Err(e) => {
                tracing::error!("Failed to load quiz {}: {:?}", code, e);
                self.transition(SessionState::Idle);
                return Err(SessionError::Unavailable(e.to_string()));
            }
        };

        if quiz.questions.is_empty() {
            self.transition(SessionState::Idle);
            return Err(SessionError::invalid("Quiz has no questions."));
        }

        // A deadline that has already passed closes the quiz.
        let remaining_secs = initial_remaining_secs(&quiz, now);
        if remaining_secs == 0 {
            tracing::info!("Quiz {} is past its deadline", quiz.code);
            self.transition(SessionState::Idle);
            return Err(SessionError::NotFound(code.to_string()));
        }

        let questions = quiz.public_questions();

        tracing::info!(
            "Participant '{}' joined quiz {} ({} questions, {}s)",
            participant.name,
            quiz.code,
            questions.len(),
            remaining_secs
        );

        self.attempt = Some(Attempt {
            quiz,
            participant,
            answers: BTreeMap::new(),
            cursor: 0,
            remaining_secs,
            tab_switches: 0,
            started_at: now,
            forced_submit_requested: false,
            completion: None,
        });
        self.transition(SessionState::Active);

        Ok(questions)
    }

    /// Hands the controller the handle of the running countdown.
    /// If the attempt is no longer active the countdown is cancelled at once.
    pub fn attach_countdown(&mut self, mut countdown: Box<dyn Countdown>) {
        if self.state != SessionState::Active {
            countdown.cancel();
            return;
        }
        self.cancel_countdown();
        self.countdown = Some(countdown);
    }

    /// Records (or overwrites) the answer for one question.
    pub fn select_answer(
        &mut self,
        question_index: usize,
        option_index: usize,
    ) -> Result<(), SessionError> {
        let attempt = self.active_attempt_mut()?;

        let question = attempt.quiz.questions.get(question_index).ok_or_else(|| {
            SessionError::invalid(format!("Question {} does not exist.", question_index))
        })?;

        if option_index >= question.options.len() {
            return Err(SessionError::invalid(format!(
                "Option {} does not exist for question {}.",
                option_index, question_index
            )));
        }

        attempt.answers.insert(question_index, option_index);
        Ok(())
    }

    /// Moves the cursor by `delta`, clamped to the question range.
    pub fn navigate(&mut self, delta: i64) -> Result<usize, SessionError> {
        let attempt = self.active_attempt_mut()?;
        let last = attempt.quiz.question_count().saturating_sub(1) as i64;

        attempt.cursor = (attempt.cursor as i64).saturating_add(delta).clamp(0, last) as usize;
        Ok(attempt.cursor)
    }

    /// Jumps straight to a question, e.g. from a question palette.
    pub fn jump_to(&mut self, index: usize) -> Result<usize, SessionError> {
        let attempt = self.active_attempt_mut()?;

        if index >= attempt.quiz.question_count() {
            return Err(SessionError::invalid(format!(
                "Question {} does not exist.",
                index
            )));
        }

        attempt.cursor = index;
        Ok(index)
    }

    /// One second of countdown. Auto-submits exactly once at zero.
    pub fn tick(&mut self) -> TickOutcome {
        let Ok(attempt) = self.active_attempt_mut() else {
            return TickOutcome::Inactive;
        };

        attempt.remaining_secs = attempt.remaining_secs.saturating_sub(1);
        if attempt.remaining_secs > 0 {
            return TickOutcome::Running {
                remaining_secs: attempt.remaining_secs,
            };
        }

        tracing::info!("Time is up for quiz {}", attempt.quiz.code);
        self.observer.on_forced_submit(SubmitTrigger::Timer);

        match self.submit(SubmitTrigger::Timer) {
            Ok(outcome) => TickOutcome::Expired(outcome),
            Err(_) => TickOutcome::Inactive,
        }
    }

    /// Freezes the attempt and scores it.
    ///
    /// A user submit must already have passed the confirmation gate.
    /// Calling again after `Completed` returns the same score without a summary.
    pub fn submit(&mut self, trigger: SubmitTrigger) -> Result<SubmitOutcome, SessionError> {
        match self.state {
            SessionState::Active => {}
            SessionState::Completed => {
                let score = self.score().ok_or(SessionError::NotActive(self.state))?;
                return Ok(SubmitOutcome {
                    score,
                    summary: None,
                });
            }
            other => return Err(SessionError::NotActive(other)),
        }

        self.transition(SessionState::Submitting);
        self.cancel_countdown();

        let attempt = self
            .attempt
            .as_mut()
            .ok_or(SessionError::NotActive(SessionState::Submitting))?;

        let score = calculate_score(&attempt.answers, &attempt.quiz.questions);
        attempt.completion = Some(Completion { score, trigger });

        let summary = AttemptSummary {
            quiz_code: attempt.quiz.code.clone(),
            participant: attempt.participant.clone(),
            score,
            answers: attempt.answers.clone(),
            tab_switches: attempt.tab_switches,
            trigger,
            started_at: attempt.started_at,
            submitted_at: Utc::now(),
        };

        tracing::info!(
            "Quiz {} submitted by '{}' ({}): {}/{} ({}%)",
            summary.quiz_code,
            summary.participant.name,
            trigger.as_str(),
            score.correct,
            score.total,
            score.percentage
        );

        self.transition(SessionState::Completed);

        Ok(SubmitOutcome {
            score,
            summary: Some(summary),
        })
    }

    /// Counts one visibility loss. Returns the new total, or `None` when inactive.
    pub fn record_tab_switch(&mut self) -> Option<u32> {
        let attempt = self.active_attempt_mut().ok()?;
        attempt.tab_switches += 1;
        Some(attempt.tab_switches)
    }

    /// Forwards a warning to the presentation layer.
    pub fn raise_warning(&self, message: &str) {
        self.observer.on_warning(message);
    }

    /// Marks a forced submit as pending.
    ///
    /// Returns `true` only for the first request of an active attempt; the
    /// caller is then responsible for calling `submit` after its grace delay.
    pub fn request_forced_submit(&mut self, trigger: SubmitTrigger) -> bool {
        let Ok(attempt) = self.active_attempt_mut() else {
            return false;
        };
        if attempt.forced_submit_requested {
            return false;
        }
        attempt.forced_submit_requested = true;
        self.observer.on_forced_submit(trigger);
        true
    }

    /// Drops the attempt and returns to `Idle`.
    pub fn reset(&mut self) {
        self.cancel_countdown();
        self.attempt = None;
        if self.state != SessionState::Idle {
            self.transition(SessionState::Idle);
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let Some(attempt) = self.attempt.as_ref() else {
            return SessionSnapshot {
                state: self.state,
                quiz_code: None,
                quiz_title: None,
                participant: None,
                question: None,
                cursor: 0,
                question_count: 0,
                remaining_secs: 0,
                tab_switches: 0,
                answers: BTreeMap::new(),
                score: None,
                trigger: None,
            };
        };

        SessionSnapshot {
            state: self.state,
            quiz_code: Some(attempt.quiz.code.clone()),
            quiz_title: Some(attempt.quiz.title.clone()),
            participant: Some(attempt.participant.clone()),
            question: attempt
                .quiz
                .questions
                .get(attempt.cursor)
                .map(|q| PublicQuestion::from_question(attempt.cursor, q)),
            cursor: attempt.cursor,
            question_count: attempt.quiz.question_count(),
            remaining_secs: attempt.remaining_secs,
            tab_switches: attempt.tab_switches,
            answers: attempt.answers.clone(),
            score: attempt.completion.as_ref().map(|c| c.score),
            trigger: attempt.completion.as_ref().map(|c| c.trigger),
        }
    }

    fn active_attempt_mut(&mut self) -> Result<&mut Attempt, SessionError> {
        if self.state != SessionState::Active {
            return Err(SessionError::NotActive(self.state));
        }
        self.attempt
            .as_mut()
            .ok_or(SessionError::NotActive(self.state))
    }

    fn cancel_countdown(&mut self) {
        if let Some(mut countdown) = self.countdown.take() {
            countdown.cancel();
        }
    }

    fn transition(&mut self, to: SessionState) {
        let from = self.state;
        self.state = to;
        self.observer.on_state_change(from, to);
    }
}

impl Drop for QuizSession {
    fn drop(&mut self) {
        self.cancel_countdown();
    }
}

fn initial_remaining_secs(quiz: &Quiz, now: DateTime<Utc>) -> u32 {
    match quiz.ends_at {
        Some(deadline) => (deadline - now)
            .num_seconds()
            .clamp(0, i64::from(u32::MAX)) as u32,
        None => quiz.time_limit_secs.max(0) as u32,
    }
}
