// src/models/submission.rs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::participant::Participant;

/// Final result of one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub correct: usize,
    pub total: usize,
    /// `round(100 * correct / total)`, 0 for an empty quiz.
    pub percentage: u32,
}

/// What ended an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitTrigger {
    /// Participant pressed submit and confirmed.
    User,
    /// Countdown reached zero.
    Timer,
    /// Anti-cheat monitor hit the tab-switch limit.
    AntiCheat,
}

impl SubmitTrigger {
    pub fn as_str(self) -> &'static str {
        match self {
            SubmitTrigger::User => "user",
            SubmitTrigger::Timer => "timer",
            SubmitTrigger::AntiCheat => "anti_cheat",
        }
    }
}

/// Everything persisted about a finished attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptSummary {
    pub quiz_code: String,
    pub participant: Participant,
    pub score: Score,
    /// Question index -> selected option index. Unanswered questions are absent.
    pub answers: BTreeMap<usize, usize>,
    pub tab_switches: u32,
    pub trigger: SubmitTrigger,
    pub started_at: DateTime<Utc>,
    pub submitted_at: DateTime<Utc>,
}

/// One row of a quiz leaderboard.
/// Represents a row from the `attempts` table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LeaderboardEntry {
    pub name: String,
    pub roll_number: String,
    pub branch: String,
    pub score: i32,
    pub total: i32,
    pub percentage: i32,
    pub tab_switches: i32,
    pub submitted_at: DateTime<Utc>,
}

impl From<&AttemptSummary> for LeaderboardEntry {
    fn from(summary: &AttemptSummary) -> Self {
        Self {
            name: summary.participant.name.clone(),
            roll_number: summary.participant.roll_number.clone(),
            branch: summary.participant.branch.clone(),
            score: summary.score.correct as i32,
            total: summary.score.total as i32,
            percentage: summary.score.percentage as i32,
            tab_switches: summary.tab_switches as i32,
            submitted_at: summary.submitted_at,
        }
    }
}
