// src/session/scoring.rs

use std::collections::BTreeMap;

use crate::models::{quiz::Question, submission::Score};

/// Scores a set of answers against the quiz's answer key.
///
/// Walks the questions, not the answers, so the result does not depend on the
/// order answers were given. Unanswered questions and answers pointing at
/// unknown questions count as wrong.
pub fn calculate_score(answers: &BTreeMap<usize, usize>, questions: &[Question]) -> Score {
    let total = questions.len();

    if total == 0 {
        return Score {
            correct: 0,
            total: 0,
            percentage: 0,
        };
    }

    let correct = questions
        .iter()
        .enumerate()
        .filter(|(index, question)| answers.get(index) == Some(&question.correct_option))
        .count();

    Score {
        correct,
        total,
        percentage: percentage(correct, total),
    }
}

fn percentage(correct: usize, total: usize) -> u32 {
    ((correct as f64 / total as f64) * 100.0).round() as u32
}
