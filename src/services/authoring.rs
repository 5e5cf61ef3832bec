// src/services/authoring.rs

use rand::Rng;
use validator::Validate;

use crate::{
    config::{QUIZ_CODE_ATTEMPTS, QUIZ_CODE_LEN},
    error::AppError,
    models::quiz::{Quiz, QuizDraft},
    store::{QuizStore, StoreError},
};

/// Random numeric join code, zero-padded to `QUIZ_CODE_LEN` digits.
pub fn generate_code() -> String {
    let upper = 10u32.pow(QUIZ_CODE_LEN as u32);
    let n = rand::rng().random_range(0..upper);
    format!("{:0width$}", n, width = QUIZ_CODE_LEN)
}

/// Whitelist-based cleanup of creator-supplied markup. Safe tags such as
/// `<b>` survive; scripts, iframes and event-handler attributes are removed.
///
/// The result is HTML, not plain text: `2 < 3` is stored as `2 &lt; 3` and
/// clients must render it as markup.
fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

/// Strips unsafe markup from every participant-visible string.
fn sanitize(mut draft: QuizDraft) -> QuizDraft {
    draft.title = clean_html(draft.title.trim());
    draft.description = clean_html(draft.description.trim());
    for question in &mut draft.questions {
        question.text = clean_html(question.text.trim());
        for option in &mut question.options {
            *option = clean_html(option.trim());
        }
    }
    draft
}

/// Validates and stores a new quiz under a fresh join code.
///
/// Codes are random, so a collision is retried with a new code up to
/// `QUIZ_CODE_ATTEMPTS` times.
pub async fn create_quiz(
    store: &dyn QuizStore,
    owner_id: i64,
    draft: QuizDraft,
) -> Result<Quiz, AppError> {
    let draft = sanitize(draft);
    if let Err(validation_errors) = draft.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    for attempt in 1..=QUIZ_CODE_ATTEMPTS {
        let code = generate_code();
        match store.insert_quiz(owner_id, &code, &draft).await {
            Ok(quiz) => {
                tracing::info!(
                    "Creator {} created quiz {} ({} questions)",
                    owner_id,
                    quiz.code,
                    quiz.question_count()
                );
                return Ok(quiz);
            }
            Err(StoreError::DuplicateCode(_)) => {
                tracing::warn!(
                    "Quiz code {} already taken, regenerating (attempt {})",
                    code,
                    attempt
                );
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(AppError::InternalServerError(format!(
        "Could not find a free quiz code after {} attempts",
        QUIZ_CODE_ATTEMPTS
    )))
}
