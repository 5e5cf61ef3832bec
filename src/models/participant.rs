// src/models/participant.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Identity a participant types in on the join screen.
/// All fields are free text and required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Participant {
    #[validate(length(min = 1, max = 100, message = "Name is required."))]
    pub name: String,

    #[validate(length(min = 1, max = 100, message = "Roll number is required."))]
    pub roll_number: String,

    #[validate(length(min = 1, max = 100, message = "Branch is required."))]
    pub branch: String,
}

impl Participant {
    /// Returns a copy with surrounding whitespace removed from every field.
    /// Validate the result, not the raw input: "  " must count as empty.
    pub fn trimmed(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            roll_number: self.roll_number.trim().to_string(),
            branch: self.branch.trim().to_string(),
        }
    }
}
