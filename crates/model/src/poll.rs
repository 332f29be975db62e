use crate::Id;
use alloc::{string::String, vec::Vec};
use serde::{Deserialize, Serialize};

pub const MAX_QUESTION_LENGTH: usize = 140;
pub const MAX_CHOICE_LENGTH: usize = 40;
pub const MIN_CHOICES: usize = 2;
pub const MAX_CHOICES: usize = 6;

/// One selectable option as stored in the database.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Choice {
    pub id: Id,
    pub text: String,
}

/// A question along with its choices in display order.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Poll {
    pub id: Id,
    pub question: String,
    pub choices: Vec<Choice>,
}

impl Poll {
    pub fn choice(&self, id: Id) -> Option<&Choice> {
        self.choices.iter().find(|choice| choice.id == id)
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ChoiceRequest {
    pub text: String,
}

/// Acceptable schema for new (or replacement) polls.
#[derive(Debug, Deserialize, Serialize)]
pub struct PollRequest {
    /// Question to be displayed to voters.
    pub question: String,
    /// Possible answers in the order they should be presented.
    pub choices: Vec<ChoiceRequest>,
}

impl PollRequest {
    /// Checks the request against the same limits that the database enforces.
    pub fn validate(&self) -> Result<(), &'static str> {
        let question = self.question.trim();
        if question.is_empty() {
            return Err("The question must not be blank.");
        }
        if question.chars().count() > MAX_QUESTION_LENGTH {
            return Err("The question must not exceed 140 characters.");
        }
        if question.chars().any(char::is_control) {
            return Err("The question must not contain control characters.");
        }

        if !(MIN_CHOICES..=MAX_CHOICES).contains(&self.choices.len()) {
            return Err("A poll must have between 2 and 6 choices.");
        }

        for ChoiceRequest { text } in &self.choices {
            let text = text.trim();
            if text.is_empty() {
                return Err("Choices must not be blank.");
            }
            if text.chars().count() > MAX_CHOICE_LENGTH {
                return Err("Choices must not exceed 40 characters.");
            }
            if text.chars().any(char::is_control) {
                return Err("Choices must not contain control characters.");
            }
        }

        Ok(())
    }

    pub fn texts(&self) -> Vec<&str> {
        self.choices.iter().map(|choice| choice.text.trim()).collect()
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub choice_id: Id,
}
