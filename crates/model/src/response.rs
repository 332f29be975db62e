use crate::{Id, Poll};
use alloc::{collections::BTreeMap, string::String, vec::Vec};
use serde::{Deserialize, Serialize};

#[derive(Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceResponse {
    pub choice_id: Id,
    pub text: String,
    pub vote_count: i64,
}

/// A poll along with the tally of each of its choices.
#[derive(Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollResponse {
    pub poll_id: Id,
    pub question: String,
    pub choices: Vec<ChoiceResponse>,
    pub total_votes: i64,
}

impl PollResponse {
    /// Pairs each choice with its entry in `counts` (keyed by choice ID). Choices without an
    /// entry have not been voted on yet. Entries for choices outside this poll are ignored.
    pub fn new(poll: Poll, counts: &BTreeMap<Id, i64>) -> Self {
        let Poll { id, question, choices } = poll;
        let choices: Vec<_> = choices
            .into_iter()
            .map(|choice| ChoiceResponse {
                vote_count: counts.get(&choice.id).copied().unwrap_or_default(),
                choice_id: choice.id,
                text: choice.text,
            })
            .collect();
        let total_votes = choices.iter().map(|choice| choice.vote_count).sum();
        Self { poll_id: id, question, choices, total_votes }
    }
}
