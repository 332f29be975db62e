#![cfg_attr(not(test), no_std)]
extern crate alloc;

pub mod poll;
pub mod response;

pub use poll::{Choice, ChoiceRequest, Poll, PollRequest, VoteRequest};
pub use response::{ChoiceResponse, PollResponse};

/// Identifier of a poll, a choice, or a user.
pub type Id = i64;
