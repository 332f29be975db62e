use core::fmt::{self, Display};
use hyper::StatusCode;
use model::Id;

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    PollNotFound(Id),
    ChoiceNotFound(Id),
    UserNotFound(Id),
    /// The user has already voted in this poll.
    DuplicateVote,
    /// The request was rejected by validation. Contains the reason.
    BadInput(&'static str),
    Fatal,
}

impl Error {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::PollNotFound(_) | Self::ChoiceNotFound(_) | Self::UserNotFound(_) => StatusCode::NOT_FOUND,
            Self::DuplicateVote => StatusCode::CONFLICT,
            Self::BadInput(_) => StatusCode::BAD_REQUEST,
            Self::Fatal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Fallback for storage errors that the call site does not handle on its own.
impl From<db::error::Error> for Error {
    fn from(err: db::error::Error) -> Self {
        match err {
            db::error::Error::BadInput => Self::BadInput("Unacceptable input."),
            _ => Self::Fatal,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PollNotFound(id) => write!(f, "Poll not found with id : '{id}'"),
            Self::ChoiceNotFound(id) => write!(f, "Choice not found with id : '{id}'"),
            Self::UserNotFound(id) => write!(f, "User not found with id : '{id}'"),
            Self::DuplicateVote => f.write_str("Sorry! You have already cast your vote in this poll"),
            Self::BadInput(reason) => f.write_str(reason),
            Self::Fatal => f.write_str("Oops! We have encountered an unrecoverable error on our end."),
        }
    }
}

pub type Result<T> = core::result::Result<T, Error>;
