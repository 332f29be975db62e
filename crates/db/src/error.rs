use core::fmt::{self, Display};
use tokio_postgres::error::SqlState;

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    /// The requested row (or one that it references) does not exist.
    NotFound,
    /// The object we are trying to insert already exists.
    AlreadyExists,
    /// The referenced user is not registered.
    UnknownUser,
    /// The input violates a check constraint.
    BadInput,
    /// Unrecoverable error.
    Fatal,
}

impl From<tokio_postgres::Error> for Error {
    fn from(err: tokio_postgres::Error) -> Self {
        let Some(db) = err.as_db_error() else {
            log::error!("database connection error: {err}");
            return Self::Fatal;
        };

        let constraint = db.constraint().unwrap_or_default();
        match (db.code(), constraint) {
            (&SqlState::UNIQUE_VIOLATION, "vote_poll_author_key") => Self::AlreadyExists,
            (&SqlState::FOREIGN_KEY_VIOLATION, "vote_author_fkey") => Self::UnknownUser,
            (&SqlState::FOREIGN_KEY_VIOLATION, "vote_choice_fkey") => Self::NotFound,
            (&SqlState::CHECK_VIOLATION, "poll_question_check" | "choice_text_check") => Self::BadInput,
            (&SqlState::STRING_DATA_RIGHT_TRUNCATION | &SqlState::CHARACTER_NOT_IN_REPERTOIRE, _) => Self::BadInput,
            (code, _) => {
                log::error!("unexpected database error {}: {}", code.code(), db.message());
                Self::Fatal
            }
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NotFound => "Row not found.",
            Self::AlreadyExists => "Row already exists.",
            Self::UnknownUser => "Unknown user.",
            Self::BadInput => "Unacceptable input.",
            Self::Fatal => "Unrecoverable database error.",
        })
    }
}

pub type Result<T> = core::result::Result<T, Error>;
