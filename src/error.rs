//! Error type shared by the library modules.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StudyError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("invalid quality '{0}': expected easy, medium or hard")]
    InvalidQuality(String),

    #[error("invalid category '{0}'")]
    InvalidCategory(String),

    #[error("flashcard not found: {0}")]
    FlashcardNotFound(i64),

    #[error("subject not found: {0}")]
    SubjectNotFound(String),

    #[error("invalid flashcard batch: {0}")]
    InvalidFlashcards(String),

    #[error("corrupted simulated date in app_state: '{0}'")]
    CorruptedClock(String),

    #[error("database connection lock poisoned")]
    LockPoisoned,
}

impl StudyError {
    /// HTTP-equivalent status for callers exposing the library over a transport.
    pub fn status_code(&self) -> u16 {
        match self {
            StudyError::MissingField(_)
            | StudyError::InvalidQuality(_)
            | StudyError::InvalidCategory(_)
            | StudyError::InvalidFlashcards(_) => 400,
            StudyError::FlashcardNotFound(_) | StudyError::SubjectNotFound(_) => 404,
            _ => 500,
        }
    }
}

pub type Result<T> = std::result::Result<T, StudyError>;
