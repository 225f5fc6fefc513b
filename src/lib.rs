pub mod api;
pub mod config;
pub mod database;
pub mod error;
pub mod export;
pub mod models;

pub use error::{Result, StudyError};
pub use models::{Flashcard, NewFlashcard, Quality, ReviewState, StudySession, Subject};
