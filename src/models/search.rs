//! Matches of a free-text search over subjects and flashcards
use super::{Flashcard, Subject};
use serde::{Deserialize, Serialize};

/// Upper bound on matches returned per kind.
pub const SEARCH_LIMIT: usize = 10;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    pub subjects: Vec<Subject>,
    pub flashcards: Vec<Flashcard>,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty() && self.flashcards.is_empty()
    }
}
