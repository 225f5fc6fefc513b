//! Wrapper for flashcards that tracks progress within a study session.
use super::{Flashcard, Quality};

#[derive(Clone, Debug)]
pub struct StudyCard {
    pub flashcard: Flashcard,
    /// Graded medium or easy in this session
    pub is_passed: bool,
}

impl StudyCard {
    pub fn new(flashcard: Flashcard) -> Self {
        Self {
            flashcard,
            is_passed: false,
        }
    }

    /// Records a grade. Hard cards stay in the session.
    pub fn mark_graded(&mut self, quality: Quality, updated: Flashcard) {
        self.is_passed = quality != Quality::Hard;
        self.flashcard = updated;
    }
}
