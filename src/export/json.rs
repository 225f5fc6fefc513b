//! JSON import/export of flashcard batches.
//! The format is the one produced by the flashcard generator:
//! `{ "flashcards": [ { "front", "back", "category", "difficulty" } ] }`.

use crate::error::{Result, StudyError};
use crate::models::{Flashcard, NewFlashcard};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Serialize, Deserialize)]
pub struct FlashcardBatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub flashcards: Vec<NewFlashcard>,
}

/// Parses a generated batch. Missing fields take their defaults; a missing or
/// malformed `flashcards` array is rejected.
pub fn parse_generated_flashcards(text: &str) -> Result<Vec<NewFlashcard>> {
    let value: serde_json::Value = serde_json::from_str(text)?;

    match value.get("flashcards") {
        Some(serde_json::Value::Array(_)) => {}
        Some(_) => {
            return Err(StudyError::InvalidFlashcards(
                "\"flashcards\" must be an array".to_string(),
            ));
        }
        None => {
            return Err(StudyError::InvalidFlashcards(
                "missing \"flashcards\" array".to_string(),
            ));
        }
    }

    let batch: FlashcardBatch = serde_json::from_value(value)
        .map_err(|e| StudyError::InvalidFlashcards(e.to_string()))?;
    Ok(batch.flashcards)
}

/// Imports a flashcard batch from a JSON file.
pub fn import_json(path: &Path) -> Result<Vec<NewFlashcard>> {
    let contents = fs::read_to_string(path)?;
    let cards = parse_generated_flashcards(&contents)?;
    log::info!("read {} flashcards from '{}'", cards.len(), path.display());
    Ok(cards)
}

/// Exports a subject's flashcards to a JSON file in the import format.
pub fn export_json_to_path(subject_name: &str, cards: &[Flashcard], path: &Path) -> Result<()> {
    let batch = FlashcardBatch {
        subject: Some(subject_name.to_string()),
        flashcards: cards.iter().map(Flashcard::to_new).collect(),
    };
    let json_string = serde_json::to_string_pretty(&batch)?;
    fs::write(path, json_string)?;
    log::info!(
        "exported {} flashcards of '{}' to '{}'",
        cards.len(),
        subject_name,
        path.display()
    );
    Ok(())
}
