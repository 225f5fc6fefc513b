//! Flashcard is a question (front) and answer (back) belonging to a subject,
//! together with its review state.
use super::{Quality, ReviewState};
use crate::error::StudyError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Difficulty label assigned when the card is created. Uses the same values
/// as review quality.
pub type Difficulty = Quality;

/// Kind of knowledge a card tests. The generator emits Spanish labels, which
/// are accepted as aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    #[serde(alias = "concepto")]
    Concept,
    #[serde(alias = "definicion")]
    Definition,
    #[serde(alias = "problema")]
    Problem,
    Formula,
    #[serde(alias = "proceso")]
    Process,
    #[serde(alias = "comparacion")]
    Comparison,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Concept,
        Category::Definition,
        Category::Problem,
        Category::Formula,
        Category::Process,
        Category::Comparison,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Concept => "concept",
            Category::Definition => "definition",
            Category::Problem => "problem",
            Category::Formula => "formula",
            Category::Process => "process",
            Category::Comparison => "comparison",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = StudyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "concept" | "concepto" => Ok(Category::Concept),
            "definition" | "definicion" => Ok(Category::Definition),
            "problem" | "problema" => Ok(Category::Problem),
            "formula" => Ok(Category::Formula),
            "process" | "proceso" => Ok(Category::Process),
            "comparison" | "comparacion" => Ok(Category::Comparison),
            _ => Err(StudyError::InvalidCategory(s.to_string())),
        }
    }
}

/// Content of a card that has not been stored yet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewFlashcard {
    #[serde(default)]
    pub front: String,
    #[serde(default)]
    pub back: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<i64>,
}

impl NewFlashcard {
    pub fn new(front: impl Into<String>, back: impl Into<String>) -> Self {
        Self {
            front: front.into(),
            back: back.into(),
            category: Category::default(),
            difficulty: Difficulty::default(),
            document_id: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flashcard {
    pub id: i64,
    pub subject_id: i64,
    pub document_id: Option<i64>,
    pub front: String,
    pub back: String,
    pub category: Category,
    pub difficulty: Difficulty,
    #[serde(flatten)]
    pub review: ReviewState,
    pub created_at: DateTime<Utc>,
}

impl Flashcard {
    pub fn to_new(&self) -> NewFlashcard {
        NewFlashcard {
            front: self.front.clone(),
            back: self.back.clone(),
            category: self.category,
            difficulty: self.difficulty,
            document_id: self.document_id,
        }
    }
}
