//! Review endpoint: validates a grading request, schedules the card and
//! writes the result back. Also the read-only review statistics endpoint.
//!
//! Request and response bodies are serde types shaped like the JSON the web
//! front end exchanges; the transport itself is left to the caller.

use crate::database::db;
use crate::error::{Result, StudyError};
use crate::models::scheduler::review_message;
use crate::models::{Flashcard, Quality, ReviewStats};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    pub flashcard_id: Option<i64>,
    pub quality: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponse {
    pub success: bool,
    pub flashcard: Flashcard,
    pub next_review_in: u32,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl From<&StudyError> for ErrorResponse {
    fn from(err: &StudyError) -> Self {
        Self {
            error: err.to_string(),
        }
    }
}

/// Checks that both fields are present and the quality is known.
pub fn validate(request: &ReviewRequest) -> Result<(i64, Quality)> {
    let id = request
        .flashcard_id
        .ok_or(StudyError::MissingField("flashcardId"))?;
    let quality = request
        .quality
        .as_deref()
        .filter(|q| !q.is_empty())
        .ok_or(StudyError::MissingField("quality"))?
        .parse::<Quality>()?;
    Ok((id, quality))
}

pub fn handle_review(
    request: &ReviewRequest,
    now: DateTime<Utc>,
    conn: &mut Connection,
) -> Result<ReviewResponse> {
    let (id, quality) = validate(request).inspect_err(|e| {
        log::warn!("rejected review request {:?}: {}", request, e);
    })?;

    let (flashcard, outcome) = db::record_review(id, quality, now, conn)?;
    log::info!(
        "flashcard {} graded {}, next review in {} days",
        id,
        quality,
        outcome.interval_days
    );

    Ok(ReviewResponse {
        success: true,
        flashcard,
        next_review_in: outcome.interval_days,
        message: review_message(outcome.interval_days),
    })
}

pub fn handle_stats(now: DateTime<Utc>, conn: &Connection) -> Result<ReviewStats> {
    let cards = db::get_all_flashcards(None, conn)?;
    Ok(ReviewStats::from_cards(&cards, now.date_naive()))
}
