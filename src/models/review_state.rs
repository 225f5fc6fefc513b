use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Review statistics of a single flashcard.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewState {
    pub times_reviewed: u32,
    /// `None` for cards stored before an ease factor was assigned
    pub ease_factor: Option<f64>,
    pub last_reviewed_at: Option<DateTime<Utc>>,
    pub next_review_at: Option<DateTime<Utc>>,
}

impl ReviewState {
    /// State of a freshly created card.
    pub fn new() -> Self {
        Self {
            times_reviewed: 0,
            ease_factor: Some(super::scheduler::DEFAULT_EASE_FACTOR),
            last_reviewed_at: None,
            next_review_at: None,
        }
    }

    pub fn is_due(&self, today: NaiveDate) -> bool {
        is_due(self.next_review_at, today)
    }
}

/// A card is due when it was never scheduled or its review date is today or
/// earlier. Time of day is ignored.
pub fn is_due(next_review_at: Option<DateTime<Utc>>, today: NaiveDate) -> bool {
    match next_review_at {
        None => true,
        Some(at) => at.date_naive() <= today,
    }
}
