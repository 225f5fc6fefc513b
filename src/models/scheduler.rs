//! Simplified SM-2 review scheduler.
//!
//! A review is graded `hard`, `medium` or `easy`; each grade maps to a fixed
//! branch rather than to a continuous function of a numeric score:
//! - hard: repeat in the same session, ease factor -0.2
//! - medium: 1 day on the first review, 3 days afterwards, ease factor -0.15
//! - easy: 4 days, then 7 days, then (reviews + 1) * ease factor, ease factor +0.1
//!
//! The ease factor always stays within [1.3, 2.5]. For the last easy branch the
//! interval is computed from the ease factor *before* it is raised, and it is
//! capped at [`MAX_INTERVAL_DAYS`].

use super::ReviewState;
use crate::error::StudyError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_EASE_FACTOR: f64 = 2.5;
pub const MIN_EASE_FACTOR: f64 = 1.3;
pub const MAX_EASE_FACTOR: f64 = 2.5;
/// Longest interval the scheduler hands out (about 100 years).
pub const MAX_INTERVAL_DAYS: u32 = 36_500;

const HARD_PENALTY: f64 = 0.2;
const MEDIUM_PENALTY: f64 = 0.15;
const EASY_BONUS: f64 = 0.1;

/// Self-reported recall difficulty of a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Hard,
    #[default]
    Medium,
    Easy,
}

impl Quality {
    pub const ALL: [Quality; 3] = [Quality::Hard, Quality::Medium, Quality::Easy];

    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::Hard => "hard",
            Quality::Medium => "medium",
            Quality::Easy => "easy",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Quality {
    type Err = StudyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hard" => Ok(Quality::Hard),
            "medium" => Ok(Quality::Medium),
            "easy" => Ok(Quality::Easy),
            _ => Err(StudyError::InvalidQuality(s.to_string())),
        }
    }
}

/// Result of scheduling one review.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewOutcome {
    pub ease_factor: f64,
    pub next_review_at: DateTime<Utc>,
    pub interval_days: u32,
}

/// Normalizes a stored ease factor: absent, zero and NaN mean a new card,
/// anything else is clamped into the valid band.
fn effective_ease_factor(current: Option<f64>) -> f64 {
    match current {
        Some(ef) if ef != 0.0 && !ef.is_nan() => ef.clamp(MIN_EASE_FACTOR, MAX_EASE_FACTOR),
        _ => DEFAULT_EASE_FACTOR,
    }
}

/// Decides when a card is next shown and how its ease factor moves.
///
/// `times_reviewed` is the number of reviews completed before this one.
pub fn compute_next_review(
    quality: Quality,
    times_reviewed: u32,
    current_ease_factor: Option<f64>,
    now: DateTime<Utc>,
) -> ReviewOutcome {
    let ease_factor = effective_ease_factor(current_ease_factor);

    let (interval_days, new_ease_factor) = match quality {
        Quality::Hard => (0, (ease_factor - HARD_PENALTY).max(MIN_EASE_FACTOR)),
        Quality::Medium => {
            let interval = if times_reviewed == 0 { 1 } else { 3 };
            (interval, (ease_factor - MEDIUM_PENALTY).max(MIN_EASE_FACTOR))
        }
        Quality::Easy => {
            let interval = match times_reviewed {
                0 => 4,
                1 => 7,
                n => ((f64::from(n) + 1.0) * ease_factor)
                    .round()
                    .min(f64::from(MAX_INTERVAL_DAYS)) as u32,
            };
            (interval, (ease_factor + EASY_BONUS).min(MAX_EASE_FACTOR))
        }
    };

    // Only a `now` near the end of chrono's range can overflow here
    let next_review_at = now
        .checked_add_signed(Duration::days(i64::from(interval_days)))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);

    ReviewOutcome {
        ease_factor: new_ease_factor,
        next_review_at,
        interval_days,
    }
}

/// Applies a review to a card's state: schedules it, counts the review and
/// stamps `last_reviewed_at`.
pub fn apply_review(
    state: &ReviewState,
    quality: Quality,
    now: DateTime<Utc>,
) -> (ReviewState, ReviewOutcome) {
    let outcome = compute_next_review(quality, state.times_reviewed, state.ease_factor, now);

    let new_state = ReviewState {
        times_reviewed: state.times_reviewed.saturating_add(1),
        ease_factor: Some(outcome.ease_factor),
        last_reviewed_at: Some(now),
        next_review_at: Some(outcome.next_review_at),
    };

    (new_state, outcome)
}

/// User-facing summary of an interval.
pub fn review_message(interval_days: u32) -> String {
    match interval_days {
        0 => "Review this card again soon".to_string(),
        1 => "Next review in 1 day".to_string(),
        n => format!("Next review in {} days", n),
    }
}
