//! Review statistics for dashboards and the calendar view.
//!
//! Every function here is a pure aggregation over flashcards; the caller
//! decides what "today" is. Dates are UTC calendar dates.

use super::{Category, Flashcard, Quality, review_state::is_due};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Estimated minutes spent per reviewed card
const MINUTES_PER_REVIEWED_CARD: f64 = 0.5;
const UPCOMING_WINDOW_DAYS: i64 = 7;
const ACTIVITY_WINDOW_DAYS: usize = 7;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    pub total: usize,
    /// Cards reviewed at least once
    pub reviewed: usize,
    pub due_today: usize,
}

impl ReviewStats {
    pub fn from_cards<'a>(cards: impl IntoIterator<Item = &'a Flashcard>, today: NaiveDate) -> Self {
        cards.into_iter().fold(Self::default(), |mut stats, card| {
            stats.total += 1;
            if card.review.times_reviewed > 0 {
                stats.reviewed += 1;
            }
            if is_due(card.review.next_review_at, today) {
                stats.due_today += 1;
            }
            stats
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyBreakdown {
    pub easy: usize,
    pub medium: usize,
    pub hard: usize,
}

impl DifficultyBreakdown {
    pub fn add(&mut self, difficulty: Quality) {
        match difficulty {
            Quality::Easy => self.easy += 1,
            Quality::Medium => self.medium += 1,
            Quality::Hard => self.hard += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.easy + self.medium + self.hard
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayActivity {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub by_difficulty: DifficultyBreakdown,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpcomingReviews {
    pub date: NaiveDate,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub subjects: usize,
    #[serde(flatten)]
    pub flashcards: ReviewStats,
    pub by_difficulty: DifficultyBreakdown,
    pub by_category: BTreeMap<Category, usize>,
    pub study_streak: u32,
    pub last_study_date: Option<DateTime<Utc>>,
    pub study_time_minutes: u64,
    pub weekly_activity: Vec<DayActivity>,
    pub upcoming_reviews: Vec<UpcomingReviews>,
}

impl DashboardStats {
    pub fn build(subjects: usize, cards: &[Flashcard], today: NaiveDate) -> Self {
        let flashcards = ReviewStats::from_cards(cards, today);

        let mut by_difficulty = DifficultyBreakdown::default();
        let mut by_category: BTreeMap<Category, usize> =
            Category::ALL.iter().map(|&c| (c, 0)).collect();
        for card in cards {
            by_difficulty.add(card.difficulty);
            *by_category.entry(card.category).or_default() += 1;
        }

        Self {
            subjects,
            flashcards,
            by_difficulty,
            by_category,
            study_streak: study_streak(cards, today),
            last_study_date: cards.iter().filter_map(|c| c.review.last_reviewed_at).max(),
            study_time_minutes: (flashcards.reviewed as f64 * MINUTES_PER_REVIEWED_CARD).round()
                as u64,
            weekly_activity: weekly_activity(cards, today),
            upcoming_reviews: upcoming_reviews(cards, today),
        }
    }
}

/// Consecutive study days ending at the most recent review date.
///
/// The streak is broken (zero) when the last review is older than yesterday.
pub fn study_streak(cards: &[Flashcard], today: NaiveDate) -> u32 {
    let dates: BTreeSet<NaiveDate> = cards
        .iter()
        .filter_map(|c| c.review.last_reviewed_at)
        .map(|at| at.date_naive())
        .collect();

    let Some(&latest) = dates.iter().next_back() else {
        return 0;
    };
    if (today - latest).num_days() > 1 {
        return 0;
    }

    let mut streak = 0;
    let mut expected = latest;
    for &date in dates.iter().rev() {
        if date != expected {
            break;
        }
        streak += 1;
        expected = expected - Duration::days(1);
    }
    streak
}

/// Reviews per day over the last week, oldest day first, ending today.
///
/// Each card counts once, on the day of its latest review.
pub fn weekly_activity(cards: &[Flashcard], today: NaiveDate) -> Vec<DayActivity> {
    let mut activity: Vec<DayActivity> = (0..ACTIVITY_WINDOW_DAYS)
        .rev()
        .map(|offset| DayActivity {
            date: today - Duration::days(offset as i64),
            by_difficulty: DifficultyBreakdown::default(),
            total: 0,
        })
        .collect();

    for card in cards {
        let Some(at) = card.review.last_reviewed_at else {
            continue;
        };
        let days_ago = (today - at.date_naive()).num_days();
        if (0..ACTIVITY_WINDOW_DAYS as i64).contains(&days_ago) {
            let day = &mut activity[ACTIVITY_WINDOW_DAYS - 1 - days_ago as usize];
            day.total += 1;
            day.by_difficulty.add(card.difficulty);
        }
    }

    activity
}

/// Number of cards scheduled on each day from today to a week ahead.
pub fn upcoming_reviews(cards: &[Flashcard], today: NaiveDate) -> Vec<UpcomingReviews> {
    let mut by_date: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for card in cards {
        let Some(at) = card.review.next_review_at else {
            continue;
        };
        let date = at.date_naive();
        if (0..=UPCOMING_WINDOW_DAYS).contains(&(date - today).num_days()) {
            *by_date.entry(date).or_default() += 1;
        }
    }

    by_date
        .into_iter()
        .take(UPCOMING_WINDOW_DAYS as usize)
        .map(|(date, count)| UpcomingReviews { date, count })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    /// Cards last reviewed on this day
    pub reviewed: usize,
    /// Cards scheduled for this day
    pub pending: usize,
}

/// One entry per day of the given month. `None` for an invalid year/month.
pub fn calendar_month(cards: &[Flashcard], year: i32, month: u32) -> Option<Vec<CalendarDay>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let mut days: Vec<CalendarDay> = first
        .iter_days()
        .take_while(|d| d.month() == month)
        .map(|date| CalendarDay {
            date,
            reviewed: 0,
            pending: 0,
        })
        .collect();

    let index = |at: DateTime<Utc>| {
        let date = at.date_naive();
        (date.year() == year && date.month() == month).then(|| date.day0() as usize)
    };

    for card in cards {
        if let Some(i) = card.review.last_reviewed_at.and_then(index) {
            days[i].reviewed += 1;
        }
        if let Some(i) = card.review.next_review_at.and_then(index) {
            days[i].pending += 1;
        }
    }

    Some(days)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReviewState;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn card(
        times_reviewed: u32,
        last: Option<DateTime<Utc>>,
        next: Option<DateTime<Utc>>,
    ) -> Flashcard {
        Flashcard {
            id: 1,
            subject_id: 1,
            document_id: None,
            front: "front".to_string(),
            back: "back".to_string(),
            category: Category::Concept,
            difficulty: Quality::Medium,
            review: ReviewState {
                times_reviewed,
                ease_factor: Some(2.5),
                last_reviewed_at: last,
                next_review_at: next,
            },
            created_at: at(2025, 1, 1, 0),
        }
    }

    #[test]
    fn test_review_stats() {
        let today = date(2025, 6, 10);
        let cards = vec![
            card(0, None, None),
            card(2, Some(at(2025, 6, 9, 8)), Some(at(2025, 6, 10, 23))),
            card(1, Some(at(2025, 6, 9, 8)), Some(at(2025, 6, 12, 8))),
            card(3, Some(at(2025, 6, 1, 8)), Some(at(2025, 6, 4, 8))),
        ];

        let stats = ReviewStats::from_cards(&cards, today);
        assert_eq!(
            stats,
            ReviewStats {
                total: 4,
                reviewed: 3,
                due_today: 3
            }
        );
    }

    #[test]
    fn test_review_stats_json_shape() {
        let stats = ReviewStats {
            total: 2,
            reviewed: 1,
            due_today: 1,
        };
        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json, serde_json::json!({"total": 2, "reviewed": 1, "dueToday": 1}));
    }

    #[test]
    fn test_streak_counts_consecutive_days() {
        let today = date(2025, 6, 10);
        let cards = vec![
            card(1, Some(at(2025, 6, 10, 9)), None),
            card(1, Some(at(2025, 6, 10, 18)), None),
            card(1, Some(at(2025, 6, 9, 9)), None),
            card(1, Some(at(2025, 6, 8, 9)), None),
            card(1, Some(at(2025, 6, 5, 9)), None),
        ];
        assert_eq!(study_streak(&cards, today), 3);
    }

    #[test]
    fn test_streak_survives_until_end_of_next_day() {
        let cards = vec![
            card(1, Some(at(2025, 6, 9, 9)), None),
            card(1, Some(at(2025, 6, 8, 9)), None),
        ];
        assert_eq!(study_streak(&cards, date(2025, 6, 10)), 2);
        assert_eq!(study_streak(&cards, date(2025, 6, 11)), 0);
    }

    #[test]
    fn test_streak_without_reviews() {
        assert_eq!(study_streak(&[card(0, None, None)], date(2025, 6, 10)), 0);
    }

    #[test]
    fn test_weekly_activity() {
        let today = date(2025, 6, 10);
        let mut easy = card(1, Some(at(2025, 6, 10, 9)), None);
        easy.difficulty = Quality::Easy;
        let cards = vec![
            easy,
            card(1, Some(at(2025, 6, 4, 9)), None),
            card(1, Some(at(2025, 6, 3, 9)), None),
        ];

        let activity = weekly_activity(&cards, today);
        assert_eq!(activity.len(), 7);
        assert_eq!(activity[0].date, date(2025, 6, 4));
        assert_eq!(activity[0].total, 1);
        assert_eq!(activity[6].date, today);
        assert_eq!(activity[6].by_difficulty.easy, 1);
        assert_eq!(activity.iter().map(|d| d.total).sum::<usize>(), 2);
    }

    #[test]
    fn test_upcoming_reviews() {
        let today = date(2025, 6, 10);
        let cards = vec![
            card(1, None, Some(at(2025, 6, 12, 9))),
            card(1, None, Some(at(2025, 6, 12, 20))),
            card(1, None, Some(at(2025, 6, 10, 9))),
            card(1, None, Some(at(2025, 6, 17, 9))),
            card(1, None, Some(at(2025, 6, 18, 9))),
            card(1, None, Some(at(2025, 6, 9, 9))),
            card(0, None, None),
        ];

        let upcoming = upcoming_reviews(&cards, today);
        assert_eq!(
            upcoming,
            vec![
                UpcomingReviews { date: date(2025, 6, 10), count: 1 },
                UpcomingReviews { date: date(2025, 6, 12), count: 2 },
                UpcomingReviews { date: date(2025, 6, 17), count: 1 },
            ]
        );
    }

    #[test]
    fn test_dashboard() {
        let today = date(2025, 6, 10);
        let mut definition = card(2, Some(at(2025, 6, 10, 9)), Some(at(2025, 6, 13, 9)));
        definition.category = Category::Definition;
        definition.difficulty = Quality::Hard;
        let cards = vec![definition, card(1, Some(at(2025, 6, 9, 9)), None), card(0, None, None)];

        let stats = DashboardStats::build(2, &cards, today);
        assert_eq!(stats.subjects, 2);
        assert_eq!(stats.flashcards.total, 3);
        assert_eq!(stats.flashcards.reviewed, 2);
        assert_eq!(stats.flashcards.due_today, 2);
        assert_eq!(stats.by_difficulty.hard, 1);
        assert_eq!(stats.by_difficulty.medium, 2);
        assert_eq!(stats.by_category[&Category::Definition], 1);
        assert_eq!(stats.by_category[&Category::Formula], 0);
        assert_eq!(stats.study_streak, 2);
        assert_eq!(stats.last_study_date, Some(at(2025, 6, 10, 9)));
        assert_eq!(stats.study_time_minutes, 1);
        assert_eq!(stats.upcoming_reviews.len(), 1);
    }

    #[test]
    fn test_calendar_month() {
        let cards = vec![
            card(1, Some(at(2025, 2, 3, 9)), Some(at(2025, 2, 6, 9))),
            card(1, Some(at(2025, 1, 31, 9)), Some(at(2025, 2, 3, 9))),
            card(1, Some(at(2025, 2, 27, 9)), Some(at(2025, 3, 2, 9))),
        ];

        let days = calendar_month(&cards, 2025, 2).unwrap();
        assert_eq!(days.len(), 28);
        assert_eq!(days[0].date, date(2025, 2, 1));
        assert_eq!(days[2].reviewed, 1);
        assert_eq!(days[2].pending, 1);
        assert_eq!(days[5].pending, 1);
        assert_eq!(days[26].reviewed, 1);
        assert_eq!(days.iter().map(|d| d.pending).sum::<usize>(), 2);
    }

    #[test]
    fn test_calendar_invalid_month() {
        assert!(calendar_month(&[], 2025, 13).is_none());
    }
}
