//! Study session over a subject's due flashcards.
//! Cards graded hard are scheduled for the same day, so they are shown again
//! in another round until every card has been graded medium or easy.

use super::{Quality, ReviewOutcome, StudyCard};
use crate::database::db;
use crate::error::{Result, StudyError};
use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// Number of reviews per grade in a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionResults {
    pub easy: usize,
    pub medium: usize,
    pub hard: usize,
}

impl SessionResults {
    fn record(&mut self, quality: Quality) {
        match quality {
            Quality::Easy => self.easy += 1,
            Quality::Medium => self.medium += 1,
            Quality::Hard => self.hard += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.easy + self.medium + self.hard
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub results: SessionResults,
    pub rounds: usize,
    pub duration_minutes: i64,
}

/// Manages a study session with multiple rounds.
pub struct StudySession {
    pub subject_id: i64,
    pub cards: Vec<StudyCard>,
    pub current_round_cards: Vec<usize>,
    pub current_index: usize,
    pub show_back: bool,
    pub conn: Arc<Mutex<Connection>>,
    pub round_number: usize,
    pub results: SessionResults,
    pub started_at: DateTime<Utc>,
}

impl StudySession {
    /// Creates a session from the subject's cards due on `started_at`'s date.
    pub fn start<R: Rng + ?Sized>(
        subject_id: i64,
        conn: Arc<Mutex<Connection>>,
        started_at: DateTime<Utc>,
        rng: Option<&mut R>,
    ) -> Result<Self> {
        let today: NaiveDate = started_at.date_naive();
        let mut due = {
            let guard = conn.lock().map_err(|_| StudyError::LockPoisoned)?;
            db::get_due_flashcards(Some(subject_id), today, &guard)?
        };

        if let Some(rng) = rng {
            due.shuffle(rng);
        }

        log::info!("study session for subject {}: {} due cards", subject_id, due.len());

        let cards: Vec<StudyCard> = due.into_iter().map(StudyCard::new).collect();
        let indices: Vec<usize> = (0..cards.len()).collect();

        Ok(Self {
            subject_id,
            cards,
            current_round_cards: indices,
            current_index: 0,
            show_back: false,
            conn,
            round_number: 1,
            results: SessionResults::default(),
            started_at,
        })
    }

    pub fn current_card(&self) -> Option<&StudyCard> {
        if self.is_completed() {
            return None;
        }
        self.current_round_cards
            .get(self.current_index)
            .and_then(|&idx| self.cards.get(idx))
    }

    pub fn toggle_back(&mut self) {
        self.show_back = !self.show_back;
    }

    /// Grades the current card, persists the new schedule and moves on.
    ///
    /// Returns `None` when there is no card left to grade.
    pub fn grade_current_card(
        &mut self,
        quality: Quality,
        now: DateTime<Utc>,
    ) -> Result<Option<ReviewOutcome>> {
        if self.is_completed() {
            return Ok(None);
        }
        let Some(&idx) = self.current_round_cards.get(self.current_index) else {
            return Ok(None);
        };
        let Some(card) = self.cards.get_mut(idx) else {
            return Ok(None);
        };

        let (updated, outcome) = {
            let mut conn = self.conn.lock().map_err(|_| StudyError::LockPoisoned)?;
            db::record_review(card.flashcard.id, quality, now, &mut conn)?
        };

        card.mark_graded(quality, updated);
        self.results.record(quality);
        self.next_card();

        Ok(Some(outcome))
    }

    fn next_card(&mut self) {
        self.show_back = false;
        if self.current_index + 1 < self.current_round_cards.len() {
            self.current_index += 1;
        } else {
            self.start_next_round();
        }
    }

    /// Starts a new round with the cards graded hard in this one.
    /// If none remain, the session is complete.
    fn start_next_round(&mut self) {
        let retry: Vec<usize> = self
            .current_round_cards
            .iter()
            .copied()
            .filter(|&idx| self.cards.get(idx).is_some_and(|card| !card.is_passed))
            .collect();

        self.current_round_cards = retry;
        self.current_index = 0;
        if !self.current_round_cards.is_empty() {
            self.round_number += 1;
            log::debug!(
                "round {}: {} cards to retry",
                self.round_number,
                self.current_round_cards.len()
            );
        }
    }

    pub fn total_count(&self) -> usize {
        self.current_round_cards.len()
    }

    /// Cards of the current round still waiting for a grade
    pub fn remaining_count(&self) -> usize {
        self.total_count().saturating_sub(self.current_index)
    }

    pub fn is_completed(&self) -> bool {
        self.current_round_cards.is_empty()
    }

    pub fn phase_message(&self) -> String {
        if self.round_number == 1 {
            format!("Round {}: {} cards", self.round_number, self.total_count())
        } else {
            format!(
                "Round {} (retry): {} cards",
                self.round_number,
                self.total_count()
            )
        }
    }

    pub fn summary(&self, now: DateTime<Utc>) -> SessionSummary {
        SessionSummary {
            results: self.results,
            rounds: self.round_number,
            duration_minutes: (now - self.started_at).num_minutes().max(0),
        }
    }
}
