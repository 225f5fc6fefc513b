//! Database operations for the study assistant
//!
//! Handles SQLite schema setup, the application clock, CRUD for subjects and
//! flashcards, and writing review results back to flashcard rows.

use crate::config::ClockMode;
use crate::error::{Result, StudyError};
use crate::models::{
    Category, Difficulty, Flashcard, NewFlashcard, Quality, ReviewOutcome, ReviewState,
    SearchResults, Subject, scheduler, search,
};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};
use std::path::Path;

const FLASHCARD_COLUMNS: &str = "id, subject_id, document_id, front, back, category, difficulty,
     times_reviewed, ease_factor, last_reviewed_at, next_review_at, created_at";

/// Opens (creating if needed) the database file and its tables.
pub fn init_database(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let conn = Connection::open(path)?;
    init_schema(&conn)?;
    log::debug!("opened database at {}", path.display());
    Ok(conn)
}

/// Creates tables for subjects, flashcards and app state.
///
/// Seeds the simulated clock with the current time if not already set.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS subjects (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            color TEXT
        )",
        (),
    )?;

    // Review state lives on the flashcard row itself
    conn.execute(
        "CREATE TABLE IF NOT EXISTS flashcards (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            subject_id INTEGER NOT NULL,
            document_id INTEGER,
            front TEXT NOT NULL,
            back TEXT NOT NULL,
            category TEXT NOT NULL DEFAULT 'concept',
            difficulty TEXT NOT NULL DEFAULT 'medium',
            times_reviewed INTEGER NOT NULL DEFAULT 0,
            ease_factor REAL DEFAULT 2.5,
            last_reviewed_at INTEGER,
            next_review_at INTEGER,
            created_at INTEGER NOT NULL,
            FOREIGN KEY (subject_id) REFERENCES subjects(id) ON DELETE CASCADE
        )",
        (),
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_flashcards_next_review
         ON flashcards (subject_id, next_review_at)",
        (),
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS app_state (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        (),
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO app_state (key, value) VALUES ('current_date', ?1)",
        params![Utc::now().timestamp().to_string()],
    )?;

    Ok(())
}

fn to_timestamp(at: DateTime<Utc>) -> i64 {
    at.timestamp()
}

fn from_timestamp(secs: i64, column: usize) -> rusqlite::Result<DateTime<Utc>> {
    Utc.timestamp_opt(secs, 0).single().ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            column,
            Type::Integer,
            format!("timestamp out of range: {secs}").into(),
        )
    })
}

fn optional_timestamp(row: &Row<'_>, column: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    row.get::<_, Option<i64>>(column)?
        .map(|secs| from_timestamp(secs, column))
        .transpose()
}

fn parse_column<T>(row: &Row<'_>, column: usize) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = StudyError>,
{
    let text: String = row.get(column)?;
    text.parse()
        .map_err(|e: StudyError| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e)))
}

fn flashcard_from_row(row: &Row<'_>) -> rusqlite::Result<Flashcard> {
    let category: Category = parse_column(row, 5)?;
    let difficulty: Difficulty = parse_column(row, 6)?;

    Ok(Flashcard {
        id: row.get(0)?,
        subject_id: row.get(1)?,
        document_id: row.get(2)?,
        front: row.get(3)?,
        back: row.get(4)?,
        category,
        difficulty,
        review: ReviewState {
            times_reviewed: row.get(7)?,
            ease_factor: row.get(8)?,
            last_reviewed_at: optional_timestamp(row, 9)?,
            next_review_at: optional_timestamp(row, 10)?,
        },
        created_at: from_timestamp(row.get(11)?, 11)?,
    })
}

/// First instant of the day after `date`, as a Unix timestamp.
fn end_of_day_exclusive(date: NaiveDate) -> i64 {
    let next = date + Duration::days(1);
    next.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or(i64::MAX)
}

fn start_of_day(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or(i64::MIN)
}

/// Retrieves the simulated date from the database
pub fn get_current_date(conn: &Connection) -> Result<DateTime<Utc>> {
    let timestamp: String = conn.query_row(
        "SELECT value FROM app_state WHERE key = 'current_date'",
        [],
        |row| row.get(0),
    )?;

    let parsed = timestamp.trim().parse::<i64>();
    let secs = match parsed {
        Ok(secs) => secs,
        Err(_) => {
            log::error!("app_state current_date is not a timestamp: '{}'", timestamp);
            return Err(StudyError::CorruptedClock(timestamp));
        }
    };
    from_timestamp(secs, 0).map_err(|_| StudyError::CorruptedClock(timestamp))
}

/// Advances the simulated date by 24 hours
pub fn advance_day(conn: &Connection) -> Result<DateTime<Utc>> {
    let current = get_current_date(conn)?;
    let next_day = current
        .checked_add_signed(Duration::days(1))
        .ok_or_else(|| StudyError::CorruptedClock(to_timestamp(current).to_string()))?;

    conn.execute(
        "UPDATE app_state SET value = ?1 WHERE key = 'current_date'",
        params![to_timestamp(next_day).to_string()],
    )?;

    log::info!("simulated date advanced to {}", next_day.date_naive());
    Ok(next_day)
}

/// "Now" according to the configured clock
pub fn current_time(conn: &Connection, mode: ClockMode) -> Result<DateTime<Utc>> {
    match mode {
        ClockMode::System => Ok(Utc::now()),
        ClockMode::Simulated => get_current_date(conn),
    }
}

/// Creates a new subject and returns its ID
pub fn new_subject(name: &str, color: Option<&str>, conn: &Connection) -> Result<i64> {
    conn.execute(
        "INSERT INTO subjects (name, color) VALUES (?1, ?2)",
        params![name, color],
    )?;
    let id = conn.last_insert_rowid();
    log::info!("subject '{}' created with id {}", name, id);
    Ok(id)
}

fn subject_from_row(row: &Row<'_>) -> rusqlite::Result<Subject> {
    Ok(Subject {
        id: row.get(0)?,
        name: row.get(1)?,
        color: row.get(2)?,
    })
}

pub fn get_all_subjects(conn: &Connection) -> Result<Vec<Subject>> {
    let mut stmt = conn.prepare("SELECT id, name, color FROM subjects ORDER BY name")?;
    let subjects = stmt
        .query_map([], subject_from_row)?
        .collect::<rusqlite::Result<Vec<Subject>>>()?;
    Ok(subjects)
}

/// Looks a subject up by name, case-insensitively
pub fn find_subject_by_name(name: &str, conn: &Connection) -> Result<Subject> {
    conn.query_row(
        "SELECT id, name, color FROM subjects WHERE name = ?1 COLLATE NOCASE",
        params![name],
        subject_from_row,
    )
    .optional()?
    .ok_or_else(|| StudyError::SubjectNotFound(name.to_string()))
}

pub fn count_subjects(conn: &Connection) -> Result<usize> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM subjects", [], |row| row.get(0))?;
    Ok(count as usize)
}

/// Renames a subject and replaces its color
pub fn update_subject(id: i64, name: &str, color: Option<&str>, conn: &Connection) -> Result<()> {
    let updated = conn.execute(
        "UPDATE subjects SET name = ?1, color = ?2 WHERE id = ?3",
        params![name, color, id],
    )?;
    if updated == 0 {
        return Err(StudyError::SubjectNotFound(id.to_string()));
    }
    log::info!("subject {} updated: name '{}'", id, name);
    Ok(())
}

/// Deletes a subject together with all of its flashcards.
///
/// Returns the number of flashcards removed.
pub fn delete_subject(id: i64, conn: &mut Connection) -> Result<usize> {
    let tx = conn.transaction()?;
    // Explicit so the cards go even if foreign keys were switched off
    let cards = tx.execute("DELETE FROM flashcards WHERE subject_id = ?1", params![id])?;
    let deleted = tx.execute("DELETE FROM subjects WHERE id = ?1", params![id])?;
    if deleted == 0 {
        return Err(StudyError::SubjectNotFound(id.to_string()));
    }
    tx.commit()?;

    log::info!("subject {} deleted with {} flashcards", id, cards);
    Ok(cards)
}

/// Adds a flashcard to a subject with the state of a never-reviewed card.
///
/// Returns the flashcard ID.
pub fn add_flashcard(
    subject_id: i64,
    card: &NewFlashcard,
    now: DateTime<Utc>,
    conn: &Connection,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO flashcards
            (subject_id, document_id, front, back, category, difficulty,
             times_reviewed, ease_factor, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7, ?8)",
        params![
            subject_id,
            card.document_id,
            card.front,
            card.back,
            card.category.as_str(),
            card.difficulty.as_str(),
            scheduler::DEFAULT_EASE_FACTOR,
            to_timestamp(now),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Inserts a batch of flashcards atomically and returns their IDs
pub fn add_flashcards(
    subject_id: i64,
    cards: &[NewFlashcard],
    now: DateTime<Utc>,
    conn: &mut Connection,
) -> Result<Vec<i64>> {
    let tx = conn.transaction()?;
    let mut ids = Vec::with_capacity(cards.len());
    for card in cards {
        ids.push(add_flashcard(subject_id, card, now, &tx)?);
    }
    tx.commit()?;

    log::info!("saved {} flashcards to subject {}", ids.len(), subject_id);
    Ok(ids)
}

pub fn delete_flashcard(id: i64, conn: &Connection) -> Result<()> {
    let deleted = conn.execute("DELETE FROM flashcards WHERE id = ?1", params![id])?;
    if deleted == 0 {
        return Err(StudyError::FlashcardNotFound(id));
    }
    log::info!("flashcard {} deleted", id);
    Ok(())
}

pub fn get_flashcard(id: i64, conn: &Connection) -> Result<Flashcard> {
    conn.query_row(
        &format!("SELECT {FLASHCARD_COLUMNS} FROM flashcards WHERE id = ?1"),
        params![id],
        flashcard_from_row,
    )
    .optional()?
    .ok_or(StudyError::FlashcardNotFound(id))
}

/// Retrieves all flashcards of a subject
///
/// Never-scheduled cards come first, then by next review (oldest first).
pub fn get_flashcards_for_subject(subject_id: i64, conn: &Connection) -> Result<Vec<Flashcard>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {FLASHCARD_COLUMNS} FROM flashcards
         WHERE subject_id = ?1
         ORDER BY next_review_at IS NOT NULL, next_review_at ASC, id ASC"
    ))?;

    let flashcards = stmt
        .query_map(params![subject_id], flashcard_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(flashcards)
}

/// Retrieves every flashcard, optionally restricted to one subject
pub fn get_all_flashcards(subject_id: Option<i64>, conn: &Connection) -> Result<Vec<Flashcard>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {FLASHCARD_COLUMNS} FROM flashcards
         WHERE ?1 IS NULL OR subject_id = ?1
         ORDER BY id ASC"
    ))?;

    let flashcards = stmt
        .query_map(params![subject_id], flashcard_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(flashcards)
}

/// Retrieves flashcards due on or before `today`
///
/// A card is due when it was never scheduled or its next review date is not
/// after `today`. Ordered like `get_flashcards_for_subject`.
pub fn get_due_flashcards(
    subject_id: Option<i64>,
    today: NaiveDate,
    conn: &Connection,
) -> Result<Vec<Flashcard>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {FLASHCARD_COLUMNS} FROM flashcards
         WHERE (?1 IS NULL OR subject_id = ?1)
           AND (next_review_at IS NULL OR next_review_at < ?2)
         ORDER BY next_review_at IS NOT NULL, next_review_at ASC, id ASC"
    ))?;

    let flashcards = stmt
        .query_map(params![subject_id, end_of_day_exclusive(today)], flashcard_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(flashcards)
}

/// Retrieves flashcards whose next review falls on `date`
pub fn get_flashcards_scheduled_on(date: NaiveDate, conn: &Connection) -> Result<Vec<Flashcard>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {FLASHCARD_COLUMNS} FROM flashcards
         WHERE next_review_at >= ?1 AND next_review_at < ?2
         ORDER BY next_review_at ASC, id ASC"
    ))?;

    let flashcards = stmt
        .query_map(
            params![start_of_day(date), end_of_day_exclusive(date)],
            flashcard_from_row,
        )?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(flashcards)
}

/// Escapes `%`, `_` and `\` so the query matches literally inside `LIKE`.
fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Case-insensitive substring search over subject names and flashcard text.
///
/// At most [`search::SEARCH_LIMIT`] matches of each kind are returned. A blank
/// query matches nothing.
pub fn search(query: &str, conn: &Connection) -> Result<SearchResults> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(SearchResults::default());
    }
    let pattern = like_pattern(query);
    let limit = search::SEARCH_LIMIT as i64;

    let mut stmt = conn.prepare(
        "SELECT id, name, color FROM subjects
         WHERE name LIKE ?1 ESCAPE '\\'
         ORDER BY name
         LIMIT ?2",
    )?;
    let subjects = stmt
        .query_map(params![pattern, limit], subject_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut stmt = conn.prepare(&format!(
        "SELECT {FLASHCARD_COLUMNS} FROM flashcards
         WHERE front LIKE ?1 ESCAPE '\\' OR back LIKE ?1 ESCAPE '\\'
         ORDER BY id ASC
         LIMIT ?2"
    ))?;
    let flashcards = stmt
        .query_map(params![pattern, limit], flashcard_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    log::debug!(
        "search '{}': {} subjects, {} flashcards",
        query,
        subjects.len(),
        flashcards.len()
    );
    Ok(SearchResults {
        subjects,
        flashcards,
    })
}

/// Schedules a review of one flashcard and writes the result back.
///
/// The read and the write happen in one immediate transaction, so two reviews
/// of the same card cannot both read the old `times_reviewed`.
pub fn record_review(
    id: i64,
    quality: Quality,
    now: DateTime<Utc>,
    conn: &mut Connection,
) -> Result<(Flashcard, ReviewOutcome)> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let mut card = get_flashcard(id, &tx)?;
    let (state, outcome) = scheduler::apply_review(&card.review, quality, now);

    tx.execute(
        "UPDATE flashcards
         SET times_reviewed = ?1, ease_factor = ?2, last_reviewed_at = ?3, next_review_at = ?4
         WHERE id = ?5",
        params![
            state.times_reviewed,
            state.ease_factor,
            state.last_reviewed_at.map(to_timestamp),
            state.next_review_at.map(to_timestamp),
            id
        ],
    )?;
    tx.commit()?;

    log::debug!(
        "flashcard {} reviewed as {}: ease factor {:.2}, next in {} days",
        id,
        quality,
        outcome.ease_factor,
        outcome.interval_days
    );

    card.review = state;
    Ok((card, outcome))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_init_schema_is_idempotent() {
        let conn = test_conn();
        init_schema(&conn).unwrap();
        assert_eq!(count_subjects(&conn).unwrap(), 0);
    }

    #[test]
    fn test_init_database_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("study.sqlite3");

        let conn = init_database(&path).unwrap();
        new_subject("Chemistry", None, &conn).unwrap();
        drop(conn);

        let conn = init_database(&path).unwrap();
        assert_eq!(count_subjects(&conn).unwrap(), 1);
    }

    #[test]
    fn test_advance_day() {
        let conn = test_conn();
        let before = get_current_date(&conn).unwrap();
        let after = advance_day(&conn).unwrap();

        assert_eq!(after - before, Duration::days(1));
        assert_eq!(get_current_date(&conn).unwrap(), after);
        assert_eq!(current_time(&conn, ClockMode::Simulated).unwrap(), after);
    }

    #[test]
    fn test_corrupted_clock_is_an_error() {
        let conn = test_conn();
        conn.execute(
            "UPDATE app_state SET value = 'garbage' WHERE key = 'current_date'",
            [],
        )
        .unwrap();

        assert!(matches!(
            get_current_date(&conn),
            Err(StudyError::CorruptedClock(value)) if value == "garbage"
        ));
        assert!(matches!(
            current_time(&conn, ClockMode::Simulated),
            Err(StudyError::CorruptedClock(_))
        ));
        assert!(advance_day(&conn).is_err());
        // the bad value is left for the user to inspect
        let stored: String = conn
            .query_row("SELECT value FROM app_state WHERE key = 'current_date'", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(stored, "garbage");

        // the wall clock does not read app_state
        assert!(current_time(&conn, ClockMode::System).is_ok());
    }

    #[test]
    fn test_out_of_range_clock_is_an_error() {
        let conn = test_conn();
        conn.execute(
            "UPDATE app_state SET value = ?1 WHERE key = 'current_date'",
            params![i64::MAX.to_string()],
        )
        .unwrap();

        assert!(matches!(
            get_current_date(&conn),
            Err(StudyError::CorruptedClock(_))
        ));
    }

    #[test]
    fn test_subjects() {
        let conn = test_conn();
        let bio = new_subject("Biology", Some("#22c55e"), &conn).unwrap();
        new_subject("Algebra", None, &conn).unwrap();

        let subjects = get_all_subjects(&conn).unwrap();
        assert_eq!(subjects.len(), 2);
        assert_eq!(subjects[0].name, "Algebra");

        let found = find_subject_by_name("biology", &conn).unwrap();
        assert_eq!(found.id, bio);
        assert_eq!(found.color.as_deref(), Some("#22c55e"));

        assert!(matches!(
            find_subject_by_name("History", &conn),
            Err(StudyError::SubjectNotFound(_))
        ));
        assert!(new_subject("Biology", None, &conn).is_err());
    }

    #[test]
    fn test_add_and_get_flashcard() {
        let conn = test_conn();
        let subject = new_subject("Biology", None, &conn).unwrap();
        let mut card = NewFlashcard::new("Mitochondria?", "Powerhouse of the cell");
        card.category = Category::Definition;
        card.difficulty = Quality::Easy;
        card.document_id = Some(12);

        let id = add_flashcard(subject, &card, at(2025, 1, 2, 9), &conn).unwrap();
        let stored = get_flashcard(id, &conn).unwrap();

        assert_eq!(stored.subject_id, subject);
        assert_eq!(stored.to_new(), card);
        assert_eq!(stored.review, ReviewState::new());
        assert_eq!(stored.created_at, at(2025, 1, 2, 9));
    }

    #[test]
    fn test_get_missing_flashcard() {
        let conn = test_conn();
        assert!(matches!(
            get_flashcard(99, &conn),
            Err(StudyError::FlashcardNotFound(99))
        ));
    }

    #[test]
    fn test_add_flashcards_batch() {
        let mut conn = test_conn();
        let subject = new_subject("Physics", None, &conn).unwrap();
        let cards = vec![NewFlashcard::new("F = ?", "ma"), NewFlashcard::new("E = ?", "mc^2")];

        let ids = add_flashcards(subject, &cards, at(2025, 1, 1, 0), &mut conn).unwrap();
        assert_eq!(ids.len(), 2);
        assert_eq!(get_flashcards_for_subject(subject, &conn).unwrap().len(), 2);
    }

    #[test]
    fn test_batch_rejected_for_unknown_subject() {
        let mut conn = test_conn();
        let cards = vec![NewFlashcard::new("a", "b")];
        assert!(add_flashcards(42, &cards, at(2025, 1, 1, 0), &mut conn).is_err());
        assert!(get_all_flashcards(None, &conn).unwrap().is_empty());
    }

    #[test]
    fn test_record_review_writes_back() {
        let mut conn = test_conn();
        let subject = new_subject("Biology", None, &conn).unwrap();
        let id = add_flashcard(subject, &NewFlashcard::new("q", "a"), at(2025, 1, 1, 0), &conn)
            .unwrap();

        let now = at(2025, 1, 5, 10);
        let (card, outcome) = record_review(id, Quality::Easy, now, &mut conn).unwrap();
        assert_eq!(outcome.interval_days, 4);
        assert_eq!(card.review.times_reviewed, 1);

        let stored = get_flashcard(id, &conn).unwrap();
        assert_eq!(stored.review, card.review);
        assert_eq!(stored.review.last_reviewed_at, Some(now));
        assert_eq!(stored.review.next_review_at, Some(at(2025, 1, 9, 10)));

        let (_, outcome) = record_review(id, Quality::Easy, now, &mut conn).unwrap();
        assert_eq!(outcome.interval_days, 7);
        assert_eq!(get_flashcard(id, &conn).unwrap().review.times_reviewed, 2);
    }

    #[test]
    fn test_record_review_defaults_null_ease_factor() {
        let mut conn = test_conn();
        let subject = new_subject("Biology", None, &conn).unwrap();
        let id = add_flashcard(subject, &NewFlashcard::new("q", "a"), at(2025, 1, 1, 0), &conn)
            .unwrap();
        conn.execute("UPDATE flashcards SET ease_factor = NULL WHERE id = ?1", params![id])
            .unwrap();

        let (card, outcome) = record_review(id, Quality::Hard, at(2025, 1, 2, 0), &mut conn).unwrap();
        assert!((outcome.ease_factor - 2.3).abs() < 1e-9);
        assert_eq!(card.review.ease_factor, Some(outcome.ease_factor));
    }

    #[test]
    fn test_record_review_missing_card() {
        let mut conn = test_conn();
        let result = record_review(5, Quality::Medium, at(2025, 1, 1, 0), &mut conn);
        assert!(matches!(result, Err(StudyError::FlashcardNotFound(5))));
    }

    #[test]
    fn test_due_flashcards() {
        let mut conn = test_conn();
        let subject = new_subject("Biology", None, &conn).unwrap();
        let created = at(2025, 1, 1, 0);
        let never = add_flashcard(subject, &NewFlashcard::new("never", "a"), created, &conn).unwrap();
        let today = add_flashcard(subject, &NewFlashcard::new("today", "a"), created, &conn).unwrap();
        let later = add_flashcard(subject, &NewFlashcard::new("later", "a"), created, &conn).unwrap();

        // hard: due again the same day, even at a later hour
        record_review(today, Quality::Hard, at(2025, 1, 10, 22), &mut conn).unwrap();
        record_review(later, Quality::Medium, at(2025, 1, 10, 8), &mut conn).unwrap();

        let due = get_due_flashcards(Some(subject), date(2025, 1, 10), &conn).unwrap();
        let ids: Vec<i64> = due.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![never, today]);

        let due = get_due_flashcards(None, date(2025, 1, 11), &conn).unwrap();
        assert_eq!(due.len(), 3);
    }

    #[test]
    fn test_subject_ordering_puts_unscheduled_first() {
        let mut conn = test_conn();
        let subject = new_subject("Biology", None, &conn).unwrap();
        let created = at(2025, 1, 1, 0);
        let a = add_flashcard(subject, &NewFlashcard::new("a", "a"), created, &conn).unwrap();
        let b = add_flashcard(subject, &NewFlashcard::new("b", "b"), created, &conn).unwrap();
        let c = add_flashcard(subject, &NewFlashcard::new("c", "c"), created, &conn).unwrap();

        record_review(a, Quality::Easy, at(2025, 1, 2, 0), &mut conn).unwrap();
        record_review(c, Quality::Medium, at(2025, 1, 2, 0), &mut conn).unwrap();

        let ids: Vec<i64> = get_flashcards_for_subject(subject, &conn)
            .unwrap()
            .iter()
            .map(|card| card.id)
            .collect();
        assert_eq!(ids, vec![b, c, a]);
    }

    #[test]
    fn test_flashcards_scheduled_on() {
        let mut conn = test_conn();
        let subject = new_subject("Biology", None, &conn).unwrap();
        let id = add_flashcard(subject, &NewFlashcard::new("q", "a"), at(2025, 1, 1, 0), &conn)
            .unwrap();
        record_review(id, Quality::Medium, at(2025, 2, 3, 23), &mut conn).unwrap();

        assert!(get_flashcards_scheduled_on(date(2025, 2, 3), &conn).unwrap().is_empty());
        let cards = get_flashcards_scheduled_on(date(2025, 2, 4), &conn).unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].id, id);
    }

    #[test]
    fn test_deleting_subject_cascades() {
        let conn = test_conn();
        let subject = new_subject("Biology", None, &conn).unwrap();
        add_flashcard(subject, &NewFlashcard::new("q", "a"), at(2025, 1, 1, 0), &conn).unwrap();

        conn.execute("DELETE FROM subjects WHERE id = ?1", params![subject]).unwrap();
        assert!(get_all_flashcards(None, &conn).unwrap().is_empty());
    }

    #[test]
    fn test_delete_subject_removes_its_flashcards() {
        let mut conn = test_conn();
        let bio = new_subject("Biology", None, &conn).unwrap();
        let math = new_subject("Algebra", None, &conn).unwrap();
        let created = at(2025, 1, 1, 0);
        add_flashcard(bio, &NewFlashcard::new("q1", "a"), created, &conn).unwrap();
        add_flashcard(bio, &NewFlashcard::new("q2", "a"), created, &conn).unwrap();
        let kept = add_flashcard(math, &NewFlashcard::new("x", "y"), created, &conn).unwrap();

        assert_eq!(delete_subject(bio, &mut conn).unwrap(), 2);

        assert_eq!(count_subjects(&conn).unwrap(), 1);
        let remaining = get_all_flashcards(None, &conn).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, kept);
        assert!(matches!(
            find_subject_by_name("Biology", &conn),
            Err(StudyError::SubjectNotFound(_))
        ));
    }

    #[test]
    fn test_delete_missing_subject() {
        let mut conn = test_conn();
        assert!(matches!(
            delete_subject(3, &mut conn),
            Err(StudyError::SubjectNotFound(id)) if id == "3"
        ));
    }

    #[test]
    fn test_update_subject() {
        let conn = test_conn();
        let id = new_subject("Biologia", Some("#fff"), &conn).unwrap();
        new_subject("Algebra", None, &conn).unwrap();

        update_subject(id, "Biology", Some("#22c55e"), &conn).unwrap();
        let subject = find_subject_by_name("Biology", &conn).unwrap();
        assert_eq!(subject.id, id);
        assert_eq!(subject.color.as_deref(), Some("#22c55e"));

        update_subject(id, "Biology", None, &conn).unwrap();
        assert_eq!(find_subject_by_name("Biology", &conn).unwrap().color, None);

        // names stay unique
        assert!(matches!(
            update_subject(id, "Algebra", None, &conn),
            Err(StudyError::Database(_))
        ));
        assert!(matches!(
            update_subject(99, "History", None, &conn),
            Err(StudyError::SubjectNotFound(_))
        ));
    }

    #[test]
    fn test_delete_flashcard() {
        let mut conn = test_conn();
        let subject = new_subject("Biology", None, &conn).unwrap();
        let created = at(2025, 1, 1, 0);
        let gone = add_flashcard(subject, &NewFlashcard::new("q1", "a"), created, &conn).unwrap();
        let kept = add_flashcard(subject, &NewFlashcard::new("q2", "a"), created, &conn).unwrap();
        record_review(gone, Quality::Easy, at(2025, 1, 2, 0), &mut conn).unwrap();

        delete_flashcard(gone, &conn).unwrap();

        assert!(matches!(
            get_flashcard(gone, &conn),
            Err(StudyError::FlashcardNotFound(_))
        ));
        let ids: Vec<i64> = get_flashcards_for_subject(subject, &conn)
            .unwrap()
            .iter()
            .map(|card| card.id)
            .collect();
        assert_eq!(ids, vec![kept]);
        assert!(matches!(
            delete_flashcard(gone, &conn),
            Err(StudyError::FlashcardNotFound(id)) if id == gone
        ));
    }

    #[test]
    fn test_search_matches_names_and_card_text() {
        let conn = test_conn();
        let bio = new_subject("Cell Biology", None, &conn).unwrap();
        new_subject("Algebra", None, &conn).unwrap();
        let created = at(2025, 1, 1, 0);
        let front = add_flashcard(bio, &NewFlashcard::new("What is a CELL wall?", "a"), created, &conn)
            .unwrap();
        let back = add_flashcard(bio, &NewFlashcard::new("Mitochondria?", "Part of the cell"), created, &conn)
            .unwrap();
        add_flashcard(bio, &NewFlashcard::new("DNA?", "Genetic code"), created, &conn).unwrap();

        let results = search("  cell ", &conn).unwrap();
        let names: Vec<&str> = results.subjects.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Cell Biology"]);
        let ids: Vec<i64> = results.flashcards.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![front, back]);

        assert!(search("chemistry", &conn).unwrap().is_empty());
        assert!(search("   ", &conn).unwrap().is_empty());
    }

    #[test]
    fn test_search_treats_wildcards_literally() {
        let conn = test_conn();
        let subject = new_subject("Stats", None, &conn).unwrap();
        let created = at(2025, 1, 1, 0);
        let percent = add_flashcard(subject, &NewFlashcard::new("50% of 10?", "5"), created, &conn)
            .unwrap();
        add_flashcard(subject, &NewFlashcard::new("snake_case?", "lower"), created, &conn).unwrap();
        add_flashcard(subject, &NewFlashcard::new("500 of 10?", "x"), created, &conn).unwrap();

        let ids: Vec<i64> = search("0%", &conn).unwrap().flashcards.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![percent]);
        assert_eq!(search("_", &conn).unwrap().flashcards.len(), 1);
    }

    #[test]
    fn test_search_is_limited() {
        let conn = test_conn();
        let subject = new_subject("Vocabulary", None, &conn).unwrap();
        for i in 0..search::SEARCH_LIMIT + 5 {
            add_flashcard(subject, &NewFlashcard::new(format!("word {i}"), "x"), at(2025, 1, 1, 0), &conn)
                .unwrap();
        }
        assert_eq!(search("word", &conn).unwrap().flashcards.len(), search::SEARCH_LIMIT);
    }
}
