//! Terminal front end: command handlers and the interactive study mode.

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rusqlite::Connection;
use std::io::{BufRead, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use study_assistant::api::{self, ReviewRequest};
use study_assistant::config::Config;
use study_assistant::database::db;
use study_assistant::export::json::{export_json_to_path, import_json};
use study_assistant::models::stats::{self, DashboardStats};
use study_assistant::models::{Category, NewFlashcard, Quality, StudySession};

/// Shared state for CLI commands
pub struct App {
    conn: Arc<Mutex<Connection>>,
    config: Config,
}

/// Formats a timestamp as YYYY-MM-DD
fn format_date(time: DateTime<Utc>) -> String {
    time.format("%Y-%m-%d").to_string()
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let conn = db::init_database(&config.database_path).with_context(|| {
            format!(
                "failed to open database at {}",
                config.database_path.display()
            )
        })?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            config,
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow::anyhow!("database connection lock poisoned"))
    }

    fn now(&self) -> Result<DateTime<Utc>> {
        let conn = self.conn()?;
        Ok(db::current_time(&conn, self.config.clock)?)
    }

    pub fn add_subject(&self, name: &str, color: Option<&str>) -> Result<()> {
        let conn = self.conn()?;
        let id = db::new_subject(name, color, &conn)
            .with_context(|| format!("failed to create subject '{}'", name))?;
        println!("Subject '{}' created (id {}).", name, id);
        Ok(())
    }

    pub fn list_subjects(&self, json: bool) -> Result<()> {
        let conn = self.conn()?;
        let subjects = db::get_all_subjects(&conn)?;
        if json {
            return print_json(&subjects);
        }
        if subjects.is_empty() {
            println!("No subjects yet.");
        }
        let today = db::current_time(&conn, self.config.clock)?.date_naive();
        for subject in &subjects {
            let cards = db::get_flashcards_for_subject(subject.id, &conn)?;
            let due = cards.iter().filter(|c| c.review.is_due(today)).count();
            println!(
                "  - {} ({} cards, {} due)",
                subject.name,
                cards.len(),
                due
            );
        }
        Ok(())
    }

    /// Renames and/or recolors a subject; omitted fields keep their values.
    pub fn edit_subject(&self, name: &str, new_name: Option<&str>, color: Option<&str>) -> Result<()> {
        let conn = self.conn()?;
        let subject = db::find_subject_by_name(name, &conn)?;
        let new_name = new_name.unwrap_or(subject.name.as_str());
        let color = color.or(subject.color.as_deref());
        db::update_subject(subject.id, new_name, color, &conn)
            .with_context(|| format!("failed to update subject '{}'", subject.name))?;
        println!("Subject '{}' updated.", new_name);
        Ok(())
    }

    pub fn delete_subject(&self, name: &str) -> Result<()> {
        let mut conn = self.conn()?;
        let subject = db::find_subject_by_name(name, &conn)?;
        let cards = db::delete_subject(subject.id, &mut conn)?;
        println!("Subject '{}' deleted with {} flashcards.", subject.name, cards);
        Ok(())
    }

    pub fn add_card(
        &self,
        subject: &str,
        front: &str,
        back: &str,
        category: Category,
        difficulty: Quality,
    ) -> Result<()> {
        let now = self.now()?;
        let conn = self.conn()?;
        let subject = db::find_subject_by_name(subject, &conn)?;
        let card = NewFlashcard {
            category,
            difficulty,
            ..NewFlashcard::new(front, back)
        };
        let id = db::add_flashcard(subject.id, &card, now, &conn)?;
        println!("Flashcard {} added to '{}'.", id, subject.name);
        Ok(())
    }

    pub fn delete_card(&self, flashcard_id: i64) -> Result<()> {
        let conn = self.conn()?;
        db::delete_flashcard(flashcard_id, &conn)?;
        println!("Flashcard {} deleted.", flashcard_id);
        Ok(())
    }

    pub fn search(&self, query: &str, json: bool) -> Result<()> {
        let conn = self.conn()?;
        let results = db::search(query, &conn)?;

        if json {
            return print_json(&results);
        }
        if results.is_empty() {
            println!("No results for '{}'.", query.trim());
            return Ok(());
        }
        if !results.subjects.is_empty() {
            println!("Subjects:");
            for subject in &results.subjects {
                println!("  - {}", subject.name);
            }
        }
        if !results.flashcards.is_empty() {
            println!("Flashcards:");
            for card in &results.flashcards {
                println!("  [{}] {} -> {}", card.id, card.front, card.back);
            }
        }
        Ok(())
    }

    pub fn import(&self, subject: &str, path: &Path) -> Result<()> {
        let cards = import_json(path)
            .with_context(|| format!("failed to import '{}'", path.display()))?;
        let now = self.now()?;
        let mut conn = self.conn()?;
        let subject = db::find_subject_by_name(subject, &conn)?;
        let ids = db::add_flashcards(subject.id, &cards, now, &mut conn)?;
        println!("Imported {} flashcards into '{}'.", ids.len(), subject.name);
        Ok(())
    }

    pub fn export(&self, subject: &str, path: &Path) -> Result<()> {
        let conn = self.conn()?;
        let subject = db::find_subject_by_name(subject, &conn)?;
        let cards = db::get_flashcards_for_subject(subject.id, &conn)?;
        export_json_to_path(&subject.name, &cards, path)
            .with_context(|| format!("failed to export to '{}'", path.display()))?;
        println!("Exported {} flashcards to '{}'.", cards.len(), path.display());
        Ok(())
    }

    pub fn review(&self, flashcard_id: i64, quality: &str, json: bool) -> Result<()> {
        let request = ReviewRequest {
            flashcard_id: Some(flashcard_id),
            quality: Some(quality.to_string()),
        };
        let now = self.now()?;
        let mut conn = self.conn()?;

        match api::handle_review(&request, now, &mut conn) {
            Ok(response) if json => print_json(&response),
            Ok(response) => {
                println!("{}", response.message);
                Ok(())
            }
            Err(err) if json => {
                print_json(&api::ErrorResponse::from(&err))?;
                bail!("review failed with status {}", err.status_code())
            }
            Err(err) => Err(err.into()),
        }
    }

    pub fn stats(&self, subject: Option<&str>, json: bool) -> Result<()> {
        let now = self.now()?;
        let conn = self.conn()?;
        let stats = match subject {
            None => api::handle_stats(now, &conn)?,
            Some(name) => {
                let subject = db::find_subject_by_name(name, &conn)?;
                let cards = db::get_all_flashcards(Some(subject.id), &conn)?;
                stats::ReviewStats::from_cards(&cards, now.date_naive())
            }
        };

        if json {
            return print_json(&stats);
        }
        println!("Total:     {}", stats.total);
        println!("Reviewed:  {}", stats.reviewed);
        println!("Due today: {}", stats.due_today);
        Ok(())
    }

    /// Dashboard over every subject, or over one subject's flashcards.
    pub fn dashboard(&self, subject: Option<&str>, json: bool) -> Result<()> {
        let now = self.now()?;
        let conn = self.conn()?;
        let (title, subjects, cards) = match subject {
            None => (
                format_date(now),
                db::count_subjects(&conn)?,
                db::get_all_flashcards(None, &conn)?,
            ),
            Some(name) => {
                let subject = db::find_subject_by_name(name, &conn)?;
                let cards = db::get_all_flashcards(Some(subject.id), &conn)?;
                (format!("{} - {}", subject.name, format_date(now)), 1, cards)
            }
        };
        let dashboard = DashboardStats::build(subjects, &cards, now.date_naive());

        if json {
            return print_json(&dashboard);
        }

        let progress = if dashboard.flashcards.total > 0 {
            dashboard.flashcards.reviewed * 100 / dashboard.flashcards.total
        } else {
            0
        };
        println!("{}", title);
        println!("Subjects:   {}", dashboard.subjects);
        println!(
            "Flashcards: {} ({} reviewed, {}%)",
            dashboard.flashcards.total, dashboard.flashcards.reviewed, progress
        );
        println!("Due today:  {}", dashboard.flashcards.due_today);
        println!(
            "Streak:     {} day{}",
            dashboard.study_streak,
            if dashboard.study_streak == 1 { "" } else { "s" }
        );
        println!("Study time: ~{} min", dashboard.study_time_minutes);
        println!(
            "Difficulty: {} easy / {} medium / {} hard",
            dashboard.by_difficulty.easy, dashboard.by_difficulty.medium, dashboard.by_difficulty.hard
        );

        println!("\nLast 7 days:");
        for day in &dashboard.weekly_activity {
            println!("  {} {:>3} {}", day.date.format("%a %d"), day.total, "#".repeat(day.total));
        }

        if !dashboard.upcoming_reviews.is_empty() {
            println!("\nUpcoming:");
            for upcoming in &dashboard.upcoming_reviews {
                println!("  {} {}", upcoming.date.format("%a %d"), upcoming.count);
            }
        }
        Ok(())
    }

    pub fn calendar(&self, month: Option<&str>, json: bool) -> Result<()> {
        let now = self.now()?;
        let (year, month) = match month {
            Some(text) => {
                let date = NaiveDate::parse_from_str(&format!("{}-01", text), "%Y-%m-%d")
                    .with_context(|| format!("invalid month '{}', expected YYYY-MM", text))?;
                (date.year(), date.month())
            }
            None => (now.year(), now.month()),
        };

        let cards = {
            let conn = self.conn()?;
            db::get_all_flashcards(None, &conn)?
        };
        let days = stats::calendar_month(&cards, year, month)
            .with_context(|| format!("invalid month {}-{}", year, month))?;

        if json {
            return print_json(&days);
        }
        println!("{:04}-{:02}", year, month);
        for day in days.iter().filter(|d| d.reviewed > 0 || d.pending > 0) {
            println!(
                "  {}  reviewed {:>3}  pending {:>3}",
                day.date, day.reviewed, day.pending
            );
        }
        Ok(())
    }

    pub fn day(&self, date: &str, json: bool) -> Result<()> {
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .with_context(|| format!("invalid date '{}', expected YYYY-MM-DD", date))?;
        let conn = self.conn()?;
        let cards = db::get_flashcards_scheduled_on(date, &conn)?;

        if json {
            return print_json(&cards);
        }
        if cards.is_empty() {
            println!("No reviews scheduled for {}.", date);
        }
        for card in &cards {
            println!("  [{}] {} ({})", card.id, card.front, card.difficulty);
        }
        Ok(())
    }

    pub fn next_day(&self) -> Result<()> {
        let conn = self.conn()?;
        let date = db::advance_day(&conn)?;
        println!("Simulated date is now {}.", format_date(date));
        Ok(())
    }

    /// Interactive study mode on stdin/stdout.
    ///
    /// Enter flips the card; 1, 2 and 3 grade it hard, medium and easy; q quits.
    pub fn study(&self, subject: &str) -> Result<()> {
        let subject = {
            let conn = self.conn()?;
            db::find_subject_by_name(subject, &conn)?
        };
        let started_at = self.now()?;
        let mut rng = rand::rng();
        let rng = self.config.shuffle.then_some(&mut rng);
        let mut session = StudySession::start(subject.id, Arc::clone(&self.conn), started_at, rng)?;

        if session.is_completed() {
            println!("No flashcards to review in '{}'.", subject.name);
            return Ok(());
        }

        let stdin = std::io::stdin();
        let mut lines = stdin.lock().lines();
        let mut round = 0;

        while let Some(card) = session.current_card() {
            if session.round_number != round {
                round = session.round_number;
                println!("\n== {} ==", session.phase_message());
            }

            println!("\n[{} left] {}", session.remaining_count(), card.flashcard.front);
            if session.show_back {
                println!("  -> {}", card.flashcard.back);
                print!("1 hard / 2 medium / 3 easy / q quit > ");
            } else {
                print!("Enter to flip / q quit > ");
            }
            std::io::stdout().flush()?;

            let Some(line) = lines.next() else {
                break;
            };
            let quality = match line?.trim() {
                "q" => break,
                "1" if session.show_back => Quality::Hard,
                "2" if session.show_back => Quality::Medium,
                "3" if session.show_back => Quality::Easy,
                "" if !session.show_back => {
                    session.toggle_back();
                    continue;
                }
                _ => continue,
            };

            if let Some(outcome) = session.grade_current_card(quality, self.now()?)? {
                println!("{}", study_assistant::models::scheduler::review_message(outcome.interval_days));
            }
        }

        let summary = session.summary(self.now()?);
        let total = summary.results.total();
        println!(
            "\nSession complete: {} review{} in {}m",
            total,
            if total == 1 { "" } else { "s" },
            summary.duration_minutes
        );
        println!(
            "  easy {}  medium {}  hard {}",
            summary.results.easy, summary.results.medium, summary.results.hard
        );
        Ok(())
    }
}
