mod app;

use anyhow::Result;
use app::App;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use study_assistant::config::Config;
use study_assistant::models::{Category, Quality};

#[derive(Parser)]
#[command(name = "study", about = "Flashcards with spaced repetition", version)]
struct Cli {
    /// Configuration file (default: <config dir>/study-assistant/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database file, overrides the configuration
    #[arg(long, global = true, env = "STUDY_DB")]
    db: Option<PathBuf>,

    /// Print JSON instead of plain text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Manage subjects
    #[command(subcommand)]
    Subject(SubjectCommand),

    /// Manage flashcards
    #[command(subcommand)]
    Card(CardCommand),

    /// Import a generated flashcard batch (JSON) into a subject
    Import { subject: String, file: PathBuf },

    /// Export a subject's flashcards to JSON
    Export { subject: String, file: PathBuf },

    /// Grade one flashcard: hard, medium or easy
    Review { flashcard_id: i64, quality: String },

    /// Total, reviewed and due flashcards
    Stats {
        #[arg(long)]
        subject: Option<String>,
    },

    /// Streak, weekly activity and upcoming reviews
    Dashboard {
        /// Restrict to one subject's flashcards
        #[arg(long)]
        subject: Option<String>,
    },

    /// Find subjects by name and flashcards by front or back text
    Search { query: String },

    /// Reviews done and pending per day of a month
    Calendar {
        /// Month as YYYY-MM (default: current month)
        #[arg(long)]
        month: Option<String>,
    },

    /// Flashcards scheduled on a date (YYYY-MM-DD)
    Day { date: String },

    /// Study the due flashcards of a subject
    Study { subject: String },

    /// Move the simulated clock forward by one day
    NextDay,
}

#[derive(Subcommand)]
enum SubjectCommand {
    /// Create a subject
    Add {
        name: String,
        #[arg(long)]
        color: Option<String>,
    },
    /// List subjects with card counts
    List,
    /// Rename a subject or change its color
    Edit {
        name: String,
        #[arg(long = "name")]
        new_name: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },
    /// Delete a subject and all of its flashcards
    Delete { name: String },
}

#[derive(Subcommand)]
enum CardCommand {
    /// Add a flashcard to a subject
    Add {
        subject: String,
        front: String,
        back: String,
        #[arg(long, default_value = "concept")]
        category: Category,
        #[arg(long, default_value = "medium")]
        difficulty: Quality,
    },
    /// Delete a flashcard
    Delete { flashcard_id: i64 },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(db) = cli.db {
        config.database_path = db;
    }
    log::debug!("using database {}", config.database_path.display());

    let app = App::new(config)?;
    let json = cli.json;

    match cli.command {
        Command::Subject(SubjectCommand::Add { name, color }) => {
            app.add_subject(&name, color.as_deref())?
        }
        Command::Subject(SubjectCommand::List) => app.list_subjects(json)?,
        Command::Subject(SubjectCommand::Edit {
            name,
            new_name,
            color,
        }) => app.edit_subject(&name, new_name.as_deref(), color.as_deref())?,
        Command::Subject(SubjectCommand::Delete { name }) => app.delete_subject(&name)?,
        Command::Card(CardCommand::Add {
            subject,
            front,
            back,
            category,
            difficulty,
        }) => app.add_card(&subject, &front, &back, category, difficulty)?,
        Command::Card(CardCommand::Delete { flashcard_id }) => app.delete_card(flashcard_id)?,
        Command::Import { subject, file } => app.import(&subject, &file)?,
        Command::Export { subject, file } => app.export(&subject, &file)?,
        Command::Review {
            flashcard_id,
            quality,
        } => app.review(flashcard_id, &quality, json)?,
        Command::Stats { subject } => app.stats(subject.as_deref(), json)?,
        Command::Dashboard { subject } => app.dashboard(subject.as_deref(), json)?,
        Command::Search { query } => app.search(&query, json)?,
        Command::Calendar { month } => app.calendar(month.as_deref(), json)?,
        Command::Day { date } => app.day(&date, json)?,
        Command::Study { subject } => app.study(&subject)?,
        Command::NextDay => app.next_day()?,
    }

    Ok(())
}
