pub mod flashcard;
pub mod review_state;
pub mod scheduler;
pub mod search;
pub mod stats;
pub mod study_card;
pub mod study_session;
pub mod subject;

pub use flashcard::{Category, Difficulty, Flashcard, NewFlashcard};
pub use review_state::ReviewState;
pub use scheduler::{Quality, ReviewOutcome};
pub use search::SearchResults;
pub use stats::{DashboardStats, ReviewStats};
pub use study_card::StudyCard;
pub use study_session::{SessionSummary, StudySession};
pub use subject::Subject;
