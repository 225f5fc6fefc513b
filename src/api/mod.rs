pub mod review;

pub use review::{ErrorResponse, ReviewRequest, ReviewResponse, handle_review, handle_stats};
