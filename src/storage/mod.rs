//! Storage Layer - SQLite-backed persistence
//!
//! System of record is a single SQLite table:
//! - survey_responses(id, q1, q2, portal_rating, llm_rating, q4, q5,
//!   has_improvements, improvements, timestamp)

pub mod schema;
pub mod sqlite;

pub use sqlite::{SqliteStore, Listing, SurveyStats, AverageRatings, ImprovementCounts};
