//! Survey types - inbound submissions, stored rows and outbound records
//!
//! A submission travels through three shapes:
//! - `SurveySubmission`: the JSON body posted by the client
//! - `NewSurveyRow` / `SurveyRow`: the flattened form kept in SQLite
//!   (`q2` comma-joined, `has_improvements` as 0/1)
//! - `SurveyRecord`: the JSON object returned by the listing endpoint

use serde::{Deserialize, Serialize};

/// Separator used to flatten the multi-choice `q2` answer into one column.
///
/// Answers containing this character do not survive a round-trip:
/// `["a,b"]` is stored as `a,b` and read back as `["a", "b"]`.
pub const CHOICE_DELIMITER: &str = ",";

/// Fixed-width format of the `timestamp` column. Lexicographic order on
/// strings in this format equals chronological order.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current local time in `TIMESTAMP_FORMAT`
pub fn server_timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Join multi-choice answers into the stored delimited string
pub fn join_choices(choices: &[String]) -> String {
    choices.join(CHOICE_DELIMITER)
}

/// Split a stored delimited string back into answers.
///
/// An empty column yields an empty list rather than `[""]`.
pub fn split_choices(stored: &str) -> Vec<String> {
    if stored.is_empty() {
        return Vec::new();
    }
    stored.split(CHOICE_DELIMITER).map(str::to_string).collect()
}

/// A survey submission as posted to `/api/submit`.
///
/// Missing fields decode to their defaults. Unknown fields, including any
/// client-supplied `timestamp`, are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SurveySubmission {
    pub q1: String,
    pub q2: Vec<String>,
    pub portal_rating: Option<String>,
    pub llm_rating: Option<String>,
    pub q4: String,
    pub q5: String,
    pub has_improvements: bool,
    pub improvements: Option<String>,
}

impl SurveySubmission {
    /// Flatten into a row ready for insertion, stamped with `timestamp`
    pub fn into_row(self, timestamp: String) -> NewSurveyRow {
        NewSurveyRow {
            q1: self.q1,
            q2: join_choices(&self.q2),
            portal_rating: self.portal_rating,
            llm_rating: self.llm_rating,
            q4: self.q4,
            q5: self.q5,
            has_improvements: i64::from(self.has_improvements),
            improvements: self.improvements,
            timestamp,
        }
    }
}

/// A row about to be inserted (id is assigned by the database)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSurveyRow {
    pub q1: String,
    pub q2: String,
    pub portal_rating: Option<String>,
    pub llm_rating: Option<String>,
    pub q4: String,
    pub q5: String,
    pub has_improvements: i64,
    pub improvements: Option<String>,
    pub timestamp: String,
}

/// A row read back from `survey_responses`.
///
/// Nullable columns are widened to empty strings when decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurveyRow {
    pub id: i64,
    pub q1: String,
    pub q2: String,
    pub portal_rating: String,
    pub llm_rating: String,
    pub q4: String,
    pub q5: String,
    pub has_improvements: i64,
    pub improvements: String,
    pub timestamp: String,
}

/// A survey response as returned by `/api/responses`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyRecord {
    pub id: i64,
    pub q1: String,
    pub q2: Vec<String>,
    pub portal_rating: String,
    pub llm_rating: String,
    pub q4: String,
    pub q5: String,
    pub has_improvements: bool,
    pub improvements: String,
    pub timestamp: String,
}

impl From<SurveyRow> for SurveyRecord {
    fn from(row: SurveyRow) -> Self {
        Self {
            id: row.id,
            q1: row.q1,
            q2: split_choices(&row.q2),
            portal_rating: row.portal_rating,
            llm_rating: row.llm_rating,
            q4: row.q4,
            q5: row.q5,
            has_improvements: row.has_improvements == 1,
            improvements: row.improvements,
            timestamp: row.timestamp,
        }
    }
}

/// Acknowledgement body returned by a successful submit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitAck {
    pub status: String,
    pub message: String,
}

impl SubmitAck {
    pub fn saved() -> Self {
        Self {
            status: "success".to_string(),
            message: "Survey response saved successfully".to_string(),
        }
    }
}
