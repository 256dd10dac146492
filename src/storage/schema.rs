//! Database schema definitions

/// SQL to create the survey_responses table
pub const CREATE_SURVEY_RESPONSES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS survey_responses (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    q1 TEXT,
    q2 TEXT,
    portal_rating TEXT,
    llm_rating TEXT,
    q4 TEXT,
    q5 TEXT,
    has_improvements INTEGER,
    improvements TEXT,
    timestamp DATETIME DEFAULT CURRENT_TIMESTAMP
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_survey_responses_timestamp ON survey_responses(timestamp)",
];

/// Column names in table order, used for CSV headers
pub const SURVEY_COLUMNS: &[&str] = &[
    "id",
    "q1",
    "q2",
    "portal_rating",
    "llm_rating",
    "q4",
    "q5",
    "has_improvements",
    "improvements",
    "timestamp",
];

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![CREATE_SURVEY_RESPONSES_TABLE];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
