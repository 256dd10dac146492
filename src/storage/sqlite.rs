//! SQLite storage implementation

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use rusqlite::{Connection, params};
use serde::Serialize;
use crate::{Result, Error};
use crate::survey::{NewSurveyRow, SurveyRow};
use super::schema;

/// Newest first; rows stamped within the same second fall back to insertion order.
const SELECT_ALL_NEWEST_FIRST: &str = r#"
SELECT id, q1, q2, portal_rating, llm_rating, q4, q5, has_improvements, improvements, timestamp
FROM survey_responses
ORDER BY timestamp DESC, id DESC
"#;

/// SQLite-backed storage for survey responses.
///
/// One connection is owned for the lifetime of the store. Every operation
/// takes it through a scoped guard, so it is released on all exit paths.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open a database file (creates if doesn't exist) and ensure the schema
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .map_err(|e| Error::Unavailable(format!("cannot open {}: {}", path.display(), e)))?;
        let store = Self { conn: Mutex::new(conn) };
        store.create_schema()?;
        tracing::debug!("Opened survey database at {}", path.display());
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::Unavailable(e.to_string()))?;
        let store = Self { conn: Mutex::new(conn) };
        store.create_schema()?;
        Ok(store)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::Unavailable("connection lock poisoned".to_string()))
    }

    /// Create the survey table and its indexes if absent. Safe to call repeatedly.
    pub fn create_schema(&self) -> Result<()> {
        let conn = self.conn()?;
        for stmt in schema::all_schema_statements() {
            conn.execute(stmt, [])?;
        }
        Ok(())
    }

    // ========== Response Operations ==========

    /// Append one response, returning the id assigned by the database
    pub fn insert(&self, row: &NewSurveyRow) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO survey_responses
            (q1, q2, portal_rating, llm_rating, q4, q5, has_improvements, improvements, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                row.q1,
                row.q2,
                row.portal_rating,
                row.llm_rating,
                row.q4,
                row.q5,
                row.has_improvements,
                row.improvements,
                row.timestamp,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// List every response, newest first.
    ///
    /// Rows that fail to decode are skipped and counted in `Listing::skipped`
    /// instead of failing the whole listing. Any other failure while stepping
    /// the query aborts the listing.
    pub fn list_all(&self) -> Result<Listing> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(SELECT_ALL_NEWEST_FIRST)?;

        let mut listing = Listing::default();
        for result in stmt.query_map([], row_to_survey)? {
            match result {
                Ok(row) => listing.rows.push(row),
                Err(e) if is_decode_error(&e) => {
                    listing.skipped += 1;
                    tracing::warn!("Skipping undecodable survey row: {}", e);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(listing)
    }

    /// Count all responses
    pub fn count(&self) -> Result<usize> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM survey_responses", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    // ========== Reporting ==========

    /// Aggregate statistics over all responses
    pub fn stats(&self) -> Result<SurveyStats> {
        let conn = self.conn()?;

        let total: i64 = conn.query_row("SELECT COUNT(*) FROM survey_responses", [], |row| row.get(0))?;
        let improvements: i64 = conn.query_row(
            "SELECT COUNT(*) FROM survey_responses WHERE has_improvements = 1",
            [],
            |row| row.get(0),
        )?;

        Ok(SurveyStats {
            total_responses: total as usize,
            q1_distribution: distribution(&conn, "q1")?,
            average_ratings: AverageRatings {
                portal: average_rating(&conn, "portal_rating")?,
                llm: average_rating(&conn, "llm_rating")?,
            },
            q4_distribution: distribution(&conn, "q4")?,
            q5_distribution: distribution(&conn, "q5")?,
            has_improvements: ImprovementCounts {
                yes: improvements as usize,
                no: (total - improvements) as usize,
            },
        })
    }

    /// Write every listed response as CSV, returning the number of data rows
    pub fn export_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let listing = self.list_all()?;
        let mut wtr = csv::Writer::from_writer(writer);

        wtr.write_record(schema::SURVEY_COLUMNS)?;
        for row in &listing.rows {
            let id = row.id.to_string();
            let has_improvements = row.has_improvements.to_string();
            wtr.write_record([
                id.as_str(),
                row.q1.as_str(),
                row.q2.as_str(),
                row.portal_rating.as_str(),
                row.llm_rating.as_str(),
                row.q4.as_str(),
                row.q5.as_str(),
                has_improvements.as_str(),
                row.improvements.as_str(),
                row.timestamp.as_str(),
            ])?;
        }
        wtr.flush()?;

        Ok(listing.rows.len())
    }
}

/// Helper to convert a row to a SurveyRow, widening NULL optionals to ""
fn row_to_survey(row: &rusqlite::Row) -> rusqlite::Result<SurveyRow> {
    Ok(SurveyRow {
        id: row.get(0)?,
        q1: row.get(1)?,
        q2: row.get(2)?,
        portal_rating: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        llm_rating: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        q4: row.get(5)?,
        q5: row.get(6)?,
        has_improvements: row.get(7)?,
        improvements: row.get::<_, Option<String>>(8)?.unwrap_or_default(),
        timestamp: row.get(9)?,
    })
}

/// Errors raised while converting a column value, as opposed to stepping the statement
fn is_decode_error(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::FromSqlConversionFailure(..)
            | rusqlite::Error::InvalidColumnType(..)
            | rusqlite::Error::IntegralValueOutOfRange(..)
    )
}

/// Answer -> count for one column. `column` must be a trusted column name.
fn distribution(conn: &Connection, column: &str) -> Result<BTreeMap<String, usize>> {
    let sql = format!(
        "SELECT COALESCE({column}, ''), COUNT(*) FROM survey_responses GROUP BY {column}"
    );
    let mut stmt = conn.prepare(&sql)?;

    let mut counts = BTreeMap::new();
    for entry in stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))? {
        let (answer, count) = entry?;
        *counts.entry(answer).or_insert(0) += count as usize;
    }
    Ok(counts)
}

/// Mean of a numeric rating column, ignoring empty values, rounded to one decimal
fn average_rating(conn: &Connection, column: &str) -> Result<f64> {
    let sql = format!(
        "SELECT AVG(CAST({column} AS REAL)) FROM survey_responses WHERE {column} IS NOT NULL AND {column} != ''"
    );
    let avg: Option<f64> = conn.query_row(&sql, [], |row| row.get(0))?;
    Ok((avg.unwrap_or(0.0) * 10.0).round() / 10.0)
}

/// Result of listing all responses
#[derive(Debug, Clone, Default)]
pub struct Listing {
    pub rows: Vec<SurveyRow>,
    /// Rows dropped because they could not be decoded
    pub skipped: usize,
}

/// Aggregate statistics over the survey table
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SurveyStats {
    pub total_responses: usize,
    pub q1_distribution: BTreeMap<String, usize>,
    pub average_ratings: AverageRatings,
    pub q4_distribution: BTreeMap<String, usize>,
    pub q5_distribution: BTreeMap<String, usize>,
    pub has_improvements: ImprovementCounts,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AverageRatings {
    pub portal: f64,
    pub llm: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImprovementCounts {
    pub yes: usize,
    pub no: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row(q1: &str, timestamp: &str) -> NewSurveyRow {
        NewSurveyRow {
            q1: q1.to_string(),
            q2: "a,b".to_string(),
            portal_rating: Some("4".to_string()),
            llm_rating: None,
            q4: "daily".to_string(),
            q5: "reports".to_string(),
            has_improvements: 0,
            improvements: None,
            timestamp: timestamp.to_string(),
        }
    }

    #[test]
    fn test_insert_assigns_increasing_ids() {
        let store = SqliteStore::open_in_memory().unwrap();

        let first = store.insert(&sample_row("first", "2024-05-01 10:00:00")).unwrap();
        let second = store.insert(&sample_row("second", "2024-05-01 10:00:01")).unwrap();

        assert!(second > first);
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn test_list_empty() {
        let store = SqliteStore::open_in_memory().unwrap();
        let listing = store.list_all().unwrap();
        assert!(listing.rows.is_empty());
        assert_eq!(listing.skipped, 0);
    }

    #[test]
    fn test_list_newest_first() {
        let store = SqliteStore::open_in_memory().unwrap();

        store.insert(&sample_row("middle", "2024-05-02 09:00:00")).unwrap();
        store.insert(&sample_row("oldest", "2024-05-01 23:59:59")).unwrap();
        store.insert(&sample_row("newest", "2024-05-10 00:00:00")).unwrap();

        let names: Vec<String> = store.list_all().unwrap().rows.into_iter().map(|r| r.q1).collect();
        assert_eq!(names, vec!["newest", "middle", "oldest"]);
    }

    #[test]
    fn test_same_second_falls_back_to_id() {
        let store = SqliteStore::open_in_memory().unwrap();

        for name in ["one", "two", "three"] {
            store.insert(&sample_row(name, "2024-05-01 10:00:00")).unwrap();
        }

        let names: Vec<String> = store.list_all().unwrap().rows.into_iter().map(|r| r.q1).collect();
        assert_eq!(names, vec!["three", "two", "one"]);
    }

    #[test]
    fn test_null_optionals_widen_to_empty() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert(&sample_row("q", "2024-05-01 10:00:00")).unwrap();

        let row = store.list_all().unwrap().rows.remove(0);
        assert_eq!(row.portal_rating, "4");
        assert_eq!(row.llm_rating, "");
        assert_eq!(row.improvements, "");
    }

    #[test]
    fn test_undecodable_row_is_skipped() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert(&sample_row("good", "2024-05-01 10:00:00")).unwrap();
        store
            .conn()
            .unwrap()
            .execute(
                "INSERT INTO survey_responses (q1, q2, q4, q5, has_improvements, timestamp)
                 VALUES (NULL, 'a', 'x', 'y', 0, '2024-05-02 10:00:00')",
                [],
            )
            .unwrap();

        let listing = store.list_all().unwrap();
        assert_eq!(listing.rows.len(), 1);
        assert_eq!(listing.rows[0].q1, "good");
        assert_eq!(listing.skipped, 1);
    }

    #[test]
    fn test_corrupt_page_fails_listing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("survey.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            let filler = "x".repeat(500);
            for i in 0..400 {
                let mut row = sample_row(&format!("row {}", i), "2024-05-01 10:00:00");
                row.improvements = Some(filler.clone());
                store.insert(&row).unwrap();
            }
        }

        let page_size = 4096u64;
        let pages = std::fs::metadata(&path).unwrap().len() / page_size;
        assert!(pages > 8);
        {
            use std::io::{Seek, SeekFrom};
            let mut file = std::fs::OpenOptions::new().write(true).open(&path).unwrap();
            file.seek(SeekFrom::Start((pages / 2) * page_size)).unwrap();
            file.write_all(&vec![0xFF; page_size as usize]).unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        let err = store.list_all().err().unwrap();
        assert_eq!(err.kind(), crate::ErrorKind::StorageOperation);
        assert!(store.export_csv(Vec::new()).is_err());
    }

    #[test]
    fn test_decode_errors_are_distinguished() {
        assert!(is_decode_error(&rusqlite::Error::InvalidColumnType(
            1,
            "q1".to_string(),
            rusqlite::types::Type::Null,
        )));
        assert!(is_decode_error(&rusqlite::Error::IntegralValueOutOfRange(7, 300)));
        assert!(!is_decode_error(&rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CORRUPT),
            None,
        )));
    }

    #[test]
    fn test_schema_is_idempotent_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("survey.db");

        let first_id = {
            let store = SqliteStore::open(&path).unwrap();
            store.create_schema().unwrap();
            store.insert(&sample_row("before", "2024-05-01 10:00:00")).unwrap()
        };

        let store = SqliteStore::open(&path).unwrap();
        let second_id = store.insert(&sample_row("after", "2024-05-01 10:00:01")).unwrap();

        assert_eq!(store.count().unwrap(), 2);
        assert!(second_id > first_id);
    }

    #[test]
    fn test_open_missing_directory_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("survey.db");

        let err = SqliteStore::open(&path).err().unwrap();
        assert_eq!(err.kind(), crate::ErrorKind::StorageUnavailable);
    }

    #[test]
    fn test_stats() {
        let store = SqliteStore::open_in_memory().unwrap();

        let mut row = sample_row("yes", "2024-05-01 10:00:00");
        row.llm_rating = Some("5".to_string());
        row.has_improvements = 1;
        store.insert(&row).unwrap();

        let mut row = sample_row("yes", "2024-05-01 10:00:01");
        row.portal_rating = Some("3".to_string());
        store.insert(&row).unwrap();

        let mut row = sample_row("no", "2024-05-01 10:00:02");
        row.portal_rating = Some(String::new());
        row.q4 = "weekly".to_string();
        store.insert(&row).unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.total_responses, 3);
        assert_eq!(stats.q1_distribution.get("yes"), Some(&2));
        assert_eq!(stats.q1_distribution.get("no"), Some(&1));
        assert_eq!(stats.q4_distribution.get("weekly"), Some(&1));
        assert_eq!(stats.q5_distribution.get("reports"), Some(&3));
        assert_eq!(stats.average_ratings.portal, 3.5);
        assert_eq!(stats.average_ratings.llm, 5.0);
        assert_eq!(stats.has_improvements, ImprovementCounts { yes: 1, no: 2 });
    }

    #[test]
    fn test_stats_empty() {
        let store = SqliteStore::open_in_memory().unwrap();
        let stats = store.stats().unwrap();
        assert_eq!(stats, SurveyStats::default());
    }

    #[test]
    fn test_export_csv() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert(&sample_row("first", "2024-05-01 10:00:00")).unwrap();
        store.insert(&sample_row("second", "2024-05-01 10:00:01")).unwrap();

        let mut out = Vec::new();
        let written = store.export_csv(&mut out).unwrap();
        assert_eq!(written, 2);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "id,q1,q2,portal_rating,llm_rating,q4,q5,has_improvements,improvements,timestamp"
        );
        assert_eq!(lines[1], "2,second,\"a,b\",4,,daily,reports,0,,2024-05-01 10:00:01");
    }
}
