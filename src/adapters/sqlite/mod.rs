//! SQLite adapter: Implementation of RecordSource.
//!
//! Observations live in two tables, `adult_records` and `child_records`.
//! Context columns are nullable; NULL reads back as a missing attribute so
//! the feature defaults apply. Dates are stored as `YYYY-MM-DD` text.
//!
//! # Mutex Behavior
//!
//! The connection is protected by a `Mutex`. A poisoned mutex surfaces as
//! `StorageError::LockPoisoned` instead of a panic.
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, Row};

use crate::domain::{AdultContext, AdultObservation, ChildContext, ChildObservation, Sex};
use crate::ports::RecordSource;

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database lock poisoned")]
    LockPoisoned,
}

const ADULT_COLUMNS: &str = "subject_id, observed_on, systolic, diastolic, age, sex, \
     on_treatment, treatment_months, adherence, diabetes, smoking, bmi";

const CHILD_COLUMNS: &str = "subject_id, observed_on, haz, age_months, sex, on_program, \
     program_months, hemoglobin, exclusive_breastfeeding, complementary_feeding, \
     clean_water, sanitation";

/// SQLite record source.
pub struct SqliteRecordSource {
    conn: Mutex<Connection>,
}

impl SqliteRecordSource {
    /// Open (or create) the database at the given path.
    ///
    /// # Errors
    /// Returns error if database cannot be opened or initialized.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        let source = Self {
            conn: Mutex::new(conn),
        };
        source.init_schema()?;
        Ok(source)
    }

    /// Create an in-memory SQLite database (for testing).
    ///
    /// # Errors
    /// Returns error if database cannot be created.
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let source = Self {
            conn: Mutex::new(conn),
        };
        source.init_schema()?;
        Ok(source)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }

    /// Create the record tables if they do not exist yet.
    fn init_schema(&self) -> Result<(), StorageError> {
        let conn = self.lock()?;

        conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS adult_records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                subject_id TEXT NOT NULL,
                observed_on TEXT NOT NULL,
                systolic REAL NOT NULL,
                diastolic REAL NOT NULL,
                age REAL,
                sex TEXT,
                on_treatment INTEGER,
                treatment_months REAL,
                adherence REAL,
                diabetes INTEGER,
                smoking INTEGER,
                bmi REAL
            );

            CREATE INDEX IF NOT EXISTS idx_adult_records_subject
                ON adult_records(subject_id, observed_on);

            CREATE TABLE IF NOT EXISTS child_records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                subject_id TEXT NOT NULL,
                observed_on TEXT NOT NULL,
                haz REAL NOT NULL,
                age_months REAL,
                sex TEXT,
                on_program INTEGER,
                program_months REAL,
                hemoglobin REAL,
                exclusive_breastfeeding INTEGER,
                complementary_feeding INTEGER,
                clean_water INTEGER,
                sanitation INTEGER
            );

            CREATE INDEX IF NOT EXISTS idx_child_records_subject
                ON child_records(subject_id, observed_on);
            ",
        )?;

        Ok(())
    }

    /// Insert adult readings in one transaction.
    ///
    /// # Errors
    /// Returns error if any insert fails; nothing is written in that case.
    pub fn insert_adults(&self, records: &[AdultObservation]) -> Result<(), StorageError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO adult_records ({ADULT_COLUMNS}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
            ))?;
            for r in records {
                let c = &r.context;
                stmt.execute(params![
                    r.subject_id,
                    r.date,
                    r.systolic,
                    r.diastolic,
                    c.age,
                    c.sex.map(|s| s.code()),
                    c.on_treatment,
                    c.treatment_months,
                    c.adherence,
                    c.diabetes,
                    c.smoking,
                    c.bmi,
                ])?;
            }
        }
        tx.commit()?;

        tracing::debug!("Inserted {} adult records", records.len());
        Ok(())
    }

    /// Insert child measurements in one transaction.
    ///
    /// # Errors
    /// Returns error if any insert fails; nothing is written in that case.
    pub fn insert_children(&self, records: &[ChildObservation]) -> Result<(), StorageError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO child_records ({CHILD_COLUMNS}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
            ))?;
            for r in records {
                let c = &r.context;
                stmt.execute(params![
                    r.subject_id,
                    r.date,
                    r.haz,
                    c.age_months,
                    c.sex.map(|s| s.code()),
                    c.on_program,
                    c.program_months,
                    c.hemoglobin,
                    c.exclusive_breastfeeding,
                    c.complementary_feeding,
                    c.clean_water,
                    c.sanitation,
                ])?;
            }
        }
        tx.commit()?;

        tracing::debug!("Inserted {} child records", records.len());
        Ok(())
    }

    fn query_adults(&self, subject_id: Option<&str>) -> Result<Vec<AdultObservation>, StorageError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {ADULT_COLUMNS} FROM adult_records \
             WHERE ?1 IS NULL OR subject_id = ?1 \
             ORDER BY subject_id, observed_on, id"
        ))?;

        let rows = stmt.query_map(params![subject_id], adult_from_row)?;
        collect_convertible(rows, "adult_records")
    }

    fn query_children(&self, subject_id: Option<&str>) -> Result<Vec<ChildObservation>, StorageError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {CHILD_COLUMNS} FROM child_records \
             WHERE ?1 IS NULL OR subject_id = ?1 \
             ORDER BY subject_id, observed_on, id"
        ))?;

        let rows = stmt.query_map(params![subject_id], child_from_row)?;
        collect_convertible(rows, "child_records")
    }
}

/// Collect rows, skipping those whose stored values do not convert.
///
/// Any other database error aborts the read.
fn collect_convertible<T>(
    rows: impl Iterator<Item = rusqlite::Result<T>>,
    table: &str,
) -> Result<Vec<T>, StorageError> {
    let mut records = Vec::new();
    let mut skipped = 0usize;

    for row in rows {
        match row {
            Ok(record) => records.push(record),
            Err(
                e @ (rusqlite::Error::FromSqlConversionFailure(..)
                | rusqlite::Error::InvalidColumnType(..)
                | rusqlite::Error::IntegralValueOutOfRange(..)),
            ) => {
                tracing::debug!("Unreadable row in {}: {}", table, e);
                skipped += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    if skipped > 0 {
        tracing::warn!("Skipped {} unreadable rows in {}", skipped, table);
    }
    Ok(records)
}

/// Unrecognised sex codes read as missing.
fn sex_from_row(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Sex>> {
    let code: Option<String> = row.get(idx)?;
    Ok(code.as_deref().and_then(Sex::from_code))
}

fn adult_from_row(row: &Row<'_>) -> rusqlite::Result<AdultObservation> {
    Ok(AdultObservation {
        subject_id: row.get(0)?,
        date: row.get(1)?,
        systolic: row.get(2)?,
        diastolic: row.get(3)?,
        context: AdultContext {
            age: row.get(4)?,
            sex: sex_from_row(row, 5)?,
            on_treatment: row.get(6)?,
            treatment_months: row.get(7)?,
            adherence: row.get(8)?,
            diabetes: row.get(9)?,
            smoking: row.get(10)?,
            bmi: row.get(11)?,
        },
    })
}

fn child_from_row(row: &Row<'_>) -> rusqlite::Result<ChildObservation> {
    Ok(ChildObservation {
        subject_id: row.get(0)?,
        date: row.get(1)?,
        haz: row.get(2)?,
        context: ChildContext {
            age_months: row.get(3)?,
            sex: sex_from_row(row, 4)?,
            on_program: row.get(5)?,
            program_months: row.get(6)?,
            hemoglobin: row.get(7)?,
            exclusive_breastfeeding: row.get(8)?,
            complementary_feeding: row.get(9)?,
            clean_water: row.get(10)?,
            sanitation: row.get(11)?,
        },
    })
}

impl RecordSource for SqliteRecordSource {
    type Error = StorageError;

    fn adult_history(&self, subject_id: &str) -> Result<Vec<AdultObservation>, Self::Error> {
        self.query_adults(Some(subject_id))
    }

    fn child_history(&self, subject_id: &str) -> Result<Vec<ChildObservation>, Self::Error> {
        self.query_children(Some(subject_id))
    }

    fn adult_population(&self) -> Result<Vec<AdultObservation>, Self::Error> {
        self.query_adults(None)
    }

    fn child_population(&self) -> Result<Vec<ChildObservation>, Self::Error> {
        self.query_children(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PopulationSnapshot, SubjectKind};
    use chrono::NaiveDate;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).expect("Valid date")
    }

    #[test]
    fn test_adult_records_roundtrip() {
        let source = SqliteRecordSource::in_memory().expect("Should create db");

        let treated = AdultObservation::new("P001", date(2, 1), 148.0, 92.0).with_context(AdultContext {
            age: Some(61.0),
            sex: Some(Sex::Female),
            on_treatment: Some(true),
            adherence: Some(0.75),
            ..Default::default()
        });
        let earlier = AdultObservation::new("P001", date(1, 1), 152.0, 95.0);
        let other = AdultObservation::new("P002", date(1, 15), 128.0, 82.0);

        source
            .insert_adults(&[treated.clone(), earlier.clone(), other])
            .expect("Should insert");

        let history = source.adult_history("P001").expect("Should load");
        assert_eq!(history, vec![earlier, treated]);
        assert!(history[0].context.age.is_none());

        assert_eq!(source.adult_population().expect("Should load").len(), 3);
        assert!(source.adult_history("P999").expect("Should load").is_empty());
    }

    #[test]
    fn test_child_records_roundtrip() {
        let source = SqliteRecordSource::in_memory().expect("Should create db");

        let child = ChildObservation::new("C001", date(3, 1), -2.4).with_context(ChildContext {
            age_months: Some(14.0),
            sex: Some(Sex::Male),
            hemoglobin: Some(10.2),
            clean_water: Some(false),
            ..Default::default()
        });
        source.insert_children(&[child.clone()]).expect("Should insert");

        let history = source.child_history("C001").expect("Should load");
        assert_eq!(history, vec![child]);

        match source.population(SubjectKind::Child).expect("Should load") {
            PopulationSnapshot::Children(records) => assert_eq!(records.len(), 1),
            PopulationSnapshot::Adults(_) => panic!("Expected child snapshot"),
        }
    }

    #[test]
    fn test_malformed_rows_are_skipped() {
        let source = SqliteRecordSource::in_memory().expect("Should create db");
        source
            .insert_adults(&[AdultObservation::new("P001", date(1, 1), 140.0, 90.0)])
            .expect("Should insert");
        source
            .insert_children(&[ChildObservation::new("C001", date(1, 1), -1.5)])
            .expect("Should insert");

        {
            let conn = source.lock().expect("Should lock");
            conn.execute(
                "INSERT INTO adult_records (subject_id, observed_on, systolic, diastolic) \
                 VALUES ('P002', '01/02/2024', 150.0, 95.0)",
                [],
            )
            .expect("Should insert raw row");
            conn.execute(
                "INSERT INTO child_records (subject_id, observed_on, haz) \
                 VALUES ('C002', '2024-01-01', 'tall')",
                [],
            )
            .expect("Should insert raw row");
        }

        let adults = source.adult_population().expect("Should load");
        assert_eq!(adults.len(), 1);
        assert_eq!(adults[0].subject_id, "P001");
        assert!(source.adult_history("P002").expect("Should load").is_empty());

        let children = source.child_population().expect("Should load");
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].subject_id, "C001");
    }

    #[test]
    fn test_file_database_persists() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let path = dir.path().join("records.db");

        {
            let source = SqliteRecordSource::new(&path).expect("Should create db");
            source
                .insert_adults(&[AdultObservation::new("P001", date(1, 1), 140.0, 90.0)])
                .expect("Should insert");
        }

        let reopened = SqliteRecordSource::new(&path).expect("Should reopen db");
        assert_eq!(reopened.adult_history("P001").expect("Should load").len(), 1);
        assert!(reopened.child_population().expect("Should load").is_empty());
    }
}
