//! Longitudinal observation records.
//!
//! Adults are followed in a hypertension program (systolic/diastolic blood
//! pressure), children in a stunting program (height-for-age z-score).
//! Contextual attributes are optional: a missing value is resolved to a
//! documented default when features are extracted, never to zero.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::HealthTwinError;

/// The two kinds of subjects the predictor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectKind {
    /// Adult followed for blood pressure
    Adult,
    /// Child followed for linear growth (HAZ)
    Child,
}

impl fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Adult => write!(f, "adult"),
            Self::Child => write!(f, "child"),
        }
    }
}

impl FromStr for SubjectKind {
    type Err = HealthTwinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "adult" | "adults" => Ok(Self::Adult),
            "child" | "children" => Ok(Self::Child),
            _ => Err(HealthTwinError::UnknownSubjectKind(s.to_string())),
        }
    }
}

/// Recorded sex of a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    /// Parse the single-letter code used in program records.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "M" | "MALE" | "L" => Some(Self::Male),
            "F" | "FEMALE" | "P" => Some(Self::Female),
            _ => None,
        }
    }

    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Male => "M",
            Self::Female => "F",
        }
    }
}

/// Contextual attributes recorded alongside an adult blood pressure reading.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdultContext {
    /// Age in years
    pub age: Option<f64>,

    pub sex: Option<Sex>,

    /// Currently on antihypertensive treatment
    pub on_treatment: Option<bool>,

    /// Months since treatment started
    pub treatment_months: Option<f64>,

    /// Treatment adherence fraction (0-1)
    pub adherence: Option<f64>,

    /// Doctor-diagnosed diabetes
    pub diabetes: Option<bool>,

    /// Current smoker
    pub smoking: Option<bool>,

    /// Body mass index in kg/m²
    pub bmi: Option<f64>,
}

/// Contextual attributes recorded alongside a child growth measurement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChildContext {
    /// Age in months
    pub age_months: Option<f64>,

    pub sex: Option<Sex>,

    /// Enrolled in a nutrition program
    pub on_program: Option<bool>,

    /// Months since program enrolment
    pub program_months: Option<f64>,

    /// Hemoglobin in g/dL
    pub hemoglobin: Option<f64>,

    /// Exclusively breastfed for the first six months
    pub exclusive_breastfeeding: Option<bool>,

    /// Adequate complementary feeding
    pub complementary_feeding: Option<bool>,

    /// Household has access to clean water
    pub clean_water: Option<bool>,

    /// Household has a proper latrine
    pub sanitation: Option<bool>,
}

/// Common access to dated observations of either kind.
pub trait Observation: Clone + Send + Sync {
    fn subject_id(&self) -> &str;

    fn date(&self) -> NaiveDate;

    /// Measurement tracked by early-warning detection
    /// (systolic for adults, HAZ for children).
    fn target_value(&self) -> f64;
}

/// One blood pressure visit for an adult.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdultObservation {
    pub subject_id: String,

    pub date: NaiveDate,

    /// Systolic blood pressure in mmHg
    pub systolic: f64,

    /// Diastolic blood pressure in mmHg
    pub diastolic: f64,

    #[serde(default)]
    pub context: AdultContext,
}

impl AdultObservation {
    #[must_use]
    pub fn new(subject_id: impl Into<String>, date: NaiveDate, systolic: f64, diastolic: f64) -> Self {
        Self {
            subject_id: subject_id.into(),
            date,
            systolic,
            diastolic,
            context: AdultContext::default(),
        }
    }

    #[must_use]
    pub fn with_context(mut self, context: AdultContext) -> Self {
        self.context = context;
        self
    }

    /// Validate that the reading can be scored.
    ///
    /// # Errors
    /// Returns validation errors as a vector of strings.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.subject_id.trim().is_empty() {
            errors.push("Subject ID is empty".to_string());
        }
        if !self.systolic.is_finite() || self.systolic <= 0.0 {
            errors.push(format!("Systolic BP {} is not a valid reading", self.systolic));
        }
        if !self.diastolic.is_finite() || self.diastolic <= 0.0 {
            errors.push(format!("Diastolic BP {} is not a valid reading", self.diastolic));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl Observation for AdultObservation {
    fn subject_id(&self) -> &str {
        &self.subject_id
    }

    fn date(&self) -> NaiveDate {
        self.date
    }

    fn target_value(&self) -> f64 {
        self.systolic
    }
}

/// One growth measurement for a child.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildObservation {
    pub subject_id: String,

    pub date: NaiveDate,

    /// Height-for-age z-score
    pub haz: f64,

    #[serde(default)]
    pub context: ChildContext,
}

impl ChildObservation {
    #[must_use]
    pub fn new(subject_id: impl Into<String>, date: NaiveDate, haz: f64) -> Self {
        Self {
            subject_id: subject_id.into(),
            date,
            haz,
            context: ChildContext::default(),
        }
    }

    #[must_use]
    pub fn with_context(mut self, context: ChildContext) -> Self {
        self.context = context;
        self
    }

    /// Validate that the measurement can be scored.
    ///
    /// # Errors
    /// Returns validation errors as a vector of strings.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.subject_id.trim().is_empty() {
            errors.push("Subject ID is empty".to_string());
        }
        if !self.haz.is_finite() {
            errors.push(format!("HAZ {} is not a finite z-score", self.haz));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl Observation for ChildObservation {
    fn subject_id(&self) -> &str {
        &self.subject_id
    }

    fn date(&self) -> NaiveDate {
        self.date
    }

    fn target_value(&self) -> f64 {
        self.haz
    }
}

/// Time-ordered observations for a single subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "observations", rename_all = "snake_case")]
pub enum SubjectHistory {
    Adult(Vec<AdultObservation>),
    Child(Vec<ChildObservation>),
}

impl SubjectHistory {
    #[must_use]
    pub fn kind(&self) -> SubjectKind {
        match self {
            Self::Adult(_) => SubjectKind::Adult,
            Self::Child(_) => SubjectKind::Child,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Adult(obs) => obs.len(),
            Self::Child(obs) => obs.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Every recorded observation of one subject kind across a population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "records", rename_all = "snake_case")]
pub enum PopulationSnapshot {
    Adults(Vec<AdultObservation>),
    Children(Vec<ChildObservation>),
}

impl PopulationSnapshot {
    #[must_use]
    pub fn kind(&self) -> SubjectKind {
        match self {
            Self::Adults(_) => SubjectKind::Adult,
            Self::Children(_) => SubjectKind::Child,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Adults(records) => records.len(),
            Self::Children(records) => records.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Return a copy of the observations sorted ascending by date.
///
/// The sort is stable, so same-day observations keep their recorded order.
#[must_use]
pub fn sorted_by_date<T: Observation>(observations: &[T]) -> Vec<T> {
    let mut sorted = observations.to_vec();
    sorted.sort_by_key(|o| o.date());
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("Valid date")
    }

    #[test]
    fn test_subject_kind_parsing() {
        assert_eq!("adult".parse::<SubjectKind>().expect("Should parse"), SubjectKind::Adult);
        assert_eq!("Adults".parse::<SubjectKind>().expect("Should parse"), SubjectKind::Adult);
        assert_eq!("children".parse::<SubjectKind>().expect("Should parse"), SubjectKind::Child);

        let err = "household".parse::<SubjectKind>().expect_err("Should reject");
        assert!(matches!(err, HealthTwinError::UnknownSubjectKind(ref k) if k == "household"));
    }

    #[test]
    fn test_sex_codes() {
        assert_eq!(Sex::from_code("m"), Some(Sex::Male));
        assert_eq!(Sex::from_code("F"), Some(Sex::Female));
        assert_eq!(Sex::from_code("?"), None);
        assert_eq!(Sex::Female.code(), "F");
    }

    #[test]
    fn test_sorted_by_date_is_stable() {
        let obs = vec![
            AdultObservation::new("P001", date(2024, 3, 1), 150.0, 95.0),
            AdultObservation::new("P001", date(2024, 1, 1), 140.0, 90.0),
            AdultObservation::new("P001", date(2024, 3, 1), 152.0, 96.0),
        ];

        let sorted = sorted_by_date(&obs);
        assert_eq!(sorted[0].systolic, 140.0);
        assert_eq!(sorted[1].systolic, 150.0);
        assert_eq!(sorted[2].systolic, 152.0);
    }

    #[test]
    fn test_adult_validation() {
        let valid = AdultObservation::new("P001", date(2024, 1, 1), 140.0, 90.0);
        assert!(valid.validate().is_ok());

        let invalid = AdultObservation::new(" ", date(2024, 1, 1), f64::NAN, 90.0);
        let errors = invalid.validate().expect_err("Should be invalid");
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_child_validation() {
        let valid = ChildObservation::new("C001", date(2024, 1, 1), -2.1);
        assert!(valid.validate().is_ok());

        let invalid = ChildObservation::new("C001", date(2024, 1, 1), f64::INFINITY);
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_history_kind_and_len() {
        let history = SubjectHistory::Child(vec![ChildObservation::new("C001", date(2024, 1, 1), -1.0)]);
        assert_eq!(history.kind(), SubjectKind::Child);
        assert_eq!(history.len(), 1);
        assert!(!history.is_empty());

        let snapshot = PopulationSnapshot::Adults(Vec::new());
        assert_eq!(snapshot.kind(), SubjectKind::Adult);
        assert!(snapshot.is_empty());
    }
}
