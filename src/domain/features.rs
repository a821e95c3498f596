//! Per-subject feature extraction.
//!
//! Features are built once per prediction call from a date-sorted history.
//! Every missing or non-finite context attribute resolves to one of the
//! `DEFAULT_*` constants below; nothing else in the crate applies defaults.

use serde::{Deserialize, Serialize};

use super::record::{AdultContext, AdultObservation, ChildContext, ChildObservation, Sex};

/// Features describing an adult at the time of prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdultFeatures {
    /// Age in years
    pub age: f64,
    pub sex: Option<Sex>,
    pub on_treatment: bool,
    pub treatment_months: f64,
    /// Adherence fraction, clamped to [0, 1]
    pub adherence: f64,
    pub diabetes: bool,
    pub smoking: bool,
    pub bmi: f64,
    /// First recorded systolic reading
    pub baseline_systolic: f64,
    /// First recorded diastolic reading
    pub baseline_diastolic: f64,
    /// Sample standard deviation of systolic readings (0 for one reading)
    pub systolic_variability: f64,
    pub data_points: usize,
}

impl AdultFeatures {
    pub const DEFAULT_AGE: f64 = 50.0;
    pub const DEFAULT_TREATMENT_MONTHS: f64 = 0.0;
    /// Missing adherence is read as full adherence.
    pub const DEFAULT_ADHERENCE: f64 = 1.0;
    pub const DEFAULT_BMI: f64 = 25.0;

    /// Extract features from a date-sorted history.
    ///
    /// Context attributes are read from the latest observation. Returns `None`
    /// for an empty history.
    #[must_use]
    pub fn extract(history: &[AdultObservation]) -> Option<Self> {
        let first = history.first()?;
        let latest = history.last()?;
        let systolic: Vec<f64> = history.iter().map(|o| o.systolic).collect();

        Some(Self {
            baseline_systolic: first.systolic,
            baseline_diastolic: first.diastolic,
            systolic_variability: sample_std(&systolic),
            data_points: history.len(),
            ..Self::from_context(&latest.context)
        })
    }

    /// Features for a single reading (population snapshots, heuristics).
    #[must_use]
    pub fn from_latest(latest: &AdultObservation) -> Self {
        Self {
            baseline_systolic: latest.systolic,
            baseline_diastolic: latest.diastolic,
            systolic_variability: 0.0,
            data_points: 1,
            ..Self::from_context(&latest.context)
        }
    }

    fn from_context(context: &AdultContext) -> Self {
        Self {
            age: finite_or(context.age, Self::DEFAULT_AGE),
            sex: context.sex,
            on_treatment: context.on_treatment.unwrap_or(false),
            treatment_months: finite_or(context.treatment_months, Self::DEFAULT_TREATMENT_MONTHS)
                .max(0.0),
            adherence: finite_or(context.adherence, Self::DEFAULT_ADHERENCE).clamp(0.0, 1.0),
            diabetes: context.diabetes.unwrap_or(false),
            smoking: context.smoking.unwrap_or(false),
            bmi: finite_or(context.bmi, Self::DEFAULT_BMI),
            baseline_systolic: 0.0,
            baseline_diastolic: 0.0,
            systolic_variability: 0.0,
            data_points: 0,
        }
    }

    /// Flat list of named scalar values.
    #[must_use]
    pub fn to_named_values(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("age", self.age),
            ("on_treatment", flag(self.on_treatment)),
            ("treatment_months", self.treatment_months),
            ("adherence", self.adherence),
            ("diabetes", flag(self.diabetes)),
            ("smoking", flag(self.smoking)),
            ("bmi", self.bmi),
            ("baseline_systolic", self.baseline_systolic),
            ("baseline_diastolic", self.baseline_diastolic),
            ("systolic_variability", self.systolic_variability),
            ("data_points", self.data_points as f64),
        ]
    }
}

/// Features describing a child at the time of prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildFeatures {
    pub age_months: f64,
    pub sex: Option<Sex>,
    pub on_program: bool,
    pub program_months: f64,
    /// Hemoglobin in g/dL
    pub hemoglobin: f64,
    pub exclusive_breastfeeding: bool,
    pub complementary_feeding: bool,
    pub clean_water: bool,
    pub sanitation: bool,
    /// First recorded HAZ
    pub baseline_haz: f64,
    /// Sample standard deviation of HAZ (0 for one measurement)
    pub haz_variability: f64,
    pub data_points: usize,
}

impl ChildFeatures {
    pub const DEFAULT_AGE_MONTHS: f64 = 24.0;
    pub const DEFAULT_PROGRAM_MONTHS: f64 = 0.0;
    pub const DEFAULT_HEMOGLOBIN: f64 = 12.0;

    /// Extract features from a date-sorted history.
    ///
    /// Returns `None` for an empty history.
    #[must_use]
    pub fn extract(history: &[ChildObservation]) -> Option<Self> {
        let first = history.first()?;
        let latest = history.last()?;
        let haz: Vec<f64> = history.iter().map(|o| o.haz).collect();

        Some(Self {
            baseline_haz: first.haz,
            haz_variability: sample_std(&haz),
            data_points: history.len(),
            ..Self::from_context(&latest.context)
        })
    }

    #[must_use]
    pub fn from_latest(latest: &ChildObservation) -> Self {
        Self {
            baseline_haz: latest.haz,
            haz_variability: 0.0,
            data_points: 1,
            ..Self::from_context(&latest.context)
        }
    }

    fn from_context(context: &ChildContext) -> Self {
        Self {
            age_months: finite_or(context.age_months, Self::DEFAULT_AGE_MONTHS).max(0.0),
            sex: context.sex,
            on_program: context.on_program.unwrap_or(false),
            program_months: finite_or(context.program_months, Self::DEFAULT_PROGRAM_MONTHS).max(0.0),
            hemoglobin: finite_or(context.hemoglobin, Self::DEFAULT_HEMOGLOBIN),
            exclusive_breastfeeding: context.exclusive_breastfeeding.unwrap_or(false),
            complementary_feeding: context.complementary_feeding.unwrap_or(false),
            clean_water: context.clean_water.unwrap_or(false),
            sanitation: context.sanitation.unwrap_or(false),
            baseline_haz: 0.0,
            haz_variability: 0.0,
            data_points: 0,
        }
    }

    /// Flat list of named scalar values.
    #[must_use]
    pub fn to_named_values(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("age_months", self.age_months),
            ("on_program", flag(self.on_program)),
            ("program_months", self.program_months),
            ("hemoglobin", self.hemoglobin),
            ("exclusive_breastfeeding", flag(self.exclusive_breastfeeding)),
            ("complementary_feeding", flag(self.complementary_feeding)),
            ("clean_water", flag(self.clean_water)),
            ("sanitation", flag(self.sanitation)),
            ("baseline_haz", self.baseline_haz),
            ("haz_variability", self.haz_variability),
            ("data_points", self.data_points as f64),
        ]
    }
}

pub(crate) fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

fn finite_or(value: Option<f64>, default: f64) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(default)
}

/// Sample standard deviation (n - 1 denominator).
fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (ss / (n - 1.0)).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, 1).expect("Valid date")
    }

    #[test]
    fn test_adult_defaults() {
        let obs = AdultObservation::new("P001", date(1), 140.0, 90.0);
        let features = AdultFeatures::from_latest(&obs);

        assert!((features.age - 50.0).abs() < f64::EPSILON);
        assert!((features.adherence - 1.0).abs() < f64::EPSILON);
        assert!((features.bmi - 25.0).abs() < f64::EPSILON);
        assert!(!features.on_treatment);
        assert!(!features.diabetes);
        assert_eq!(features.data_points, 1);
    }

    #[test]
    fn test_adult_non_finite_context_uses_defaults() {
        let obs = AdultObservation::new("P001", date(1), 140.0, 90.0).with_context(AdultContext {
            age: Some(f64::NAN),
            adherence: Some(1.7),
            ..Default::default()
        });
        let features = AdultFeatures::from_latest(&obs);

        assert!((features.age - AdultFeatures::DEFAULT_AGE).abs() < f64::EPSILON);
        assert!((features.adherence - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_adult_extract_reads_latest_context_and_baseline() {
        let history = vec![
            AdultObservation::new("P001", date(1), 150.0, 95.0),
            AdultObservation::new("P001", date(2), 146.0, 93.0),
            AdultObservation::new("P001", date(3), 142.0, 91.0).with_context(AdultContext {
                age: Some(62.0),
                on_treatment: Some(true),
                adherence: Some(0.6),
                ..Default::default()
            }),
        ];

        let features = AdultFeatures::extract(&history).expect("Should extract");
        assert!((features.baseline_systolic - 150.0).abs() < f64::EPSILON);
        assert!((features.age - 62.0).abs() < f64::EPSILON);
        assert!((features.adherence - 0.6).abs() < f64::EPSILON);
        assert!((features.systolic_variability - 4.0).abs() < 1e-9);
        assert_eq!(features.data_points, 3);
    }

    #[test]
    fn test_extract_empty_history() {
        assert!(AdultFeatures::extract(&[]).is_none());
        assert!(ChildFeatures::extract(&[]).is_none());
    }

    #[test]
    fn test_child_defaults() {
        let obs = ChildObservation::new("C001", date(1), -2.4);
        let features = ChildFeatures::from_latest(&obs);

        assert!((features.age_months - 24.0).abs() < f64::EPSILON);
        assert!((features.hemoglobin - 12.0).abs() < f64::EPSILON);
        assert!(!features.on_program);
        assert!(!features.clean_water);
    }

    #[test]
    fn test_named_values_cover_all_scalars() {
        let obs = ChildObservation::new("C001", date(1), -2.4);
        let named = ChildFeatures::from_latest(&obs).to_named_values();
        assert_eq!(named.len(), 11);
        assert!(named.iter().any(|(name, value)| *name == "baseline_haz" && (*value + 2.4).abs() < 1e-12));
    }
}
