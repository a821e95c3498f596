//! Predictor configuration.

/// Tunable thresholds for the outcome predictor.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictorConfig {
    /// Population score at or above which a subject is high risk
    pub risk_threshold: f64,

    /// Population score at or above which a subject is moderate risk
    pub moderate_threshold: f64,

    /// High-risk alerts at or above this score are labelled urgent
    pub urgent_threshold: f64,

    /// Length of the recent window compared against the all-time mean
    pub early_warning_days: i64,

    /// Horizon used when a caller does not supply one
    pub default_months_ahead: u32,
}

/// Accepted values for `HEALTHTWIN_EARLY_WARNING_DAYS` (up to a century).
pub const EARLY_WARNING_DAYS_RANGE: std::ops::RangeInclusive<i64> = 1..=36_500;

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            risk_threshold: 0.7,
            moderate_threshold: 0.4,
            urgent_threshold: 0.8,
            early_warning_days: 90,
            default_months_ahead: 6,
        }
    }
}

impl PredictorConfig {
    /// Load config overrides from environment (best-effort).
    ///
    /// Supported:
    /// - HEALTHTWIN_RISK_THRESHOLD
    /// - HEALTHTWIN_MODERATE_THRESHOLD
    /// - HEALTHTWIN_URGENT_THRESHOLD
    /// - HEALTHTWIN_EARLY_WARNING_DAYS
    /// - HEALTHTWIN_DEFAULT_MONTHS_AHEAD
    ///
    /// Unparseable or out-of-range values are ignored.
    #[must_use]
    pub fn from_env_or_default() -> Self {
        let mut cfg = Self::default();

        if let Some(x) = env_score("HEALTHTWIN_RISK_THRESHOLD") {
            cfg.risk_threshold = x;
        }
        if let Some(x) = env_score("HEALTHTWIN_MODERATE_THRESHOLD") {
            cfg.moderate_threshold = x;
        }
        if let Some(x) = env_score("HEALTHTWIN_URGENT_THRESHOLD") {
            cfg.urgent_threshold = x;
        }

        if let Ok(v) = std::env::var("HEALTHTWIN_EARLY_WARNING_DAYS") {
            if let Ok(days) = v.trim().parse::<i64>() {
                if EARLY_WARNING_DAYS_RANGE.contains(&days) {
                    cfg.early_warning_days = days;
                }
            }
        }

        if let Ok(v) = std::env::var("HEALTHTWIN_DEFAULT_MONTHS_AHEAD") {
            if let Ok(months) = v.trim().parse::<u32>() {
                cfg.default_months_ahead = months;
            }
        }

        if cfg.moderate_threshold > cfg.risk_threshold {
            tracing::warn!(
                "Moderate threshold {} exceeds risk threshold {}; using risk threshold",
                cfg.moderate_threshold,
                cfg.risk_threshold
            );
            cfg.moderate_threshold = cfg.risk_threshold;
        }

        cfg
    }

    /// Copy of this config with a caller-supplied high-risk threshold.
    #[must_use]
    pub fn with_risk_threshold(&self, threshold: f64) -> Self {
        Self {
            risk_threshold: threshold,
            moderate_threshold: self.moderate_threshold.min(threshold),
            ..self.clone()
        }
    }
}

/// Whether a value is usable as a score threshold.
#[must_use]
pub fn is_valid_threshold(value: f64) -> bool {
    value.is_finite() && (0.0..=1.0).contains(&value)
}

fn env_score(name: &str) -> Option<f64> {
    let v = std::env::var(name).ok()?;
    let x = v.trim().parse::<f64>().ok()?;
    is_valid_threshold(x).then_some(x)
}
