//! Recommendation lists for predicted outcomes.
//!
//! Lists are deterministic in the features and predicted value; entries keep
//! insertion order.

use super::features::{AdultFeatures, ChildFeatures};

/// Adherence below this fraction triggers adherence support.
pub const ADHERENCE_SUPPORT_THRESHOLD: f64 = 0.8;

/// Blood pressure management recommendations.
#[must_use]
pub fn bp_recommendations(predicted_systolic: f64, features: &AdultFeatures) -> Vec<String> {
    let mut recommendations = Vec::new();

    if predicted_systolic >= 160.0 {
        recommendations.push("Urgent medical evaluation required".to_string());
        recommendations.push("Consider hospital admission if symptomatic".to_string());
    } else if predicted_systolic >= 140.0 {
        recommendations.push("Intensify antihypertensive therapy".to_string());
        recommendations.push("Monitor blood pressure weekly".to_string());
    }

    if !features.on_treatment && predicted_systolic >= 140.0 {
        recommendations.push("Start antihypertensive treatment".to_string());
    }

    if features.smoking {
        recommendations.push("Smoking cessation counselling - high priority".to_string());
    }

    if features.diabetes {
        recommendations.push("Optimise diabetes management".to_string());
        recommendations.push("Target blood pressure below 130/80 mmHg".to_string());
    }

    if features.adherence < ADHERENCE_SUPPORT_THRESHOLD {
        recommendations.push("Improve treatment adherence support through education".to_string());
    }

    recommendations.push("Regular physical activity and dietary modification".to_string());

    recommendations
}

/// Nutrition and growth recommendations.
#[must_use]
pub fn haz_recommendations(predicted_haz: f64, features: &ChildFeatures) -> Vec<String> {
    let mut recommendations = Vec::new();

    if predicted_haz < -3.0 {
        recommendations.push("Urgent nutrition intervention required".to_string());
        recommendations.push("Consider a therapeutic feeding program".to_string());
    } else if predicted_haz < -2.0 {
        recommendations.push("Intensive nutrition support needed".to_string());
        recommendations.push("Monitor growth monthly".to_string());
    }

    if features.age_months < 24.0 {
        recommendations.push("Focus on the first 1000 days - critical window".to_string());
    }

    if !features.exclusive_breastfeeding && features.age_months < 6.0 {
        recommendations.push("Promote exclusive breastfeeding".to_string());
    }

    if !features.complementary_feeding && features.age_months >= 6.0 {
        recommendations.push("Improve complementary feeding practices".to_string());
    }

    if features.hemoglobin < 11.0 {
        recommendations.push("Treat anemia with iron supplementation".to_string());
    }

    if !features.clean_water || !features.sanitation {
        recommendations.push("Improve water, sanitation and hygiene to prevent infection".to_string());
    }

    if !features.on_program {
        recommendations.push("Enrol in a nutrition support program".to_string());
    }

    recommendations
}

/// Recommendations attached to a heuristic adult prediction.
#[must_use]
pub fn bp_heuristic_recommendations() -> Vec<String> {
    vec![
        "Routine blood pressure monitoring recommended".to_string(),
        "Consider lifestyle changes".to_string(),
    ]
}

/// Recommendations attached to a heuristic child prediction.
#[must_use]
pub fn haz_heuristic_recommendations() -> Vec<String> {
    vec![
        "Monitor growth routinely".to_string(),
        "Ensure adequate nutrition intake".to_string(),
    ]
}
