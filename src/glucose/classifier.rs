//! Glucose band classification.
//!
//! A single reading (mg/dL) is mapped to two independent views: a
//! fasting-referenced "before meal" band and a post-prandial "after meal"
//! band. Both tables use right-open intervals checked in ascending order.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Before-meal (fasting) lower bounds, mg/dL.
pub const SEVERE_HYPO_BELOW: f64 = 54.0;
pub const MILD_HYPO_BELOW: f64 = 70.0;
pub const FASTING_NORMAL_BELOW: f64 = 100.0;
pub const FASTING_PREDIABETES_BELOW: f64 = 126.0;

/// After-meal (post-prandial) lower bounds, mg/dL.
pub const POST_MEAL_NORMAL_BELOW: f64 = 140.0;
pub const POST_MEAL_PREDIABETES_BELOW: f64 = 200.0;

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ClassifyError {
    /// NaN or infinite readings never map into a band.
    #[error("invalid glucose value {0}: must be a finite number of mg/dL")]
    InvalidInput(f64),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum BeforeMealBand {
    SevereHypoglycemia,
    MildHypoglycemia,
    Normal,
    PreDiabetes,
    Hyperglycemia,
}

impl BeforeMealBand {
    pub fn label(&self) -> &'static str {
        match self {
            BeforeMealBand::SevereHypoglycemia => "Severe hypoglycemia",
            BeforeMealBand::MildHypoglycemia => "Mild hypoglycemia",
            BeforeMealBand::Normal => "Normal",
            BeforeMealBand::PreDiabetes => "Pre-diabetes",
            BeforeMealBand::Hyperglycemia => "Hyperglycemia",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum AfterMealBand {
    Normal,
    PreDiabetes,
    Hyperglycemia,
}

impl AfterMealBand {
    pub fn label(&self) -> &'static str {
        match self {
            AfterMealBand::Normal => "Normal",
            AfterMealBand::PreDiabetes => "Pre-diabetes",
            AfterMealBand::Hyperglycemia => "Hyperglycemia",
        }
    }
}

/// Both views of one reading. Not alternatives: a value is always in exactly
/// one band of each table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub before_meal: BeforeMealBand,
    pub after_meal: AfterMealBand,
}

impl Classification {
    /// One-line status for the home screen.
    pub fn summary(&self) -> &'static str {
        match self.before_meal {
            BeforeMealBand::SevereHypoglycemia => "Glucose level critically low",
            BeforeMealBand::MildHypoglycemia => "Glucose level below range",
            BeforeMealBand::Normal => "Glucose level in range and normal",
            BeforeMealBand::PreDiabetes => "Glucose level above fasting range",
            BeforeMealBand::Hyperglycemia => "Glucose level high",
        }
    }
}

fn ensure_finite(value: f64) -> Result<f64, ClassifyError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ClassifyError::InvalidInput(value))
    }
}

pub fn classify_before_meal(value: f64) -> Result<BeforeMealBand, ClassifyError> {
    let value = ensure_finite(value)?;
    let band = if value < SEVERE_HYPO_BELOW {
        BeforeMealBand::SevereHypoglycemia
    } else if value < MILD_HYPO_BELOW {
        BeforeMealBand::MildHypoglycemia
    } else if value < FASTING_NORMAL_BELOW {
        BeforeMealBand::Normal
    } else if value < FASTING_PREDIABETES_BELOW {
        BeforeMealBand::PreDiabetes
    } else {
        BeforeMealBand::Hyperglycemia
    };
    Ok(band)
}

pub fn classify_after_meal(value: f64) -> Result<AfterMealBand, ClassifyError> {
    let value = ensure_finite(value)?;
    let band = if value < POST_MEAL_NORMAL_BELOW {
        AfterMealBand::Normal
    } else if value < POST_MEAL_PREDIABETES_BELOW {
        AfterMealBand::PreDiabetes
    } else {
        AfterMealBand::Hyperglycemia
    };
    Ok(band)
}

/// Classify a reading in mg/dL. Negative or implausibly high values are
/// still classified; only non-finite input is rejected.
pub fn classify(value: f64) -> Result<Classification, ClassifyError> {
    Ok(Classification {
        before_meal: classify_before_meal(value)?,
        after_meal: classify_after_meal(value)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn both(value: f64) -> (BeforeMealBand, AfterMealBand) {
        let result = classify(value).unwrap();
        (result.before_meal, result.after_meal)
    }

    #[test]
    fn boundaries_belong_to_the_upper_band() {
        assert_eq!(classify_before_meal(54.0), Ok(BeforeMealBand::MildHypoglycemia));
        assert_eq!(classify_before_meal(70.0), Ok(BeforeMealBand::Normal));
        assert_eq!(classify_before_meal(100.0), Ok(BeforeMealBand::PreDiabetes));
        assert_eq!(classify_before_meal(126.0), Ok(BeforeMealBand::Hyperglycemia));
        assert_eq!(classify_after_meal(140.0), Ok(AfterMealBand::PreDiabetes));
        assert_eq!(classify_after_meal(200.0), Ok(AfterMealBand::Hyperglycemia));
    }

    #[test]
    fn just_below_boundaries_stay_in_the_lower_band() {
        assert_eq!(classify_before_meal(53.9), Ok(BeforeMealBand::SevereHypoglycemia));
        assert_eq!(classify_before_meal(69.99), Ok(BeforeMealBand::MildHypoglycemia));
        assert_eq!(classify_before_meal(99.5), Ok(BeforeMealBand::Normal));
        assert_eq!(classify_before_meal(125.9), Ok(BeforeMealBand::PreDiabetes));
        assert_eq!(classify_after_meal(139.9), Ok(AfterMealBand::Normal));
        assert_eq!(classify_after_meal(199.9), Ok(AfterMealBand::PreDiabetes));
    }

    #[test]
    fn concrete_readings() {
        assert_eq!(both(112.0), (BeforeMealBand::PreDiabetes, AfterMealBand::Normal));
        assert_eq!(both(45.0), (BeforeMealBand::SevereHypoglycemia, AfterMealBand::Normal));
        assert_eq!(both(95.0), (BeforeMealBand::Normal, AfterMealBand::Normal));
        assert_eq!(both(150.0), (BeforeMealBand::Hyperglycemia, AfterMealBand::PreDiabetes));
        assert_eq!(both(250.0), (BeforeMealBand::Hyperglycemia, AfterMealBand::Hyperglycemia));
    }

    #[test]
    fn implausible_values_are_still_classified() {
        assert_eq!(both(-20.0), (BeforeMealBand::SevereHypoglycemia, AfterMealBand::Normal));
        assert_eq!(both(0.0), (BeforeMealBand::SevereHypoglycemia, AfterMealBand::Normal));
        assert_eq!(both(5_000.0), (BeforeMealBand::Hyperglycemia, AfterMealBand::Hyperglycemia));
    }

    #[test]
    fn rejects_non_finite_input() {
        assert!(matches!(classify(f64::NAN), Err(ClassifyError::InvalidInput(_))));
        assert_eq!(
            classify(f64::INFINITY),
            Err(ClassifyError::InvalidInput(f64::INFINITY))
        );
        assert_eq!(
            classify_after_meal(f64::NEG_INFINITY),
            Err(ClassifyError::InvalidInput(f64::NEG_INFINITY))
        );
    }

    #[test]
    fn summary_follows_fasting_band() {
        let normal = classify(95.0).unwrap();
        assert_eq!(normal.summary(), "Glucose level in range and normal");
        assert_eq!(normal.before_meal.label(), "Normal");
        assert_eq!(classify(40.0).unwrap().before_meal.label(), "Severe hypoglycemia");
    }

    #[test]
    fn bands_serialize_as_camel_case() {
        let json = serde_json::to_value(classify(150.0).unwrap()).unwrap();
        assert_eq!(json["beforeMeal"], "hyperglycemia");
        assert_eq!(json["afterMeal"], "preDiabetes");
    }
}
