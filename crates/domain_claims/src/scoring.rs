//! Score normalization
//!
//! The pipeline reports probabilities and confidences as fractions and scores
//! as percentages; stored documents are not consistent about which is which.
//! [`normalize`] brings every field onto the percent scale and records that it
//! did so, which makes it idempotent.

use crate::analysis::{ScoreCard, ScoreScale};

/// Weight of the rule-engine score in the combined score
pub const RULE_WEIGHT: f64 = 0.6;
/// Weight of the ML probability in the combined score
pub const ML_WEIGHT: f64 = 0.4;

/// Clamps a percentage into [0,100]; missing or NaN becomes 0
fn percent(value: Option<f64>) -> f64 {
    match value {
        Some(v) if !v.is_nan() => v.clamp(0.0, 100.0),
        _ => 0.0,
    }
}

/// Scales a fraction in [0,1] to percent; values already above 1 are taken as
/// percentages
fn fraction(value: Option<f64>) -> f64 {
    match value {
        Some(v) if !v.is_nan() && v <= 1.0 => (v * 100.0).max(0.0),
        other => percent(other),
    }
}

/// Produces a score card whose numeric fields are all percentages in [0,100]
///
/// # Arguments
///
/// * `card` - Scores as stored, in any mix of scales
///
/// # Returns
///
/// A card marked [`ScoreScale::Percent`]. Calling it again on its own output
/// returns an equal card.
pub fn normalize(card: &ScoreCard) -> ScoreCard {
    let scale_fraction: fn(Option<f64>) -> f64 = match card.scale {
        ScoreScale::Native => fraction,
        ScoreScale::Percent => percent,
    };

    ScoreCard {
        rule_based_score: Some(percent(card.rule_based_score)),
        ml_probability: Some(scale_fraction(card.ml_probability)),
        ml_confidence: Some(scale_fraction(card.ml_confidence)),
        ml_prediction: card.ml_prediction.clone(),
        ai_fraud_score: Some(percent(card.ai_fraud_score)),
        ai_confidence: Some(scale_fraction(card.ai_confidence)),
        combined_score: Some(percent(card.combined_score)),
        scale: ScoreScale::Percent,
    }
}

/// Weighted blend of the rule score (percent) and ML probability (fraction),
/// rounded to two decimals
pub fn combine(rule_score: f64, ml_probability: f64) -> f64 {
    let blended = RULE_WEIGHT * percent(Some(rule_score))
        + ML_WEIGHT * fraction(Some(ml_probability));
    (blended * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn card(prob: Option<f64>, combined: Option<f64>) -> ScoreCard {
        ScoreCard {
            ml_probability: prob,
            combined_score: combined,
            ..ScoreCard::default()
        }
    }

    #[test]
    fn test_fraction_fields_are_scaled() {
        let out = normalize(&card(Some(0.82), Some(61.0)));
        assert!((out.ml_probability.unwrap() - 82.0).abs() < 1e-9);
        assert_eq!(out.combined_score, Some(61.0));
        assert_eq!(out.scale, ScoreScale::Percent);
    }

    #[test]
    fn test_percent_values_pass_through() {
        let out = normalize(&card(Some(47.0), None));
        assert_eq!(out.ml_probability, Some(47.0));
    }

    #[test]
    fn test_missing_and_nan_become_zero() {
        let out = normalize(&card(None, Some(f64::NAN)));
        assert_eq!(out.ml_probability, Some(0.0));
        assert_eq!(out.combined_score, Some(0.0));
        assert_eq!(out.rule_based_score, Some(0.0));
    }

    #[test]
    fn test_out_of_range_is_clamped() {
        let out = normalize(&card(Some(-0.5), Some(250.0)));
        assert_eq!(out.ml_probability, Some(0.0));
        assert_eq!(out.combined_score, Some(100.0));
    }

    #[test]
    fn test_small_percent_is_not_rescaled_twice() {
        let once = normalize(&card(Some(0.0078125), None));
        assert_eq!(once.ml_probability, Some(0.78125));
        let twice = normalize(&once);
        assert_eq!(twice.ml_probability, Some(0.78125));
    }

    #[test]
    fn test_combine_weights() {
        assert_eq!(combine(80.0, 0.5), 68.0);
        assert_eq!(combine(0.0, 0.0), 0.0);
        assert_eq!(combine(33.333, 0.1234), 24.94);
    }

    fn any_score() -> impl Strategy<Value = Option<f64>> {
        prop_oneof![
            Just(None),
            Just(Some(f64::NAN)),
            (-50.0f64..200.0).prop_map(Some),
            (0.0f64..=1.0).prop_map(Some),
        ]
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(
            rule in any_score(),
            prob in any_score(),
            conf in any_score(),
            ai in any_score(),
            ai_conf in any_score(),
            combined in any_score(),
        ) {
            let card = ScoreCard {
                rule_based_score: rule,
                ml_probability: prob,
                ml_confidence: conf,
                ml_prediction: None,
                ai_fraud_score: ai,
                ai_confidence: ai_conf,
                combined_score: combined,
                scale: ScoreScale::Native,
            };
            let once = normalize(&card);
            let twice = normalize(&once);
            prop_assert_eq!(&once, &twice);
        }

        #[test]
        fn normalized_fields_are_percentages(prob in any_score(), combined in any_score()) {
            let out = normalize(&card(prob, combined));
            for v in [out.ml_probability, out.combined_score, out.rule_based_score] {
                let v = v.unwrap();
                prop_assert!((0.0..=100.0).contains(&v));
            }
        }
    }
}
