use log::info;

use crate::error::{AppError, Result};
use super::answers::Evaluation;

/// Clamp a raw oracle sub-score into [0, 100]. The oracle occasionally
/// returns values outside the requested range.
pub fn clamp_score(raw: f64) -> f64 {
    if raw.is_nan() {
        return 0.0;
    }
    raw.clamp(0.0, 100.0)
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Combine per-question evaluations and the accumulated proctoring penalty
/// into the final session score:
///
///   per-answer average = mean(relevance, clarity, grammar, confidence)
///   before penalty     = mean(per-answer averages)
///   overall            = max(0, before penalty - penalty), one decimal
///
/// An empty evaluation list is rejected instead of dividing by zero.
pub fn overall_score(evaluations: &[Evaluation], penalty_percent: f64) -> Result<f64> {
    if evaluations.is_empty() {
        return Err(AppError::Validation(
            "cannot score a session with no evaluated answers".to_string(),
        ));
    }

    let before_penalty: f64 = evaluations
        .iter()
        .map(|e| {
            (clamp_score(e.relevance)
                + clamp_score(e.clarity)
                + clamp_score(e.grammar)
                + clamp_score(e.confidence))
                / 4.0
        })
        .sum::<f64>()
        / evaluations.len() as f64;

    let overall = round_one_decimal((before_penalty - penalty_percent.max(0.0)).max(0.0));

    info!(
        "Scored {} answers: {:.1} before penalty, -{} penalty, {:.1} overall",
        evaluations.len(),
        before_penalty,
        penalty_percent,
        overall
    );

    Ok(overall)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(relevance: f64, clarity: f64, grammar: f64, confidence: f64) -> Evaluation {
        Evaluation {
            relevance,
            clarity,
            grammar,
            confidence,
            feedback: String::new(),
        }
    }

    #[test]
    fn averages_then_subtracts_penalty() {
        // Every answer averages 80; two tab switches and one device warning
        // give a penalty of 20, leaving 60.0.
        let evals = vec![eval(80.0, 80.0, 80.0, 80.0); 5];
        assert_eq!(overall_score(&evals, 20.0).unwrap(), 60.0);
    }

    #[test]
    fn zero_penalty_is_plain_average() {
        let evals = vec![eval(90.0, 70.0, 80.0, 60.0), eval(100.0, 100.0, 100.0, 100.0)];
        // (75 + 100) / 2 = 87.5
        assert_eq!(overall_score(&evals, 0.0).unwrap(), 87.5);
    }

    #[test]
    fn floors_at_zero_when_penalty_exceeds_average() {
        let evals = vec![eval(10.0, 10.0, 10.0, 10.0)];
        assert_eq!(overall_score(&evals, 50.0).unwrap(), 0.0);
    }

    #[test]
    fn rounds_to_one_decimal() {
        let evals = vec![eval(77.0, 77.0, 77.0, 78.0)];
        // average 77.25 -> 77.3 after rounding
        assert_eq!(overall_score(&evals, 0.0).unwrap(), 77.3);
    }

    #[test]
    fn clamps_out_of_range_oracle_scores() {
        let evals = vec![eval(150.0, -20.0, 100.0, 100.0)];
        // clamped to (100 + 0 + 100 + 100) / 4 = 75
        assert_eq!(overall_score(&evals, 0.0).unwrap(), 75.0);
    }

    #[test]
    fn empty_evaluations_is_an_error() {
        match overall_score(&[], 0.0) {
            Err(AppError::Validation(_)) => {}
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn result_stays_in_bounds() {
        let evals = vec![eval(100.0, 100.0, 100.0, 100.0)];
        let score = overall_score(&evals, 0.0).unwrap();
        assert!((0.0..=100.0).contains(&score));
        let score = overall_score(&evals, 500.0).unwrap();
        assert!((0.0..=100.0).contains(&score));
    }
}
