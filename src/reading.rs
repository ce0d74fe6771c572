//! Reading assembly and plausibility-gated validation.
//!
//! `assemble` turns the ordered per-digit predictions into a decimal value
//! and an aggregate confidence. `validate` then treats that reading as
//! untrusted evidence: it must clear a per-digit confidence floor and be a
//! plausible, monotonic increment over the last known good value. Rejection
//! is a normal terminal outcome, not an error, and never touches the
//! last-known-good store.

use crate::classify::DigitPrediction;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One assembled meter reading. Transient, recomputed every cycle, never
/// mutated after assembly.
#[derive(Clone, Debug)]
pub struct Reading {
    /// Per-digit predictions, most significant first.
    pub digits: Vec<DigitPrediction>,
    /// The physical value: digit string divided by 10^decimal_places.
    pub value: f64,
    /// Product of the squares of the per-digit confidences. A strict
    /// AND-like combinator: one weak digit collapses the aggregate.
    pub aggregate_confidence: f32,
}

/// Combine ordered digit predictions into a decimal reading.
pub fn assemble(digits: Vec<DigitPrediction>, decimal_places: u32) -> Reading {
    let mut integer = 0u64;
    for p in &digits {
        integer = integer * 10 + p.digit as u64;
    }
    let value = integer as f64 / 10f64.powi(decimal_places as i32);
    let aggregate_confidence = digits
        .iter()
        .map(|p| p.confidence * p.confidence)
        .product();
    Reading {
        digits,
        value,
        aggregate_confidence,
    }
}

/// Validation policy knobs.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidateOptions {
    /// Largest plausible increase between two polls, in meter units.
    pub max_delta: f64,
    /// Hard floor on the minimum per-digit confidence.
    pub confidence_floor: f32,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            max_delta: 5.0,
            confidence_floor: 0.8,
        }
    }
}

/// Why a reading was turned down. These are outcomes, not faults.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub enum RejectReason {
    /// Some digit fell below the confidence floor.
    LowConfidence { confidence: f32, floor: f32 },
    /// The value is not a plausible increment over the last known good one.
    ImplausibleValue {
        value: f64,
        last_known_good: f64,
        max_delta: f64,
    },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::LowConfidence { confidence, floor } => {
                write!(f, "digit confidence {confidence:.3} below floor {floor:.3}")
            }
            RejectReason::ImplausibleValue {
                value,
                last_known_good,
                max_delta,
            } => write!(
                f,
                "value {value:.2} implausible against last known good \
                 {last_known_good:.2} (max delta {max_delta:.2})"
            ),
        }
    }
}

/// Terminal outcome of a detection cycle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub enum Verdict {
    Accepted { value: f64 },
    Rejected { reason: RejectReason },
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted { .. })
    }
}

/// Accept or reject a reading against the last known good value.
///
/// The confidence floor and the value-plausibility bound are independent
/// checks; either alone rejects, and their evaluation order cannot change
/// the outcome. `force` overrides both (used after a manual meter swap or
/// calibration change). With no last known good value on record the value
/// check passes vacuously.
pub fn validate(
    reading: &Reading,
    last_known_good: Option<f64>,
    opts: &ValidateOptions,
    force: bool,
) -> Verdict {
    if force {
        warn!("force-accepting reading {:.2}", reading.value);
        return Verdict::Accepted {
            value: reading.value,
        };
    }

    let weakest = reading
        .digits
        .iter()
        .map(|p| p.confidence)
        .fold(f32::INFINITY, f32::min);
    let confident = reading.digits.is_empty() || weakest >= opts.confidence_floor;

    let plausible = match last_known_good {
        Some(last) => reading.value >= last && reading.value - last < opts.max_delta,
        None => true,
    };

    if !confident {
        return Verdict::Rejected {
            reason: RejectReason::LowConfidence {
                confidence: weakest,
                floor: opts.confidence_floor,
            },
        };
    }
    if !plausible {
        return Verdict::Rejected {
            reason: RejectReason::ImplausibleValue {
                value: reading.value,
                last_known_good: last_known_good.unwrap_or(f64::NAN),
                max_delta: opts.max_delta,
            },
        };
    }
    info!(
        "reading {:.2} accepted (aggregate confidence {:.3})",
        reading.value, reading.aggregate_confidence
    );
    Verdict::Accepted {
        value: reading.value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prediction(digit: u8, confidence: f32) -> DigitPrediction {
        DigitPrediction { digit, confidence }
    }

    fn reading_of(digits: &[u8], confidence: f32) -> Reading {
        assemble(
            digits.iter().map(|&d| prediction(d, confidence)).collect(),
            2,
        )
    }

    #[test]
    fn assemble_computes_decimal_value() {
        let r = reading_of(&[0, 0, 7, 4, 5, 2, 3], 1.0);
        assert!((r.value - 745.23).abs() < 1e-9);
    }

    #[test]
    fn assemble_is_deterministic() {
        let a = reading_of(&[1, 2, 3], 0.9);
        let b = reading_of(&[1, 2, 3], 0.9);
        assert_eq!(a.value, b.value);
        assert_eq!(a.aggregate_confidence, b.aggregate_confidence);
    }

    #[test]
    fn aggregate_is_product_of_squares() {
        let r = assemble(vec![prediction(1, 0.5), prediction(2, 1.0)], 0);
        assert!((r.aggregate_confidence - 0.25).abs() < 1e-6);
    }

    #[test]
    fn one_weak_digit_collapses_the_aggregate() {
        let mut digits = vec![prediction(9, 1.0); 6];
        digits.push(prediction(9, 0.1));
        let r = assemble(digits, 2);
        assert!(r.aggregate_confidence < 0.011);
    }

    #[test]
    fn monotonic_increment_is_accepted() {
        let opts = ValidateOptions {
            max_delta: 5.0,
            confidence_floor: 0.0,
        };
        let r = reading_of(&[0, 0, 1, 0, 0, 0, 0], 1.0); // 100.00
        assert!(validate(&r, Some(99.50), &opts, false).is_accepted());
    }

    #[test]
    fn decrease_is_rejected() {
        let opts = ValidateOptions {
            max_delta: 5.0,
            confidence_floor: 0.0,
        };
        let r = reading_of(&[0, 0, 0, 9, 0, 0, 0], 1.0); // 90.00
        let verdict = validate(&r, Some(99.50), &opts, false);
        assert!(matches!(
            verdict,
            Verdict::Rejected {
                reason: RejectReason::ImplausibleValue { .. }
            }
        ));
    }

    #[test]
    fn excessive_jump_is_rejected() {
        let opts = ValidateOptions {
            max_delta: 5.0,
            confidence_floor: 0.0,
        };
        let r = reading_of(&[0, 0, 1, 1, 0, 0, 0], 1.0); // 110.00
        assert!(!validate(&r, Some(99.50), &opts, false).is_accepted());
    }

    #[test]
    fn force_accepts_even_a_decrease() {
        let opts = ValidateOptions::default();
        let r = reading_of(&[0, 0, 0, 9, 0, 0, 0], 0.1); // 90.00, low confidence too
        assert!(validate(&r, Some(99.50), &opts, true).is_accepted());
    }

    #[test]
    fn confidence_floor_rejects_independently_of_value() {
        let opts = ValidateOptions {
            max_delta: 5.0,
            confidence_floor: 0.6,
        };
        let mut digits = vec![prediction(0, 0.95); 6];
        digits.push(prediction(5, 0.40));
        let r = assemble(digits, 2); // value 0.05, plausible against 0.0
        let verdict = validate(&r, Some(0.0), &opts, false);
        assert!(matches!(
            verdict,
            Verdict::Rejected {
                reason: RejectReason::LowConfidence { .. }
            }
        ));
    }

    #[test]
    fn first_cycle_without_history_is_accepted() {
        let opts = ValidateOptions::default();
        let r = reading_of(&[1, 2, 3], 1.0);
        assert!(validate(&r, None, &opts, false).is_accepted());
    }
}
