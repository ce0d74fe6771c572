//! Angle utilities shared by the line transform and rotation correction.

/// Normalizes an angle into the range [0, π).
#[inline]
pub fn normalize_half_pi(angle: f32) -> f32 {
    let mut norm = angle.rem_euclid(std::f32::consts::PI);
    if norm >= std::f32::consts::PI {
        norm -= std::f32::consts::PI;
    }
    if norm >= std::f32::consts::PI - 1e-6 {
        0.0
    } else {
        norm
    }
}

/// Axial (circular) mean of line angles in [0, π).
///
/// Line orientations are ambiguous modulo π, so a plain arithmetic mean is
/// biased for samples straddling the 0/π boundary. Doubling the angles maps
/// the axial data onto the full circle where the vector mean is well
/// defined; halving the resultant direction maps it back.
///
/// Returns `None` for an empty sample set or when the resultant vector is
/// degenerate (angles spread uniformly, no dominant direction).
pub fn axial_mean(angles: &[f32]) -> Option<f32> {
    if angles.is_empty() {
        return None;
    }
    let (mut sin_sum, mut cos_sum) = (0.0f64, 0.0f64);
    for &a in angles {
        let doubled = 2.0 * a as f64;
        sin_sum += doubled.sin();
        cos_sum += doubled.cos();
    }
    let norm = (sin_sum * sin_sum + cos_sum * cos_sum).sqrt();
    // the resultant of near-cancelling f32 samples lands around 1e-7, not
    // at machine zero; gate well above that
    if norm < 1e-6 * angles.len() as f64 {
        return None;
    }
    let mean = 0.5 * sin_sum.atan2(cos_sum);
    Some(normalize_half_pi(mean as f32))
}

/// Computes the smallest unsigned angular difference between two line
/// angles, treating antipodal directions as equivalent (π apart → 0).
#[inline]
pub fn angular_difference(a: f32, b: f32) -> f32 {
    let mut diff = (a - b).abs();
    if diff > std::f32::consts::PI {
        diff = diff.rem_euclid(std::f32::consts::PI);
    }
    if diff > std::f32::consts::FRAC_PI_2 {
        std::f32::consts::PI - diff
    } else {
        diff
    }
}
