//! Angular arithmetic over the 360° ecliptic circle.
//!
//! Every longitude in the engine is an absolute degree in `[0, 360)`. The helpers here are the
//! only place where wraparound is handled, so the rest of the crate can compare angles without
//! caring about the 0°/360° seam.

use crate::western::Sign;

/// Resultant vectors shorter than this have no meaningful direction.
const MIN_RESULTANT: f64 = 1e-9;

/// Normalize degrees to [0, 360).
pub fn normalize_degrees(value: f64) -> f64 {
    let mut normalized = value % 360.0;
    if normalized < 0.0 {
        normalized += 360.0;
    }
    // -1e-17 + 360.0 rounds to 360.0
    if normalized >= 360.0 {
        normalized = 0.0;
    }
    normalized
}

/// Absolute degree from a sign and a degree within it.
pub fn to_absolute(sign: Sign, degree_in_sign: f64) -> f64 {
    normalize_degrees(sign.index() as f64 * 30.0 + degree_in_sign)
}

/// Sign and degree within the sign for an absolute degree.
pub fn to_sign_degree(absolute: f64) -> (Sign, f64) {
    let normalized = normalize_degrees(absolute);
    let index = ((normalized / 30.0).floor() as usize) % 12;
    let degree = (normalized - index as f64 * 30.0).clamp(0.0, 30.0 - f64::EPSILON * 32.0);
    (Sign::from_index(index), degree)
}

/// Shortest angular separation, in [0, 180].
pub fn circular_distance(a: f64, b: f64) -> f64 {
    let d = (a - b).abs() % 360.0;
    d.min(360.0 - d)
}

/// Signed shortest rotation from `from` to `to`, in (-180, 180].
pub fn signed_delta(from: f64, to: f64) -> f64 {
    let d = normalize_degrees(to - from);
    if d > 180.0 {
        d - 360.0
    } else {
        d
    }
}

/// Counter-clockwise (zodiacal) arc length walking from `from` to `to`, in [0, 360).
pub fn forward_arc(from: f64, to: f64) -> f64 {
    normalize_degrees(to - from)
}

/// Whether `degree` lies on the half-open arc `[start, end)` walked forward from `start`.
///
/// Works for arcs crossing 0°: the arc 350°→10° contains 355° and 5° but not 20°.
pub fn arc_contains(start: f64, end: f64, degree: f64) -> bool {
    let span = forward_arc(start, end);
    let offset = forward_arc(start, degree);
    offset < span
}

/// Circular mean of a set of longitudes.
///
/// Each degree becomes a unit vector; the vectors are averaged and converted back with `atan2`.
/// Returns `None` for an empty slice or when the vectors cancel out (e.g. `[0, 180]`).
pub fn circular_mean(degrees: &[f64]) -> Option<f64> {
    if degrees.is_empty() {
        return None;
    }
    let (sum_sin, sum_cos) = degrees.iter().fold((0.0_f64, 0.0_f64), |(s, c), deg| {
        let rad = deg.to_radians();
        (s + rad.sin(), c + rad.cos())
    });
    let n = degrees.len() as f64;
    let (mean_sin, mean_cos) = (sum_sin / n, sum_cos / n);
    if mean_sin.hypot(mean_cos) < MIN_RESULTANT {
        return None;
    }
    let mean = normalize_degrees(mean_sin.atan2(mean_cos).to_degrees());
    // Snap float noise around the seam so [359, 1] averages to exactly 0.
    if mean < MIN_RESULTANT || 360.0 - mean < MIN_RESULTANT {
        Some(0.0)
    } else {
        Some(mean)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_negative_and_large() {
        assert_eq!(normalize_degrees(-30.0), 330.0);
        assert_eq!(normalize_degrees(725.0), 5.0);
        assert_eq!(normalize_degrees(360.0), 0.0);
    }

    #[test]
    fn test_round_trip_every_sign() {
        for index in 0..12 {
            let sign = Sign::from_index(index);
            for degree in [0.0, 0.5, 12.25, 29.5] {
                let (back_sign, back_degree) = to_sign_degree(to_absolute(sign, degree));
                assert_eq!(back_sign, sign);
                assert!((back_degree - degree).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_circular_distance_wraps() {
        assert_eq!(circular_distance(130.0, 40.0), 90.0);
        assert_eq!(circular_distance(350.0, 10.0), 20.0);
        assert_eq!(circular_distance(0.0, 180.0), 180.0);
    }

    #[test]
    fn test_arc_contains_across_zero() {
        assert!(arc_contains(350.0, 10.0, 355.0));
        assert!(arc_contains(350.0, 10.0, 5.0));
        assert!(arc_contains(350.0, 10.0, 350.0));
        assert!(!arc_contains(350.0, 10.0, 10.0));
        assert!(!arc_contains(350.0, 10.0, 20.0));
    }

    #[test]
    fn test_circular_mean_seam() {
        assert_eq!(circular_mean(&[359.0, 1.0]), Some(0.0));
        let mean = circular_mean(&[350.0, 20.0]).unwrap();
        assert!((mean - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_circular_mean_undefined() {
        assert_eq!(circular_mean(&[]), None);
        assert_eq!(circular_mean(&[0.0, 180.0]), None);
    }

    #[test]
    fn test_signed_delta() {
        assert_eq!(signed_delta(350.0, 10.0), 20.0);
        assert_eq!(signed_delta(10.0, 350.0), -20.0);
    }
}
