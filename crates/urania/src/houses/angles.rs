//! Ascendant and midheaven from sidereal time.

use crate::angle::normalize_degrees;
use crate::ephemeris::GeoLocation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const UNIX_EPOCH_JD: f64 = 2_440_587.5;
const J2000_JD: f64 = 2_451_545.0;
/// Keeps `tan(latitude)` finite at the poles.
const MAX_LATITUDE: f64 = 89.999;

/// The chart's angles plus the local sidereal time they were derived from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartAngles {
    pub ascendant: f64,
    pub midheaven: f64,
    pub local_sidereal_time: f64,
}

pub fn julian_day(at: DateTime<Utc>) -> f64 {
    at.timestamp_millis() as f64 / 86_400_000.0 + UNIX_EPOCH_JD
}

/// Greenwich mean sidereal time in degrees.
pub fn greenwich_sidereal_time(jd: f64) -> f64 {
    let d = jd - J2000_JD;
    let t = d / 36_525.0;
    normalize_degrees(
        280.460_618_37 + 360.985_647_366_29 * d + 0.000_387_933 * t * t
            - t * t * t / 38_710_000.0,
    )
}

/// Mean obliquity of the ecliptic in degrees.
pub fn obliquity(jd: f64) -> f64 {
    let t = (jd - J2000_JD) / 36_525.0;
    23.439_291 - 0.013_004_2 * t
}

pub fn chart_angles(at: DateTime<Utc>, location: GeoLocation) -> ChartAngles {
    let jd = julian_day(at);
    let lst = normalize_degrees(greenwich_sidereal_time(jd) + location.lng);
    let eps = obliquity(jd).to_radians();
    let phi = location.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let theta = lst.to_radians();

    let midheaven = normalize_degrees(theta.sin().atan2(theta.cos() * eps.cos()).to_degrees());
    let ascendant = normalize_degrees(
        theta
            .cos()
            .atan2(-(theta.sin() * eps.cos() + phi.tan() * eps.sin()))
            .to_degrees(),
    );

    ChartAngles {
        ascendant,
        midheaven,
        local_sidereal_time: lst,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::angle::circular_distance;
    use chrono::TimeZone;

    #[test]
    fn test_gmst_at_j2000() {
        assert!((greenwich_sidereal_time(J2000_JD) - 280.460_618_37).abs() < 1e-9);
    }

    #[test]
    fn test_midheaven_tracks_sidereal_time_at_equinox_points() {
        // When LST is 0° the MC sits at 0° Aries; at 90° it sits at 0° Cancer.
        let eps = obliquity(J2000_JD).to_radians();
        for (lst, expected) in [(0.0_f64, 0.0), (90.0, 90.0), (180.0, 180.0)] {
            let theta = lst.to_radians();
            let mc = normalize_degrees(theta.sin().atan2(theta.cos() * eps.cos()).to_degrees());
            assert!(circular_distance(mc, expected) < 1e-6);
        }
    }

    #[test]
    fn test_ascendant_leads_midheaven() {
        let at = Utc.with_ymd_and_hms(1990, 6, 15, 14, 30, 0).unwrap();
        let angles = chart_angles(at, GeoLocation { lat: 40.7, lng: -74.0 });
        // The ascendant is always east of the MC, less than 180° ahead.
        let lead = normalize_degrees(angles.ascendant - angles.midheaven);
        assert!(lead > 0.0 && lead < 180.0, "lead {lead}");
    }

    #[test]
    fn test_equator_ascendant_is_ninety_from_mc_at_equinox() {
        let at = Utc.with_ymd_and_hms(2000, 1, 1, 12, 0, 0).unwrap();
        let angles = chart_angles(at, GeoLocation { lat: 0.0, lng: 79.539_381_63 });
        // LST = 0°, equator: ASC = 90°, MC = 0°.
        assert!(circular_distance(angles.midheaven, 0.0) < 1e-6);
        assert!(circular_distance(angles.ascendant, 90.0) < 1e-6);
    }
}
