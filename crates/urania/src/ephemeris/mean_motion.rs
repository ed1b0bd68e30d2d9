//! Circular-orbit approximation of geocentric longitudes.
//!
//! Every planet moves on a circular heliocentric orbit at its mean motion; the geocentric
//! longitude is the direction from Earth to the planet, so retrograde loops fall out of the
//! geometry instead of being scheduled by hand. Accuracy is a few degrees at best, which is all
//! the engine needs from a default provider.

use super::types::{BodyReading, EphemerisSnapshot};
use super::EphemerisProvider;
use crate::angle::{normalize_degrees, signed_delta};
use crate::error::EphemerisError;
use crate::western::{Body, Position};
use chrono::{DateTime, TimeZone, Utc};

/// (semi-major axis in AU, mean longitude at J2000 in degrees, mean motion in degrees per day)
const ORBITS: &[(Body, f64, f64, f64)] = &[
    (Body::Mercury, 0.387_098, 252.2509, 4.092_339),
    (Body::Venus, 0.723_332, 181.9798, 1.602_131),
    (Body::Mars, 1.523_679, 355.4330, 0.524_033),
    (Body::Jupiter, 5.2026, 34.3515, 0.083_091),
    (Body::Saturn, 9.5549, 50.0774, 0.033_460),
    (Body::Uranus, 19.2184, 314.0550, 0.011_733),
    (Body::Neptune, 30.1104, 304.3487, 0.005_981),
    (Body::Pluto, 39.482, 238.9290, 0.003_968),
    (Body::Chiron, 13.648, 209.4000, 0.019_470),
];

const EARTH_LONGITUDE_J2000: f64 = 100.4645;
const EARTH_MOTION: f64 = 0.985_647_4;
const MOON_LONGITUDE_J2000: f64 = 218.3165;
const MOON_MOTION: f64 = 13.176_396_5;
const NODE_LONGITUDE_J2000: f64 = 125.0445;
const NODE_MOTION: f64 = -0.052_953_8;

/// Half-width of the finite-difference window used for speeds, in days.
const SPEED_HALF_STEP: f64 = 0.5;

fn j2000() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2000, 1, 1, 12, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Days elapsed since J2000.0, fractional.
pub fn days_since_j2000(at: DateTime<Utc>) -> f64 {
    (at - j2000()).num_milliseconds() as f64 / 86_400_000.0
}

#[derive(Debug, Clone)]
pub struct MeanMotionEphemeris {
    bodies: Vec<Body>,
}

impl MeanMotionEphemeris {
    pub fn new() -> Self {
        Self {
            bodies: Body::ALL.to_vec(),
        }
    }

    /// Restrict the snapshot to a subset of bodies.
    pub fn with_bodies(bodies: &[Body]) -> Self {
        Self {
            bodies: bodies.to_vec(),
        }
    }

    /// Geocentric ecliptic longitude of `body`, `days` after J2000.
    pub fn longitude(&self, body: Body, days: f64) -> f64 {
        match body {
            Body::Sun => normalize_degrees(EARTH_LONGITUDE_J2000 + EARTH_MOTION * days + 180.0),
            Body::Moon => normalize_degrees(MOON_LONGITUDE_J2000 + MOON_MOTION * days),
            Body::NorthNode => normalize_degrees(NODE_LONGITUDE_J2000 + NODE_MOTION * days),
            planet => {
                let (radius, l0, motion) = ORBITS
                    .iter()
                    .find(|(b, _, _, _)| *b == planet)
                    .map(|(_, a, l0, n)| (*a, *l0, *n))
                    .unwrap_or((1.0, 0.0, 0.0));
                let earth = (EARTH_LONGITUDE_J2000 + EARTH_MOTION * days).to_radians();
                let helio = (l0 + motion * days).to_radians();
                let x = radius * helio.cos() - earth.cos();
                let y = radius * helio.sin() - earth.sin();
                normalize_degrees(y.atan2(x).to_degrees())
            }
        }
    }

    /// Central-difference speed in degrees per day.
    pub fn speed(&self, body: Body, days: f64) -> f64 {
        let before = self.longitude(body, days - SPEED_HALF_STEP);
        let after = self.longitude(body, days + SPEED_HALF_STEP);
        signed_delta(before, after) / (2.0 * SPEED_HALF_STEP)
    }
}

impl Default for MeanMotionEphemeris {
    fn default() -> Self {
        Self::new()
    }
}

impl EphemerisProvider for MeanMotionEphemeris {
    fn name(&self) -> &str {
        "mean_motion"
    }

    fn positions(&self, at: DateTime<Utc>) -> Result<EphemerisSnapshot, EphemerisError> {
        let days = days_since_j2000(at);
        let mut snapshot = EphemerisSnapshot::new(at);
        for &body in &self.bodies {
            let lon = self.longitude(body, days);
            let speed = self.speed(body, days);
            snapshot.bodies.insert(
                body,
                BodyReading::new(Position::from_absolute(lon), speed < 0.0).with_speed(speed),
            );
        }
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_sun_near_capricorn_at_j2000() {
        let eph = MeanMotionEphemeris::new();
        let snap = eph.positions(j2000()).unwrap();
        let sun = snap.longitude(Body::Sun).unwrap();
        // The Sun sits around 280° (early Capricorn) on 2000-01-01.
        assert!((sun - 280.46).abs() < 0.01);
        assert_eq!(snap.bodies.len(), 12);
    }

    #[test]
    fn test_node_always_retrograde() {
        let eph = MeanMotionEphemeris::new();
        let snap = eph.positions(j2000() + Duration::days(400)).unwrap();
        assert!(snap.get(Body::NorthNode).unwrap().retrograde);
    }

    #[test]
    fn test_mercury_goes_retrograde_within_a_synodic_period() {
        let eph = MeanMotionEphemeris::with_bodies(&[Body::Mercury]);
        let retro_days = (0..120)
            .filter(|d| {
                eph.positions(j2000() + Duration::days(*d))
                    .unwrap()
                    .get(Body::Mercury)
                    .unwrap()
                    .retrograde
            })
            .count();
        assert!(retro_days > 5 && retro_days < 40, "got {retro_days}");
    }
}
