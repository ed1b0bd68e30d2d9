//! Swiss Ephemeris backend, enabled with the `swisseph` feature.

use super::types::{BodyReading, EphemerisSnapshot};
use super::EphemerisProvider;
use crate::error::EphemerisError;
use crate::western::{Body, Position};
use chrono::{DateTime, Datelike, Timelike, Utc};
use std::env;
use std::path::PathBuf;
use swisseph::swe::{calc_ut, julday};

// SUN=0 .. PLUTO=9, TRUE_NODE=11, CHIRON=15
const BODY_CODES: &[(Body, u32)] = &[
    (Body::Sun, 0),
    (Body::Moon, 1),
    (Body::Mercury, 2),
    (Body::Venus, 3),
    (Body::Mars, 4),
    (Body::Jupiter, 5),
    (Body::Saturn, 6),
    (Body::Uranus, 7),
    (Body::Neptune, 8),
    (Body::Pluto, 9),
    (Body::NorthNode, 11),
    (Body::Chiron, 15),
];

/// FLG_SWIEPH | FLG_SPEED
const FLAGS: u32 = 2 | 256;

pub struct SwissEphemerisAdapter {
    _ephemeris_path: PathBuf,
}

impl SwissEphemerisAdapter {
    /// Create a new adapter with optional ephemeris path
    pub fn new(ephemeris_path: Option<PathBuf>) -> Result<Self, EphemerisError> {
        let path = ephemeris_path.unwrap_or_else(|| {
            env::var("SWISS_EPHEMERIS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("/usr/local/share/swisseph"))
        });

        if !path.exists() {
            return Err(EphemerisError::FileNotFound {
                path: path.display().to_string(),
                message: "Ephemeris path does not exist. Please ensure Swiss Ephemeris data files are installed.".to_string(),
            });
        }

        Ok(Self {
            _ephemeris_path: path,
        })
    }

    fn reading(&self, body: Body, code: u32, jd: f64, at: DateTime<Utc>) -> Result<BodyReading, EphemerisError> {
        let result = calc_ut(jd, code, FLAGS).map_err(|e| EphemerisError::CalculationFailed {
            body,
            at,
            message: format!("Swiss Ephemeris error: {}", e),
        })?;
        let longitude = result.out[0];
        let speed = result.out[3];
        Ok(BodyReading::new(Position::from_absolute(longitude), speed < 0.0).with_speed(speed))
    }
}

impl EphemerisProvider for SwissEphemerisAdapter {
    fn name(&self) -> &str {
        "swisseph"
    }

    fn positions(&self, at: DateTime<Utc>) -> Result<EphemerisSnapshot, EphemerisError> {
        let jd = datetime_to_julian_day(at);
        let mut snapshot = EphemerisSnapshot::new(at);
        for &(body, code) in BODY_CODES {
            match self.reading(body, code, jd, at) {
                Ok(reading) => {
                    snapshot.bodies.insert(body, reading);
                }
                // Chiron needs the asteroid files; leave it out rather than fail the snapshot.
                Err(e) if body == Body::Chiron => log::debug!("skipping chiron: {}", e),
                Err(e) => return Err(e),
            }
        }
        Ok(snapshot)
    }
}

/// Convert UTC datetime to Julian Day
fn datetime_to_julian_day(dt: DateTime<Utc>) -> f64 {
    let hour_decimal =
        dt.hour() as f64 + dt.minute() as f64 / 60.0 + dt.second() as f64 / 3600.0;
    // GREG_CAL = 1
    julday(dt.year(), dt.month() as i32, dt.day() as i32, hour_decimal, 1)
}
