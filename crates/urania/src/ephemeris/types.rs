use crate::western::{Body, Position};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Geographic location coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub lat: f64,
    pub lng: f64,
}

/// One body's state as reported by a provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyReading {
    pub position: Position,
    /// Whether the body is in apparent backward motion
    pub retrograde: bool,
    /// Speed in longitude (degrees per day), when the backend knows it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
}

impl BodyReading {
    pub fn new(position: Position, retrograde: bool) -> Self {
        Self {
            position,
            retrograde,
            speed: None,
        }
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = Some(speed);
        self
    }

    /// Degrees per day used to step this body forward in time.
    pub fn daily_motion(&self, body: Body) -> f64 {
        match self.speed {
            Some(speed) => speed,
            None if self.retrograde => -body.mean_daily_motion(),
            None => body.mean_daily_motion(),
        }
    }
}

/// All positions reported for a single instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EphemerisSnapshot {
    pub instant: DateTime<Utc>,
    pub bodies: BTreeMap<Body, BodyReading>,
}

impl EphemerisSnapshot {
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self {
            instant,
            bodies: BTreeMap::new(),
        }
    }

    pub fn with_body(mut self, body: Body, reading: BodyReading) -> Self {
        self.bodies.insert(body, reading);
        self
    }

    pub fn get(&self, body: Body) -> Option<&BodyReading> {
        self.bodies.get(&body)
    }

    pub fn longitude(&self, body: Body) -> Option<f64> {
        self.bodies.get(&body).map(|r| r.position.absolute())
    }
}
