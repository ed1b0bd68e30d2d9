//! Deterministic provider for tests and replays.

use super::types::{BodyReading, EphemerisSnapshot};
use super::EphemerisProvider;
use crate::error::EphemerisError;
use crate::western::{Body, Position};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::RwLock;

/// Returns the same readings for every instant, optionally drifting each body by its speed.
///
/// Can be switched into a failing mode to exercise outage handling.
#[derive(Debug, Default)]
pub struct FixedEphemeris {
    readings: RwLock<BTreeMap<Body, BodyReading>>,
    anchor: Option<DateTime<Utc>>,
    failing: AtomicBool,
    calls: AtomicU64,
}

impl FixedEphemeris {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a provider from absolute longitudes, all direct.
    pub fn from_longitudes(longitudes: &[(Body, f64)]) -> Self {
        let provider = Self::new();
        for &(body, lon) in longitudes {
            provider.set(body, BodyReading::new(Position::from_absolute(lon), false));
        }
        provider
    }

    /// Positions advance linearly from `anchor` using each reading's daily motion.
    pub fn drifting_from(mut self, anchor: DateTime<Utc>) -> Self {
        self.anchor = Some(anchor);
        self
    }

    pub fn set(&self, body: Body, reading: BodyReading) {
        self.readings
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(body, reading);
    }

    pub fn set_longitude(&self, body: Body, lon: f64) {
        self.set(body, BodyReading::new(Position::from_absolute(lon), false));
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of `positions` calls served so far, failures included.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl EphemerisProvider for FixedEphemeris {
    fn name(&self) -> &str {
        "fixed"
    }

    fn positions(&self, at: DateTime<Utc>) -> Result<EphemerisSnapshot, EphemerisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(EphemerisError::Unavailable {
                at,
                message: "fixed provider switched to failing mode".to_string(),
            });
        }
        let days = self
            .anchor
            .map(|anchor| (at - anchor).num_milliseconds() as f64 / 86_400_000.0)
            .unwrap_or(0.0);
        let readings = self
            .readings
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut snapshot = EphemerisSnapshot::new(at);
        for (&body, reading) in readings.iter() {
            let mut moved = *reading;
            if days != 0.0 {
                let lon = reading.position.absolute() + reading.daily_motion(body) * days;
                moved.position = Position::from_absolute(lon);
            }
            snapshot.bodies.insert(body, moved);
        }
        Ok(snapshot)
    }
}
