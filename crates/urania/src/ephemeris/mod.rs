//! Pluggable sources of body positions.
//!
//! The engine only ever sees [`EphemerisProvider`]; swapping a test double, the mean-motion model
//! or a Swiss Ephemeris backend never touches chart, transit or timing logic.

#[cfg(feature = "swisseph")]
pub mod adapter;
pub mod fixed;
pub mod mean_motion;
pub mod types;

#[cfg(feature = "swisseph")]
pub use adapter::SwissEphemerisAdapter;
pub use fixed::FixedEphemeris;
pub use mean_motion::MeanMotionEphemeris;
pub use types::{BodyReading, EphemerisSnapshot, GeoLocation};

pub use crate::error::EphemerisError;

use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Supplies each tracked body's sign, degree and retrograde flag for an instant.
///
/// Implementations may block (file IO, remote calls); callers on an async runtime run them on a
/// blocking thread.
pub trait EphemerisProvider: Send + Sync {
    fn name(&self) -> &str;

    fn positions(&self, at: DateTime<Utc>) -> Result<EphemerisSnapshot, EphemerisError>;
}

impl<P: EphemerisProvider + ?Sized> EphemerisProvider for Arc<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn positions(&self, at: DateTime<Utc>) -> Result<EphemerisSnapshot, EphemerisError> {
        (**self).positions(at)
    }
}

impl<P: EphemerisProvider + ?Sized> EphemerisProvider for &P {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn positions(&self, at: DateTime<Utc>) -> Result<EphemerisSnapshot, EphemerisError> {
        (**self).positions(at)
    }
}
