//! Astrological state engine.
//!
//! Pure computation only: natal charts, transits, timing projections and group synastry over a
//! pluggable [`ephemeris::EphemerisProvider`]. Scheduling, storage and publication live in
//! `orrery_core`.

pub mod angle;
pub mod aspects;
pub mod cancel;
pub mod chart;
pub mod ephemeris;
pub mod error;
pub mod houses;
pub mod patterns;
pub mod snapshot;
pub mod synastry;
pub mod timing;
pub mod transit;
pub mod western;

pub use cancel::CancelToken;
pub use chart::{BirthChart, BirthData, NatalChartCalculator};
pub use ephemeris::{EphemerisProvider, EphemerisSnapshot};
pub use error::{ChartError, EphemerisError, HouseError, SynastryError, TimingError, ValidationError};
pub use snapshot::StateSnapshot;
pub use synastry::{GroupAnalysis, GroupRequest, GroupSynastryEngine};
pub use timing::{SacredTiming, SacredTimingEngine, TimingSettings};
pub use transit::{
    transformation_triggers, TransformationTrigger, TransitModel, TransitState, TransitTracker,
};
pub use western::{Body, Position, Sign};
