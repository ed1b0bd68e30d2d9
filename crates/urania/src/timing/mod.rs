//! Sacred timing: where transits are heading over the next weeks.
//!
//! Everything here is on demand and cancellable. The engine reuses
//! [`TransitTracker::compute`](crate::transit::TransitTracker::compute) for each projected sample
//! and never publishes what it computes.

pub mod engine;
pub mod lunar;
pub mod retrograde;
pub mod types;

pub use engine::{SacredTimingEngine, TimingSettings, MAX_HORIZON_DAYS, MIN_HORIZON_DAYS};
pub use lunar::{LUNAR_ECLIPSE_LIMIT, SOLAR_ECLIPSE_LIMIT};
pub use retrograde::retrograde_windows;
pub use types::{
    CosmicSupportWindow, EclipseKind, EclipseWindow, LunarActivation, LunarCycle, MoonPhase,
    RetrogradeWindow, SacredTiming, SupportKind, TimingQuality, TimingRecommendation,
};
