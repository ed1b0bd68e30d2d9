use crate::houses::House;
use crate::western::{Body, Position};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingQuality {
    Excellent,
    Good,
    Neutral,
    Challenging,
}

/// Outlook for one house over the projection horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingRecommendation {
    pub house: House,
    pub quality: TimingQuality,
    pub current_activation: f64,
    pub projected_activation: f64,
    /// `0.5 * current + 0.5 * projected`
    pub blended_activation: f64,
    pub harmonious_aspects: u32,
    pub challenging_aspects: u32,
    /// Transiting bodies seen in the house now or during the projection
    pub planets: Vec<Body>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupportKind {
    /// Jupiter harmonious to a natal body
    Breakthrough,
    /// Venus harmonious to a natal body
    Integration,
    /// Neptune or Pluto trine/sextile a natal body
    Release,
    /// Mars or Uranus conjunct a natal luminary
    Initiation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CosmicSupportWindow {
    pub kind: SupportKind,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Strongest supporting aspect in the window, in [0, 1]
    pub intensity: f64,
    /// Natal houses of the supported bodies
    pub supported_houses: Vec<House>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoonPhase {
    NewMoon,
    WaxingCrescent,
    FirstQuarter,
    WaxingGibbous,
    FullMoon,
    WaningGibbous,
    LastQuarter,
    WaningCrescent,
}

impl MoonPhase {
    const ORDER: [MoonPhase; 8] = [
        MoonPhase::NewMoon,
        MoonPhase::WaxingCrescent,
        MoonPhase::FirstQuarter,
        MoonPhase::WaxingGibbous,
        MoonPhase::FullMoon,
        MoonPhase::WaningGibbous,
        MoonPhase::LastQuarter,
        MoonPhase::WaningCrescent,
    ];

    /// Phase for a Sun→Moon elongation; each phase spans 45° centred on a multiple of 45°.
    pub fn from_elongation(elongation: f64) -> Self {
        let shifted = crate::angle::normalize_degrees(elongation + 22.5);
        Self::ORDER[((shifted / 45.0).floor() as usize) % 8]
    }
}

/// A day on which the Moon enters a new natal house.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LunarActivation {
    pub date: DateTime<Utc>,
    pub house: House,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LunarCycle {
    pub phase: MoonPhase,
    /// Sun→Moon elongation in degrees
    pub elongation: f64,
    /// Percent of the disc lit, 0..=100
    pub illumination: f64,
    pub moon_position: Position,
    pub moon_house: House,
    pub next_new_moon: Option<DateTime<Utc>>,
    pub next_full_moon: Option<DateTime<Utc>>,
    /// Moon house ingresses over the coming month
    pub monthly_activations: Vec<LunarActivation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrogradeWindow {
    pub body: Body,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Natal houses the body moves through while retrograde
    pub houses: Vec<House>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EclipseKind {
    Solar,
    Lunar,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EclipseWindow {
    pub date: DateTime<Utc>,
    pub kind: EclipseKind,
    /// Absolute degree of the eclipsed luminary
    pub degree: f64,
    pub position: Position,
    /// Sun's distance from the nearer end of the node axis
    pub node_distance: f64,
    /// Natal house of the eclipse degree and of its opposite point
    pub houses_impacted: Vec<House>,
}

/// Timing summary for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SacredTiming {
    pub owner_id: String,
    pub generated_at: DateTime<Utc>,
    pub horizon_end: DateTime<Utc>,
    /// One entry per house, houses 1..=12
    pub recommendations: Vec<TimingRecommendation>,
    pub cosmic_support: Vec<CosmicSupportWindow>,
    pub lunar_cycle: LunarCycle,
    pub retrograde_windows: Vec<RetrogradeWindow>,
    pub eclipse_windows: Vec<EclipseWindow>,
}
