use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Tracked celestial points, declared in orbital-weight order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Body {
    Sun,
    Moon,
    Mercury,
    Venus,
    Mars,
    Jupiter,
    Saturn,
    Uranus,
    Neptune,
    Pluto,
    NorthNode,
    Chiron,
}

impl Body {
    pub const ALL: [Body; 12] = [
        Body::Sun,
        Body::Moon,
        Body::Mercury,
        Body::Venus,
        Body::Mars,
        Body::Jupiter,
        Body::Saturn,
        Body::Uranus,
        Body::Neptune,
        Body::Pluto,
        Body::NorthNode,
        Body::Chiron,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Body::Sun => "sun",
            Body::Moon => "moon",
            Body::Mercury => "mercury",
            Body::Venus => "venus",
            Body::Mars => "mars",
            Body::Jupiter => "jupiter",
            Body::Saturn => "saturn",
            Body::Uranus => "uranus",
            Body::Neptune => "neptune",
            Body::Pluto => "pluto",
            Body::NorthNode => "north_node",
            Body::Chiron => "chiron",
        }
    }

    /// Average geocentric motion in degrees per day.
    ///
    /// Used to step a body forward when the ephemeris did not report a speed.
    pub fn mean_daily_motion(self) -> f64 {
        match self {
            Body::Sun => 0.9856,
            Body::Moon => 13.1764,
            Body::Mercury => 1.383,
            Body::Venus => 1.2,
            Body::Mars => 0.524,
            Body::Jupiter => 0.0831,
            Body::Saturn => 0.0335,
            Body::Uranus => 0.0117,
            Body::Neptune => 0.006,
            Body::Pluto => 0.004,
            Body::NorthNode => 0.053,
            Body::Chiron => 0.0195,
        }
    }

    /// Contribution of a transiting body to its house's activation score.
    pub fn transit_weight(self) -> f64 {
        match self {
            Body::Sun => 0.9,
            Body::Moon => 0.8,
            Body::Mercury => 0.5,
            Body::Venus => 0.6,
            Body::Mars => 0.7,
            Body::Jupiter => 0.85,
            Body::Saturn => 0.85,
            Body::Uranus => 0.8,
            Body::Neptune => 0.7,
            Body::Pluto => 0.9,
            Body::NorthNode => 0.5,
            Body::Chiron => 0.5,
        }
    }

    pub fn is_luminary(self) -> bool {
        matches!(self, Body::Sun | Body::Moon)
    }

    /// Sun through Mars.
    pub fn is_personal(self) -> bool {
        matches!(
            self,
            Body::Sun | Body::Moon | Body::Mercury | Body::Venus | Body::Mars
        )
    }

    /// Saturn through Pluto.
    pub fn is_outer(self) -> bool {
        matches!(
            self,
            Body::Saturn | Body::Uranus | Body::Neptune | Body::Pluto
        )
    }
}

impl fmt::Display for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Body {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Body::ALL
            .iter()
            .copied()
            .find(|body| body.name() == lower || (lower == "true_node" && *body == Body::NorthNode))
            .ok_or_else(|| format!("Unknown body: {}", s))
    }
}
