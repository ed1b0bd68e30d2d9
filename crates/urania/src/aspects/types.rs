use crate::western::Body;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AspectKind {
    Conjunction,
    Sextile,
    Square,
    Trine,
    Quincunx,
    Opposition,
}

impl AspectKind {
    /// Exact angle for this aspect (0, 60, 90, 120, 150, 180)
    pub fn angle(self) -> f64 {
        match self {
            AspectKind::Conjunction => 0.0,
            AspectKind::Sextile => 60.0,
            AspectKind::Square => 90.0,
            AspectKind::Trine => 120.0,
            AspectKind::Quincunx => 150.0,
            AspectKind::Opposition => 180.0,
        }
    }

    pub fn is_harmonious(self) -> bool {
        matches!(
            self,
            AspectKind::Conjunction | AspectKind::Sextile | AspectKind::Trine
        )
    }

    pub fn is_tense(self) -> bool {
        matches!(self, AspectKind::Square | AspectKind::Opposition)
    }

    pub fn name(self) -> &'static str {
        match self {
            AspectKind::Conjunction => "conjunction",
            AspectKind::Sextile => "sextile",
            AspectKind::Square => "square",
            AspectKind::Trine => "trine",
            AspectKind::Quincunx => "quincunx",
            AspectKind::Opposition => "opposition",
        }
    }
}

impl fmt::Display for AspectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Maximum allowed deviation for one aspect kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrbRule {
    pub kind: AspectKind,
    pub orb: f64,
}

/// Aspects the detector looks for, in tie-break order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrbTable {
    rules: Vec<OrbRule>,
}

impl OrbTable {
    pub fn new(rules: Vec<OrbRule>) -> Self {
        let mut rules = rules;
        rules.sort_by(|a, b| a.kind.cmp(&b.kind));
        rules.dedup_by(|a, b| a.kind == b.kind);
        Self { rules }
    }

    /// Conjunction, sextile, square, trine and opposition.
    pub fn major() -> Self {
        Self::new(vec![
            OrbRule { kind: AspectKind::Conjunction, orb: 8.0 },
            OrbRule { kind: AspectKind::Sextile, orb: 6.0 },
            OrbRule { kind: AspectKind::Square, orb: 8.0 },
            OrbRule { kind: AspectKind::Trine, orb: 8.0 },
            OrbRule { kind: AspectKind::Opposition, orb: 8.0 },
        ])
    }

    /// Major aspects plus a tight quincunx, which yod detection depends on.
    pub fn natal() -> Self {
        Self::major().with_orb(AspectKind::Quincunx, 3.0)
    }

    /// Adds or replaces the rule for `kind`.
    pub fn with_orb(mut self, kind: AspectKind, orb: f64) -> Self {
        self.rules.retain(|r| r.kind != kind);
        self.rules.push(OrbRule { kind, orb });
        Self::new(self.rules)
    }

    pub fn orb(&self, kind: AspectKind) -> Option<f64> {
        self.rules.iter().find(|r| r.kind == kind).map(|r| r.orb)
    }

    pub fn rules(&self) -> &[OrbRule] {
        &self.rules
    }
}

impl Default for OrbTable {
    fn default() -> Self {
        Self::major()
    }
}

/// A body's longitude and how fast it is moving, the detector's only input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub body: Body,
    pub longitude: f64,
    /// Degrees per day, negative when retrograde
    pub daily_motion: f64,
}

impl Placement {
    pub fn new(body: Body, longitude: f64, daily_motion: f64) -> Self {
        Self {
            body,
            longitude,
            daily_motion,
        }
    }

    /// A placement moving at the body's mean speed.
    pub fn at_mean_motion(body: Body, longitude: f64) -> Self {
        Self::new(body, longitude, body.mean_daily_motion())
    }
}

/// A named angular relationship between two bodies.
///
/// Within one chart each unordered pair appears once with `body_a < body_b`. In transit and
/// synastry lists `body_a` comes from the first set (transiting body, first chart).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartAspect {
    pub body_a: Body,
    pub body_b: Body,
    #[serde(rename = "type")]
    pub kind: AspectKind,
    /// Deviation from the exact angle
    pub orb: f64,
    /// Within one degree of exact
    pub exact: bool,
    /// Tightening over the next day
    pub applying: bool,
    /// `1 - orb / allowance`, in [0, 1]
    pub strength: f64,
}

impl ChartAspect {
    pub fn involves(&self, body: Body) -> bool {
        self.body_a == body || self.body_b == body
    }

    /// The other body of the pair, if `body` is one of them.
    pub fn partner(&self, body: Body) -> Option<Body> {
        if self.body_a == body {
            Some(self.body_b)
        } else if self.body_b == body {
            Some(self.body_a)
        } else {
            None
        }
    }
}
