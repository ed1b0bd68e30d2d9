//! Moon phase, lunations and eclipses from a fast Sun/Moon sampling.

use super::types::{EclipseKind, EclipseWindow, LunarActivation, LunarCycle, MoonPhase};
use crate::angle::{circular_distance, forward_arc, normalize_degrees, signed_delta};
use crate::chart::BirthChart;
use crate::ephemeris::EphemerisSnapshot;
use crate::western::{Body, Position};
use chrono::{DateTime, Duration, Utc};

/// Sun within this distance of the node axis at a new moon makes a solar eclipse.
pub const SOLAR_ECLIPSE_LIMIT: f64 = 18.0;
/// Sun within this distance of the node axis at a full moon makes a lunar eclipse.
pub const LUNAR_ECLIPSE_LIMIT: f64 = 12.0;

const MONTH_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LunarSample {
    pub at: DateTime<Utc>,
    pub sun: f64,
    pub moon: f64,
    pub node: Option<f64>,
}

impl LunarSample {
    /// `None` when the snapshot lacks the Sun or the Moon.
    pub fn from_snapshot(snapshot: &EphemerisSnapshot) -> Option<Self> {
        Some(Self {
            at: snapshot.instant,
            sun: snapshot.longitude(Body::Sun)?,
            moon: snapshot.longitude(Body::Moon)?,
            node: snapshot.longitude(Body::NorthNode),
        })
    }

    pub fn elongation(&self) -> f64 {
        elongation(self.sun, self.moon)
    }
}

/// Sun→Moon angle measured forward, in [0, 360).
pub fn elongation(sun: f64, moon: f64) -> f64 {
    normalize_degrees(moon - sun)
}

/// Lit fraction of the disc in percent.
pub fn illumination(elongation: f64) -> f64 {
    (1.0 - elongation.to_radians().cos()) / 2.0 * 100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LunationKind {
    New,
    Full,
}

impl LunationKind {
    fn target(self) -> f64 {
        match self {
            LunationKind::New => 0.0,
            LunationKind::Full => 180.0,
        }
    }
}

/// An interpolated new or full moon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lunation {
    pub kind: LunationKind,
    pub at: DateTime<Utc>,
    pub sun: f64,
    pub moon: f64,
    pub node: Option<f64>,
}

fn lerp_degrees(from: f64, to: f64, fraction: f64) -> f64 {
    normalize_degrees(from + signed_delta(from, to) * fraction)
}

fn lerp_instant(from: DateTime<Utc>, to: DateTime<Utc>, fraction: f64) -> DateTime<Utc> {
    let span = (to - from).num_milliseconds() as f64;
    from + Duration::milliseconds((span * fraction).round() as i64)
}

/// New and full moons between consecutive samples, in time order.
///
/// The instant is interpolated linearly in elongation between the two samples around the
/// crossing.
pub fn find_lunations(samples: &[LunarSample]) -> Vec<Lunation> {
    let mut found = Vec::new();
    for pair in samples.windows(2) {
        let (prev, cur) = (pair[0], pair[1]);
        let step = signed_delta(prev.elongation(), cur.elongation());
        if step <= 0.0 {
            continue;
        }
        let mut crossings: Vec<(f64, LunationKind)> = [LunationKind::New, LunationKind::Full]
            .into_iter()
            .filter_map(|kind| {
                let distance = forward_arc(prev.elongation(), kind.target());
                (distance < step).then_some((distance / step, kind))
            })
            .collect();
        crossings.sort_by(|a, b| a.0.total_cmp(&b.0));

        for (fraction, kind) in crossings {
            found.push(Lunation {
                kind,
                at: lerp_instant(prev.at, cur.at, fraction),
                sun: lerp_degrees(prev.sun, cur.sun, fraction),
                moon: lerp_degrees(prev.moon, cur.moon, fraction),
                node: match (prev.node, cur.node) {
                    (Some(a), Some(b)) => Some(lerp_degrees(a, b, fraction)),
                    (a, b) => a.or(b),
                },
            });
        }
    }
    found
}

/// Phase, next lunations and monthly house ingresses. `None` without samples.
pub fn lunar_cycle(
    chart: &BirthChart,
    samples: &[LunarSample],
    lunations: &[Lunation],
) -> Option<LunarCycle> {
    let first = samples.first()?;
    let elong = first.elongation();

    let next_of = |kind: LunationKind| {
        lunations
            .iter()
            .find(|l| l.kind == kind && l.at > first.at)
            .map(|l| l.at)
    };

    let month_end = first.at + Duration::days(MONTH_DAYS);
    let mut monthly_activations: Vec<LunarActivation> = Vec::new();
    for sample in samples.iter().take_while(|s| s.at <= month_end) {
        let house = chart.house_cusps.house_of(sample.moon);
        if monthly_activations.last().map(|a| a.house) != Some(house) {
            monthly_activations.push(LunarActivation {
                date: sample.at,
                house,
            });
        }
    }

    Some(LunarCycle {
        phase: MoonPhase::from_elongation(elong),
        elongation: elong,
        illumination: illumination(elong),
        moon_position: Position::from_absolute(first.moon),
        moon_house: chart.house_cusps.house_of(first.moon),
        next_new_moon: next_of(LunationKind::New),
        next_full_moon: next_of(LunationKind::Full),
        monthly_activations,
    })
}

/// Sun's distance to the nearer node, whichever end of the axis that is.
pub fn node_axis_distance(sun: f64, node: f64) -> f64 {
    circular_distance(sun, node).min(circular_distance(sun, node + 180.0))
}

/// Lunations up to `until` close enough to the node axis to eclipse.
pub fn eclipses(
    chart: &BirthChart,
    lunations: &[Lunation],
    until: DateTime<Utc>,
) -> Vec<EclipseWindow> {
    lunations
        .iter()
        .filter(|l| l.at <= until)
        .filter_map(|l| {
            let node = l.node?;
            let distance = node_axis_distance(l.sun, node);
            let (kind, degree) = match l.kind {
                LunationKind::New if distance <= SOLAR_ECLIPSE_LIMIT => (EclipseKind::Solar, l.sun),
                LunationKind::Full if distance <= LUNAR_ECLIPSE_LIMIT => (EclipseKind::Lunar, l.moon),
                _ => return None,
            };
            let mut houses_impacted = vec![
                chart.house_cusps.house_of(degree),
                chart.house_cusps.house_of(degree + 180.0),
            ];
            houses_impacted.sort();
            houses_impacted.dedup();
            Some(EclipseWindow {
                date: l.at,
                kind,
                degree,
                position: Position::from_absolute(degree),
                node_distance: distance,
                houses_impacted,
            })
        })
        .collect()
}
