//! The JSON-shaped view handed to report, voice and UI consumers.

use crate::aspects::ChartAspect;
use crate::chart::BirthChart;
use crate::houses::House;
use crate::patterns::ChartPattern;
use crate::transit::{transformation_triggers, TransformationTrigger, TransitState};
use crate::western::{Body, Dignity, Position};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Number of dominant influences reported.
pub const MAX_INFLUENCES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnapshotPosition {
    pub position: Position,
    pub absolute: f64,
    pub house: House,
    pub retrograde: bool,
    pub dignity: Dignity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseSnapshot {
    pub number: u8,
    pub cusp: f64,
    pub activation: f64,
    pub natal_planets: Vec<Body>,
    pub current_transits: Vec<Body>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InfluenceKind {
    Element,
    Modality,
    House,
    Aspect,
    Pattern,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Influence {
    pub kind: InfluenceKind,
    pub label: String,
    /// In [0, 1]
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub owner_id: String,
    /// Natal positions
    pub positions: BTreeMap<Body, SnapshotPosition>,
    pub houses: Vec<HouseSnapshot>,
    /// Natal aspects
    pub aspects: Vec<ChartAspect>,
    /// Active transit-to-natal aspects, empty before the first tick
    pub transit_aspects: Vec<ChartAspect>,
    pub patterns: Vec<ChartPattern>,
    pub dominant_influences: Vec<Influence>,
    /// Turning-point transits, empty before the first tick
    pub transformation_triggers: Vec<TransformationTrigger>,
    pub stale: bool,
    pub last_updated: Option<DateTime<Utc>>,
}

impl StateSnapshot {
    pub fn build(chart: &BirthChart, transit: Option<&TransitState>) -> Self {
        let positions = chart
            .positions
            .iter()
            .map(|(&body, p)| {
                (
                    body,
                    SnapshotPosition {
                        position: p.position,
                        absolute: p.longitude(),
                        house: p.house,
                        retrograde: p.retrograde,
                        dignity: p.dignity,
                    },
                )
            })
            .collect();

        let houses = House::all()
            .map(|house| HouseSnapshot {
                number: house.number(),
                cusp: chart.house_cusps.cusp(house),
                activation: transit.map(|t| t.activation(house)).unwrap_or(0.0),
                natal_planets: chart.bodies_in(house),
                current_transits: transit.map(|t| t.transits_in(house)).unwrap_or_default(),
            })
            .collect();

        Self {
            owner_id: chart.owner_id.clone(),
            positions,
            houses,
            aspects: chart.aspects.clone(),
            transit_aspects: transit.map(|t| t.active_aspects.clone()).unwrap_or_default(),
            patterns: chart.patterns.clone(),
            dominant_influences: dominant_influences(chart, transit),
            transformation_triggers: transit.map(transformation_triggers).unwrap_or_default(),
            stale: transit.map(|t| t.stale).unwrap_or(false),
            last_updated: transit.map(|t| t.last_updated),
        }
    }
}

/// Strongest element, modality, house, transit aspect and pattern, heaviest first.
pub fn dominant_influences(chart: &BirthChart, transit: Option<&TransitState>) -> Vec<Influence> {
    let mut influences = Vec::new();

    let elements = &chart.element_balance;
    if let Some(element) = elements.dominant() {
        influences.push(Influence {
            kind: InfluenceKind::Element,
            label: format!("{:?}", element).to_lowercase(),
            weight: f64::from(elements.count(element)) / f64::from(elements.total().max(1)),
        });
    }

    let modalities = &chart.modality_balance;
    if let Some(modality) = modalities.dominant() {
        influences.push(Influence {
            kind: InfluenceKind::Modality,
            label: format!("{:?}", modality).to_lowercase(),
            weight: f64::from(modalities.count(modality)) / f64::from(modalities.total().max(1)),
        });
    }

    if let Some(transit) = transit {
        let busiest = House::all()
            .filter(|h| transit.activation(*h) > 0.0)
            .fold(None, |best: Option<House>, h| match best {
                Some(b) if transit.activation(b) >= transit.activation(h) => Some(b),
                _ => Some(h),
            });
        if let Some(house) = busiest {
            influences.push(Influence {
                kind: InfluenceKind::House,
                label: format!("house_{}", house.number()),
                weight: transit.activation(house),
            });
        }

        let tightest = transit
            .active_aspects
            .iter()
            .fold(None, |best: Option<&ChartAspect>, a| match best {
                Some(b) if b.strength >= a.strength => Some(b),
                _ => Some(a),
            });
        if let Some(aspect) = tightest {
            influences.push(Influence {
                kind: InfluenceKind::Aspect,
                label: format!("{} {} {}", aspect.body_a, aspect.kind, aspect.body_b),
                weight: aspect.strength,
            });
        }
    }

    let strongest = chart
        .patterns
        .iter()
        .fold(None, |best: Option<&ChartPattern>, p| match best {
            Some(b) if b.strength >= p.strength => Some(b),
            _ => Some(p),
        });
    if let Some(pattern) = strongest {
        influences.push(Influence {
            kind: InfluenceKind::Pattern,
            label: pattern.kind.to_string(),
            weight: pattern.strength,
        });
    }

    influences.sort_by(|a, b| b.weight.total_cmp(&a.weight).then(a.kind.cmp(&b.kind)));
    influences.truncate(MAX_INFLUENCES);
    influences
}
