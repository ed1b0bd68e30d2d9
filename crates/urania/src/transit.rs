//! Current sky against a natal chart.
//!
//! [`TransitTracker::compute`] is pure: it reads a chart and a snapshot and returns a fresh
//! [`TransitState`]. The runtime owns the per-user state machine and publication; the timing
//! engine reuses the same function for projections without committing anything.

use crate::aspects::{AspectDetector, ChartAspect, Placement};
use crate::chart::BirthChart;
use crate::ephemeris::EphemerisSnapshot;
use crate::houses::House;
use crate::western::{Body, Position};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Transit aspects tighter than this are active.
pub const DEFAULT_ACTIVE_ORB: f64 = 5.0;

/// Summed body weights are divided by this before clamping to 1.
const ACTIVATION_SCALE: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransitPlacement {
    pub position: Position,
    pub retrograde: bool,
    /// Natal house the transiting body occupies
    pub house: House,
}

/// One user's transits at one ephemeris instant. Replaced wholesale on every tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitState {
    pub owner_id: String,
    pub current_positions: BTreeMap<Body, TransitPlacement>,
    /// Activation per house, index 0 is house 1, each in [0, 1]
    pub house_activation: [f64; 12],
    /// Transiting (`body_a`) to natal (`body_b`) aspects within the active orb
    pub active_aspects: Vec<ChartAspect>,
    pub ephemeris_instant: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    /// Set when the latest tick could not refresh this state
    pub stale: bool,
}

impl TransitState {
    pub fn activation(&self, house: House) -> f64 {
        self.house_activation[house.index()]
    }

    /// Transiting bodies currently in `house`.
    pub fn transits_in(&self, house: House) -> Vec<Body> {
        self.current_positions
            .iter()
            .filter(|(_, p)| p.house == house)
            .map(|(b, _)| *b)
            .collect()
    }

    /// Aspects whose transiting body sits in `house`.
    pub fn aspects_from(&self, house: House) -> impl Iterator<Item = &ChartAspect> + '_ {
        self.active_aspects.iter().filter(move |a| {
            self.current_positions
                .get(&a.body_a)
                .map(|p| p.house == house)
                .unwrap_or(false)
        })
    }

    /// Same state, flagged as not refreshed by the latest tick.
    pub fn marked_stale(&self) -> Self {
        Self {
            stale: true,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerReason {
    /// Saturn through Pluto aspecting a natal personal planet
    OuterToPersonal,
    /// Any transit aspecting the natal Sun or Moon
    Luminary,
    /// A transiting body in house 1, 4, 7 or 10
    AngularHouse,
}

/// A transit strong enough to flag on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformationTrigger {
    pub body: Body,
    /// Natal house the transiting body occupies
    pub house: House,
    pub reason: TriggerReason,
    pub aspect: Option<ChartAspect>,
}

/// Flags the transits in `state` that mark a turning point.
///
/// Each active aspect yields at most one trigger, the first matching reason winning. Bodies in an
/// angular house without any active aspect yield an aspect-less trigger. Aspects come first in
/// their stored order, then bodies in body order.
pub fn transformation_triggers(state: &TransitState) -> Vec<TransformationTrigger> {
    let mut triggers = Vec::new();
    for aspect in &state.active_aspects {
        let Some(placement) = state.current_positions.get(&aspect.body_a) else {
            continue;
        };
        let reason = if aspect.body_a.is_outer() && aspect.body_b.is_personal() {
            TriggerReason::OuterToPersonal
        } else if aspect.body_b.is_luminary() {
            TriggerReason::Luminary
        } else if placement.house.is_angular() {
            TriggerReason::AngularHouse
        } else {
            continue;
        };
        triggers.push(TransformationTrigger {
            body: aspect.body_a,
            house: placement.house,
            reason,
            aspect: Some(*aspect),
        });
    }

    for (&body, placement) in &state.current_positions {
        let aspected = state.active_aspects.iter().any(|a| a.body_a == body);
        if placement.house.is_angular() && !aspected {
            triggers.push(TransformationTrigger {
                body,
                house: placement.house,
                reason: TriggerReason::AngularHouse,
                aspect: None,
            });
        }
    }
    triggers
}

/// Anything that can turn a chart and a shared snapshot into a transit state.
pub trait TransitModel: Send + Sync {
    fn compute(&self, chart: &BirthChart, snapshot: &EphemerisSnapshot) -> TransitState;
}

/// Computes transit states.
#[derive(Debug, Clone)]
pub struct TransitTracker {
    detector: AspectDetector,
    active_orb: f64,
}

impl Default for TransitTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl TransitTracker {
    pub fn new() -> Self {
        Self {
            detector: AspectDetector::major(),
            active_orb: DEFAULT_ACTIVE_ORB,
        }
    }

    pub fn with_active_orb(mut self, orb: f64) -> Self {
        self.active_orb = orb;
        self
    }

    pub fn active_orb(&self) -> f64 {
        self.active_orb
    }

    pub fn compute(&self, chart: &BirthChart, snapshot: &EphemerisSnapshot) -> TransitState {
        let mut current_positions = BTreeMap::new();
        let mut house_weights = [0.0_f64; 12];
        let mut transiting = Vec::with_capacity(snapshot.bodies.len());

        for (&body, reading) in &snapshot.bodies {
            let longitude = reading.position.absolute();
            let house = chart.house_cusps.house_of(longitude);
            current_positions.insert(
                body,
                TransitPlacement {
                    position: reading.position,
                    retrograde: reading.retrograde,
                    house,
                },
            );
            house_weights[house.index()] += body.transit_weight();
            transiting.push(Placement::new(body, longitude, reading.daily_motion(body)));
        }

        // Natal points are fixed; only the transiting body moves when judging applying.
        let natal: Vec<Placement> = chart
            .positions
            .iter()
            .map(|(&body, p)| Placement::new(body, p.longitude(), 0.0))
            .collect();

        let active_aspects: Vec<ChartAspect> = self
            .detector
            .aspects_between(&transiting, &natal)
            .into_iter()
            .filter(|a| a.orb < self.active_orb)
            .collect();

        let mut house_activation = [0.0_f64; 12];
        for (slot, weight) in house_activation.iter_mut().zip(house_weights) {
            *slot = (weight / ACTIVATION_SCALE).min(1.0);
        }

        TransitState {
            owner_id: chart.owner_id.clone(),
            current_positions,
            house_activation,
            active_aspects,
            ephemeris_instant: snapshot.instant,
            last_updated: snapshot.instant,
            stale: false,
        }
    }
}

impl TransitModel for TransitTracker {
    fn compute(&self, chart: &BirthChart, snapshot: &EphemerisSnapshot) -> TransitState {
        TransitTracker::compute(self, chart, snapshot)
    }
}
