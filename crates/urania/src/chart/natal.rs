use super::balance::{ElementBalance, ModalityBalance};
use super::birth::BirthData;
use crate::aspects::{AspectDetector, ChartAspect, Placement};
use crate::ephemeris::{EphemerisProvider, EphemerisSnapshot, GeoLocation};
use crate::error::ChartError;
use crate::houses::{chart_angles, EqualHouse, House, HouseCusps, HouseFrame, HouseSystem};
use crate::patterns::{ChartPattern, PatternDetector};
use crate::western::{dignity_of, Body, Dignity, Position};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A body as placed in a natal chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NatalPlacement {
    pub position: Position,
    pub retrograde: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    pub house: House,
    pub dignity: Dignity,
}

impl NatalPlacement {
    pub fn longitude(&self) -> f64 {
        self.position.absolute()
    }
}

/// Immutable natal chart. Re-entering birth data builds a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BirthChart {
    pub owner_id: String,
    pub birth_instant: DateTime<Utc>,
    pub location: GeoLocation,
    pub house_system: String,
    pub positions: BTreeMap<Body, NatalPlacement>,
    pub house_cusps: HouseCusps,
    pub ascendant: f64,
    pub midheaven: f64,
    pub aspects: Vec<ChartAspect>,
    pub patterns: Vec<ChartPattern>,
    pub element_balance: ElementBalance,
    pub modality_balance: ModalityBalance,
}

impl BirthChart {
    pub fn longitude(&self, body: Body) -> Option<f64> {
        self.positions.get(&body).map(NatalPlacement::longitude)
    }

    /// Bodies whose natal placement falls in `house`, in body order.
    pub fn bodies_in(&self, house: House) -> Vec<Body> {
        self.positions
            .iter()
            .filter(|(_, p)| p.house == house)
            .map(|(b, _)| *b)
            .collect()
    }

    /// Natal placements as aspect detector input.
    pub fn placements(&self) -> Vec<Placement> {
        self.positions
            .iter()
            .map(|(&body, p)| {
                let motion = match p.speed {
                    Some(speed) => speed,
                    None if p.retrograde => -body.mean_daily_motion(),
                    None => body.mean_daily_motion(),
                };
                Placement::new(body, p.longitude(), motion)
            })
            .collect()
    }
}

/// Aspects, patterns and balances shared by natal and composite charts.
#[derive(Debug, Clone)]
pub(crate) struct ChartGeometry {
    pub aspects: Vec<ChartAspect>,
    pub patterns: Vec<ChartPattern>,
    pub element_balance: ElementBalance,
    pub modality_balance: ModalityBalance,
}

pub(crate) fn chart_geometry(
    placements: &[Placement],
    houses: &BTreeMap<Body, House>,
    detector: &AspectDetector,
) -> ChartGeometry {
    let aspects = detector.aspects_within(placements);
    let patterns = PatternDetector::new().detect(&aspects, houses);
    let signs: Vec<_> = placements
        .iter()
        .map(|p| Position::from_absolute(p.longitude).sign)
        .collect();
    ChartGeometry {
        aspects,
        patterns,
        element_balance: ElementBalance::from_signs(signs.iter().copied()),
        modality_balance: ModalityBalance::from_signs(signs),
    }
}

/// Builds birth charts from birth data and an ephemeris.
pub struct NatalChartCalculator<P> {
    provider: P,
    house_system: Arc<dyn HouseSystem>,
    detector: AspectDetector,
}

impl<P: EphemerisProvider> NatalChartCalculator<P> {
    /// Equal houses and the natal orb table.
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            house_system: Arc::new(EqualHouse),
            detector: AspectDetector::natal(),
        }
    }

    pub fn with_house_system(mut self, house_system: Arc<dyn HouseSystem>) -> Self {
        self.house_system = house_system;
        self
    }

    pub fn with_detector(mut self, detector: AspectDetector) -> Self {
        self.detector = detector;
        self
    }

    pub fn house_system(&self) -> &Arc<dyn HouseSystem> {
        &self.house_system
    }

    /// Validates `birth` and computes the chart. Invalid input never reaches the ephemeris.
    pub fn compute(&self, owner_id: &str, birth: &BirthData) -> Result<BirthChart, ChartError> {
        let moment = birth.validate()?;
        self.compute_at(owner_id, moment.instant, moment.location)
    }

    pub fn compute_at(
        &self,
        owner_id: &str,
        instant: DateTime<Utc>,
        location: GeoLocation,
    ) -> Result<BirthChart, ChartError> {
        let snapshot = self.provider.positions(instant)?;
        self.from_snapshot(owner_id, &snapshot, location)
    }

    /// Builds a chart from an already fetched snapshot.
    pub fn from_snapshot(
        &self,
        owner_id: &str,
        snapshot: &EphemerisSnapshot,
        location: GeoLocation,
    ) -> Result<BirthChart, ChartError> {
        let angles = chart_angles(snapshot.instant, location);
        let house_cusps = self.house_system.cusps(&HouseFrame {
            ascendant: angles.ascendant,
            midheaven: angles.midheaven,
            latitude: Some(location.lat),
        })?;

        let mut positions = BTreeMap::new();
        let mut houses = BTreeMap::new();
        let mut placements = Vec::with_capacity(snapshot.bodies.len());
        for (&body, reading) in &snapshot.bodies {
            let longitude = reading.position.absolute();
            let house = house_cusps.house_of(longitude);
            positions.insert(
                body,
                NatalPlacement {
                    position: reading.position,
                    retrograde: reading.retrograde,
                    speed: reading.speed,
                    house,
                    dignity: dignity_of(body, reading.position.sign),
                },
            );
            houses.insert(body, house);
            placements.push(Placement::new(body, longitude, reading.daily_motion(body)));
        }

        let geometry = chart_geometry(&placements, &houses, &self.detector);
        log::debug!(
            "chart for {}: {} bodies, {} aspects, {} patterns ({})",
            owner_id,
            positions.len(),
            geometry.aspects.len(),
            geometry.patterns.len(),
            self.house_system.name()
        );

        Ok(BirthChart {
            owner_id: owner_id.to_string(),
            birth_instant: snapshot.instant,
            location,
            house_system: self.house_system.name().to_string(),
            positions,
            house_cusps,
            ascendant: angles.ascendant,
            midheaven: angles.midheaven,
            aspects: geometry.aspects,
            patterns: geometry.patterns,
            element_balance: geometry.element_balance,
            modality_balance: geometry.modality_balance,
        })
    }
}

impl AsRef<BirthChart> for BirthChart {
    fn as_ref(&self) -> &BirthChart {
        self
    }
}
