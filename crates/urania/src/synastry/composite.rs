use crate::angle::{circular_mean, forward_arc, normalize_degrees};
use crate::aspects::{AspectDetector, ChartAspect, Placement};
use crate::chart::{chart_geometry, BirthChart, ElementBalance, ModalityBalance};
use crate::error::SynastryError;
use crate::houses::{House, HouseCusps, HouseFrame, HouseSystem};
use crate::patterns::ChartPattern;
use crate::western::{Body, Position};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompositePlacement {
    pub position: Position,
    pub house: House,
}

/// Synthetic chart of a group: each body at the circular mean of its members' positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeChart {
    pub positions: BTreeMap<Body, CompositePlacement>,
    pub house_cusps: HouseCusps,
    pub ascendant: f64,
    pub midheaven: f64,
    pub aspects: Vec<ChartAspect>,
    pub patterns: Vec<ChartPattern>,
    pub element_balance: ElementBalance,
    pub modality_balance: ModalityBalance,
}

/// Circular mean of `values`, or `fallback` when the values cancel out.
fn mean_or(values: &[f64], fallback: f64) -> f64 {
    circular_mean(values).unwrap_or(fallback)
}

/// Keeps the composite midheaven in the half of the circle before the ascendant.
///
/// Separate means of ASC and MC can land on the far midpoint of the MC; the near one is taken
/// instead. A midheaven on the horizon falls back to ASC - 90.
fn composite_midheaven(ascendant: f64, midheaven: f64) -> f64 {
    let lead = forward_arc(midheaven, ascendant);
    if lead > 0.0 && lead < 180.0 {
        return midheaven;
    }
    let flipped = normalize_degrees(midheaven + 180.0);
    let lead = forward_arc(flipped, ascendant);
    if lead > 0.0 && lead < 180.0 {
        flipped
    } else {
        normalize_degrees(ascendant - 90.0)
    }
}

/// Builds the composite of `charts`.
///
/// Only bodies present in every chart are included. When a body's positions cancel out exactly
/// (e.g. two members 180° apart) the first chart's position stands in.
pub fn composite_chart<C: AsRef<BirthChart>>(
    charts: &[C],
    house_system: &dyn HouseSystem,
    detector: &AspectDetector,
) -> Result<CompositeChart, SynastryError> {
    let first = match charts.first() {
        Some(first) => first.as_ref(),
        None => return Err(SynastryError::InsufficientCharts { count: 0 }),
    };

    let ascendants: Vec<f64> = charts.iter().map(|c| c.as_ref().ascendant).collect();
    let midheavens: Vec<f64> = charts.iter().map(|c| c.as_ref().midheaven).collect();
    let ascendant = mean_or(&ascendants, first.ascendant);
    let midheaven = composite_midheaven(ascendant, mean_or(&midheavens, first.midheaven));

    let house_cusps = house_system.cusps(&HouseFrame {
        ascendant,
        midheaven,
        latitude: None,
    })?;

    let mut positions = BTreeMap::new();
    let mut houses = BTreeMap::new();
    let mut placements = Vec::new();
    for (&body, natal) in &first.positions {
        let longitudes: Option<Vec<f64>> = charts
            .iter()
            .map(|c| c.as_ref().longitude(body))
            .collect();
        let Some(longitudes) = longitudes else {
            continue;
        };
        let longitude = mean_or(&longitudes, natal.longitude());
        let house = house_cusps.house_of(longitude);
        positions.insert(
            body,
            CompositePlacement {
                position: Position::from_absolute(longitude),
                house,
            },
        );
        houses.insert(body, house);
        placements.push(Placement::at_mean_motion(body, longitude));
    }

    let geometry = chart_geometry(&placements, &houses, detector);
    Ok(CompositeChart {
        positions,
        house_cusps,
        ascendant,
        midheaven,
        aspects: geometry.aspects,
        patterns: geometry.patterns,
        element_balance: geometry.element_balance,
        modality_balance: geometry.modality_balance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::NatalChartCalculator;
    use crate::ephemeris::{FixedEphemeris, GeoLocation};
    use crate::houses::Porphyry;
    use chrono::{TimeZone, Utc};

    fn chart_with_angles(owner: &str, ascendant: f64, midheaven: f64) -> BirthChart {
        let provider = FixedEphemeris::from_longitudes(&[(Body::Sun, 15.0), (Body::Moon, 200.0)]);
        let instant = Utc.with_ymd_and_hms(2000, 1, 1, 12, 0, 0).unwrap();
        let mut chart = NatalChartCalculator::new(provider)
            .compute_at(owner, instant, GeoLocation { lat: 0.0, lng: 0.0 })
            .unwrap();
        chart.ascendant = ascendant;
        chart.midheaven = midheaven;
        chart
    }

    #[test]
    fn test_near_midheaven_kept() {
        assert_eq!(composite_midheaven(100.0, 10.0), 10.0);
    }

    #[test]
    fn test_far_midheaven_flipped() {
        assert_eq!(composite_midheaven(90.0, 100.0), 280.0);
        assert_eq!(composite_midheaven(90.0, 150.0), 330.0);
    }

    #[test]
    fn test_midheaven_on_horizon_falls_back() {
        assert_eq!(composite_midheaven(90.0, 90.0), 0.0);
        assert_eq!(composite_midheaven(90.0, 270.0), 0.0);
    }

    #[test]
    fn test_porphyry_composite_of_opposed_angles() {
        // Means alone give ASC 90 and MC 100, which no quadrant system can partition.
        let charts = [
            chart_with_angles("a", 170.0, 0.0),
            chart_with_angles("b", 10.0, 200.0),
        ];
        let composite = composite_chart(&charts, &Porphyry, &AspectDetector::major()).unwrap();
        assert!((composite.ascendant - 90.0).abs() < 1e-9);
        assert!((composite.midheaven - 280.0).abs() < 1e-9);
        assert!((composite.house_cusps.as_array()[0] - 90.0).abs() < 1e-9);
    }
}
