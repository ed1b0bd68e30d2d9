mod common;

use std::sync::Arc;
use urania::chart::{BirthData, NatalChartCalculator};
use urania::ephemeris::{FixedEphemeris, MeanMotionEphemeris};
use urania::error::ChartError;
use urania::houses::{House, Porphyry};
use urania::patterns::PatternKind;
use urania::western::{Body, Dignity};

#[test]
fn test_invalid_birth_data_never_reaches_ephemeris() {
    let provider = common::shared(FixedEphemeris::from_longitudes(&[(Body::Sun, 10.0)]));
    let calculator = NatalChartCalculator::new(provider.clone());
    let err = calculator
        .compute("u1", &BirthData::new("1990-02-30", "12:00", 10.0, 10.0))
        .unwrap_err();
    match err {
        ChartError::Validation(v) => assert_eq!(v.field, "date"),
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(provider.calls(), 0);
}

#[test]
fn test_stellium_only_chart() {
    let cusp = common::equal_cusp(5);
    // 9° apart: no conjunction within 8°, and 18° forms nothing.
    let chart = common::chart(
        "u1",
        &[
            (Body::Mercury, cusp + 1.0),
            (Body::Venus, cusp + 10.0),
            (Body::Mars, cusp + 19.0),
        ],
    );
    assert!(chart.aspects.is_empty());
    assert_eq!(chart.patterns.len(), 1);
    let stellium = &chart.patterns[0];
    assert_eq!(stellium.kind, PatternKind::Stellium);
    assert_eq!(stellium.members, vec![Body::Mercury, Body::Venus, Body::Mars]);
    assert_eq!(chart.bodies_in(House::new(5).unwrap()).len(), 3);
}

#[test]
fn test_grand_trine_from_positions() {
    let chart = common::chart(
        "u1",
        &[(Body::Sun, 5.0), (Body::Moon, 125.0), (Body::Jupiter, 243.0)],
    );
    let trines: Vec<_> = chart
        .patterns
        .iter()
        .filter(|p| p.kind == PatternKind::GrandTrine)
        .collect();
    assert_eq!(trines.len(), 1);
    assert!(trines[0].strength > 0.5 && trines[0].strength <= 1.0);
}

#[test]
fn test_yod_needs_quincunx_table() {
    let chart = common::chart(
        "u1",
        &[(Body::Venus, 0.0), (Body::Mars, 60.0), (Body::Saturn, 210.0)],
    );
    let yod = chart
        .patterns
        .iter()
        .find(|p| p.kind == PatternKind::Yod)
        .expect("yod");
    assert_eq!(yod.apex, Some(Body::Saturn));
}

#[test]
fn test_balance_and_dignity() {
    let chart = common::chart(
        "u1",
        &[
            (Body::Sun, 125.0),   // Leo
            (Body::Moon, 35.0),   // Taurus
            (Body::Saturn, 5.0),  // Aries
        ],
    );
    assert_eq!(chart.element_balance.fire, 2);
    assert_eq!(chart.element_balance.earth, 1);
    assert_eq!(chart.modality_balance.fixed, 2);
    assert_eq!(chart.modality_balance.cardinal, 1);
    assert_eq!(chart.positions[&Body::Sun].dignity, Dignity::Domicile);
    assert_eq!(chart.positions[&Body::Moon].dignity, Dignity::Exaltation);
    assert_eq!(chart.positions[&Body::Saturn].dignity, Dignity::Fall);
}

#[test]
fn test_house_system_is_injected() {
    let calculator = NatalChartCalculator::new(MeanMotionEphemeris::new())
        .with_house_system(Arc::new(Porphyry));
    let chart = calculator
        .compute(
            "u1",
            &BirthData::new("1988-11-04", "07:45", 34.05, -118.25).with_timezone("-08:00"),
        )
        .unwrap();
    assert_eq!(chart.house_system, "porphyry");
    assert_eq!(chart.house_cusps.cusp(House::FIRST), chart.ascendant);
    assert_eq!(chart.house_cusps.cusp(House::new(10).unwrap()), chart.midheaven);
    assert_eq!(chart.positions.len(), 12);
}

#[test]
fn test_chart_serializes() {
    let chart = common::chart("u1", &[(Body::Sun, 100.0)]);
    let json = serde_json::to_value(&chart).unwrap();
    assert_eq!(json["owner_id"], "u1");
    assert_eq!(json["positions"]["sun"]["position"]["sign"], "cancer");
    assert_eq!(json["house_cusps"].as_array().unwrap().len(), 12);
}
