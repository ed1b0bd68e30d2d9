mod common;

use urania::aspects::AspectKind;
use urania::ephemeris::{EphemerisProvider, FixedEphemeris};
use urania::houses::House;
use urania::transit::{TransitTracker, TriggerReason};
use urania::western::Body;
use urania::StateSnapshot;

#[test]
fn test_transiting_saturn_squares_natal_sun() {
    let chart = common::chart("u1", &[(Body::Sun, 130.0)]);
    let sky = FixedEphemeris::from_longitudes(&[(Body::Saturn, 40.0)]);
    let state = TransitTracker::new().compute(&chart, &sky.positions(common::t0()).unwrap());

    let aspect = state.active_aspects[0];
    assert_eq!((aspect.body_a, aspect.body_b), (Body::Saturn, Body::Sun));
    assert_eq!(aspect.kind, AspectKind::Square);
    assert!(aspect.exact);
    assert!(!state.stale);
}

#[test]
fn test_transit_house_and_activation() {
    let cusp = common::equal_cusp(1);
    let chart = common::chart("u1", &[(Body::Sun, 0.0)]);
    let sky = FixedEphemeris::from_longitudes(&[(Body::Moon, cusp + 29.0)]);
    let state = TransitTracker::new().compute(&chart, &sky.positions(common::t0()).unwrap());
    assert_eq!(state.current_positions[&Body::Moon].house, House::FIRST);
    assert!((state.activation(House::FIRST) - 0.4).abs() < 1e-9);
}

#[test]
fn test_active_orb_is_configurable() {
    let chart = common::chart("u1", &[(Body::Sun, 100.0)]);
    let sky = FixedEphemeris::from_longitudes(&[(Body::Mars, 106.0)]);
    let snapshot = sky.positions(common::t0()).unwrap();
    assert!(TransitTracker::new().compute(&chart, &snapshot).active_aspects.is_empty());
    let wide = TransitTracker::new().with_active_orb(7.0);
    assert_eq!(wide.compute(&chart, &snapshot).active_aspects.len(), 1);
}

#[test]
fn test_snapshot_shape() {
    let cusp = common::equal_cusp(3);
    let chart = common::chart("u1", &[(Body::Sun, cusp + 2.0), (Body::Moon, cusp + 20.0)]);
    let sky = FixedEphemeris::from_longitudes(&[(Body::Jupiter, cusp + 3.0)]);
    let state = TransitTracker::new().compute(&chart, &sky.positions(common::t0()).unwrap());

    let snapshot = StateSnapshot::build(&chart, Some(&state));
    assert_eq!(snapshot.houses.len(), 12);
    let third = &snapshot.houses[2];
    assert_eq!(third.number, 3);
    assert_eq!(third.natal_planets, vec![Body::Sun, Body::Moon]);
    assert_eq!(third.current_transits, vec![Body::Jupiter]);
    assert!((third.activation - 0.425).abs() < 1e-9);
    assert!(!snapshot.dominant_influences.is_empty());
    assert!(snapshot
        .dominant_influences
        .windows(2)
        .all(|w| w[0].weight >= w[1].weight));

    let json = serde_json::to_value(&snapshot).unwrap();
    for key in [
        "positions",
        "houses",
        "aspects",
        "patterns",
        "dominant_influences",
        "transformation_triggers",
        "stale",
    ] {
        assert!(json.get(key).is_some(), "missing {key}");
    }
}

#[test]
fn test_snapshot_before_first_tick() {
    let chart = common::chart("u1", &[(Body::Sun, 10.0)]);
    let snapshot = StateSnapshot::build(&chart, None);
    assert!(snapshot.last_updated.is_none());
    assert!(snapshot.houses.iter().all(|h| h.activation == 0.0));
    assert!(snapshot.transformation_triggers.is_empty());
}

#[test]
fn test_snapshot_carries_triggers() {
    let chart = common::chart("u1", &[(Body::Moon, 200.0)]);
    let sky = FixedEphemeris::from_longitudes(&[(Body::Pluto, 20.0)]);
    let state = TransitTracker::new().compute(&chart, &sky.positions(common::t0()).unwrap());

    let snapshot = StateSnapshot::build(&chart, Some(&state));
    let pluto = snapshot
        .transformation_triggers
        .iter()
        .find(|t| t.body == Body::Pluto)
        .unwrap();
    assert_eq!(pluto.reason, TriggerReason::OuterToPersonal);
    assert_eq!(pluto.aspect.unwrap().kind, AspectKind::Opposition);
}
