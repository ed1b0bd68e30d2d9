#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;
use urania::chart::{BirthChart, NatalChartCalculator};
use urania::ephemeris::{FixedEphemeris, GeoLocation};
use urania::houses::{chart_angles, EqualHouse, House, HouseFrame, HouseSystem};
use urania::western::Body;

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

pub fn location() -> GeoLocation {
    GeoLocation {
        lat: 51.48,
        lng: 0.0,
    }
}

/// Cusp of `house` for a chart cast at `t0()` and `location()` with equal houses.
pub fn equal_cusp(house: u8) -> f64 {
    let angles = chart_angles(t0(), location());
    let cusps = EqualHouse
        .cusps(&HouseFrame {
            ascendant: angles.ascendant,
            midheaven: angles.midheaven,
            latitude: Some(location().lat),
        })
        .unwrap();
    cusps.cusp(House::new(house).unwrap())
}

/// Natal chart with the given bodies, all direct, cast at `t0()`.
pub fn chart(owner: &str, longitudes: &[(Body, f64)]) -> BirthChart {
    let provider = FixedEphemeris::from_longitudes(longitudes);
    NatalChartCalculator::new(provider)
        .compute_at(owner, t0(), location())
        .unwrap()
}

pub fn shared(provider: FixedEphemeris) -> Arc<FixedEphemeris> {
    Arc::new(provider)
}
