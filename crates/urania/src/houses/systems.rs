use super::cusps::HouseCusps;
use super::{HouseFrame, HouseSystem};
use crate::angle::{forward_arc, normalize_degrees};
use crate::error::HouseError;

/// Twelve 30° houses starting at the ascendant.
#[derive(Debug, Clone, Copy, Default)]
pub struct EqualHouse;

impl HouseSystem for EqualHouse {
    fn name(&self) -> &'static str {
        "equal"
    }

    fn cusps(&self, frame: &HouseFrame) -> Result<HouseCusps, HouseError> {
        HouseCusps::new(*HouseCusps::equal_from(frame.ascendant).as_array())
    }
}

/// Each house is a whole sign, the first being the ascendant's sign.
#[derive(Debug, Clone, Copy, Default)]
pub struct WholeSign;

impl HouseSystem for WholeSign {
    fn name(&self) -> &'static str {
        "whole_sign"
    }

    fn cusps(&self, frame: &HouseFrame) -> Result<HouseCusps, HouseError> {
        let first = (normalize_degrees(frame.ascendant) / 30.0).floor() * 30.0;
        HouseCusps::new(*HouseCusps::equal_from(first).as_array())
    }
}

/// Trisects each quadrant between the angles.
///
/// Quadrants run ASC → IC → DSC → MC → ASC; the intermediate cusps divide each one into three
/// equal arcs.
#[derive(Debug, Clone, Copy, Default)]
pub struct Porphyry;

impl HouseSystem for Porphyry {
    fn name(&self) -> &'static str {
        "porphyry"
    }

    fn cusps(&self, frame: &HouseFrame) -> Result<HouseCusps, HouseError> {
        let asc = normalize_degrees(frame.ascendant);
        let mc = normalize_degrees(frame.midheaven);
        let ic = normalize_degrees(mc + 180.0);
        let dsc = normalize_degrees(asc + 180.0);

        let angles = [asc, ic, dsc, mc];
        let mut cusps = [0.0; 12];
        for quadrant in 0..4 {
            let start = angles[quadrant];
            let end = angles[(quadrant + 1) % 4];
            let step = forward_arc(start, end) / 3.0;
            for k in 0..3 {
                cusps[quadrant * 3 + k] = normalize_degrees(start + step * k as f64);
            }
        }
        HouseCusps::new(cusps)
    }
}
