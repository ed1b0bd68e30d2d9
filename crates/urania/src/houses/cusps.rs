use crate::angle::{arc_contains, forward_arc, normalize_degrees};
use crate::error::HouseError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Arcs shorter than this count as empty.
const MIN_ARC: f64 = 1e-9;
const PARTITION_TOLERANCE: f64 = 1e-6;

/// House number, always 1..=12.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct House(u8);

impl House {
    pub const FIRST: House = House(1);

    /// `None` outside 1..=12.
    pub fn new(number: u8) -> Option<Self> {
        (1..=12).contains(&number).then_some(House(number))
    }

    /// House for a zero-based index, wrapping past 12.
    pub fn from_index(index: usize) -> Self {
        House((index % 12) as u8 + 1)
    }

    pub fn number(self) -> u8 {
        self.0
    }

    pub fn index(self) -> usize {
        (self.0 - 1) as usize
    }

    pub fn all() -> impl Iterator<Item = House> {
        (0..12).map(House::from_index)
    }

    /// Houses 1, 4, 7 and 10.
    pub fn is_angular(self) -> bool {
        self.0 % 3 == 1
    }
}

impl TryFrom<u8> for House {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        House::new(value).ok_or_else(|| format!("house number {} outside 1..=12", value))
    }
}

impl From<House> for u8 {
    fn from(house: House) -> u8 {
        house.0
    }
}

impl fmt::Display for House {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Twelve cusps partitioning the ecliptic into non-overlapping arcs.
///
/// House `n` runs from cusp `n` (inclusive) forward to cusp `n + 1` (exclusive), so every degree
/// belongs to exactly one house even when an arc crosses 0°.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
pub struct HouseCusps([f64; 12]);

impl HouseCusps {
    pub fn new(cusps: [f64; 12]) -> Result<Self, HouseError> {
        let mut normalized = [0.0; 12];
        for (index, value) in cusps.iter().enumerate() {
            if !value.is_finite() {
                return Err(HouseError::NonFinite {
                    index,
                    value: *value,
                });
            }
            normalized[index] = normalize_degrees(*value);
        }

        let mut total = 0.0;
        for i in 0..12 {
            let arc = forward_arc(normalized[i], normalized[(i + 1) % 12]);
            if arc < MIN_ARC {
                return Err(HouseError::EmptyArc {
                    house: House::from_index(i).number(),
                });
            }
            total += arc;
        }
        if (total - 360.0).abs() > PARTITION_TOLERANCE {
            return Err(HouseError::NotAPartition { total });
        }

        Ok(Self(normalized))
    }

    /// Cusps spaced 30° apart starting at `first`.
    pub fn equal_from(first: f64) -> Self {
        let mut cusps = [0.0; 12];
        for (i, cusp) in cusps.iter_mut().enumerate() {
            *cusp = normalize_degrees(first + i as f64 * 30.0);
        }
        Self(cusps)
    }

    pub fn cusp(&self, house: House) -> f64 {
        self.0[house.index()]
    }

    pub fn as_array(&self) -> &[f64; 12] {
        &self.0
    }

    /// Forward arc covered by `house`.
    pub fn span(&self, house: House) -> f64 {
        let i = house.index();
        forward_arc(self.0[i], self.0[(i + 1) % 12])
    }

    /// The house whose arc contains `degree`.
    pub fn house_of(&self, degree: f64) -> House {
        let degree = normalize_degrees(degree);
        for i in 0..12 {
            if arc_contains(self.0[i], self.0[(i + 1) % 12], degree) {
                return House::from_index(i);
            }
        }
        // Float noise at a boundary: fall back to the nearest cusp behind the degree.
        let index = (0..12)
            .min_by(|&a, &b| {
                forward_arc(self.0[a], degree).total_cmp(&forward_arc(self.0[b], degree))
            })
            .unwrap_or(0);
        House::from_index(index)
    }
}

impl<'de> Deserialize<'de> for HouseCusps {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = <[f64; 12]>::deserialize(deserializer)?;
        HouseCusps::new(raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_house_bounds() {
        assert!(House::new(0).is_none());
        assert!(House::new(13).is_none());
        assert_eq!(House::from_index(12), House::FIRST);
        assert_eq!(House::all().count(), 12);
    }

    #[test]
    fn test_rejects_out_of_order_cusps() {
        let mut cusps = *HouseCusps::equal_from(0.0).as_array();
        cusps.swap(3, 4);
        assert!(matches!(
            HouseCusps::new(cusps),
            Err(HouseError::NotAPartition { .. })
        ));
    }

    #[test]
    fn test_rejects_duplicate_cusp() {
        let mut cusps = *HouseCusps::equal_from(0.0).as_array();
        cusps[5] = cusps[4];
        assert_eq!(
            HouseCusps::new(cusps),
            Err(HouseError::EmptyArc { house: 5 })
        );
    }

    #[test]
    fn test_rejects_nan() {
        let mut cusps = *HouseCusps::equal_from(0.0).as_array();
        cusps[2] = f64::NAN;
        assert!(matches!(
            HouseCusps::new(cusps),
            Err(HouseError::NonFinite { index: 2, .. })
        ));
    }

    #[test]
    fn test_house_spanning_zero() {
        let cusps = HouseCusps::equal_from(345.0);
        assert_eq!(cusps.house_of(350.0).number(), 1);
        assert_eq!(cusps.house_of(5.0).number(), 1);
        assert_eq!(cusps.house_of(15.0).number(), 2);
        assert_eq!(cusps.house_of(344.9).number(), 12);
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Result<HouseCusps, _> =
            serde_json::from_str("[0,30,60,90,120,150,180,210,240,270,300,330]");
        assert!(ok.is_ok());
        let bad: Result<HouseCusps, _> =
            serde_json::from_str("[0,30,60,90,120,150,180,210,240,270,330,300]");
        assert!(bad.is_err());
    }
}
