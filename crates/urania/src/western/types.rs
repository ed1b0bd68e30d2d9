//! Zodiacal position of a point.

use super::sign::Sign;
use crate::angle::{to_absolute, to_sign_degree};
use serde::{Deserialize, Serialize};

/// A sign plus the degree within it, always normalized so `degree_in_sign ∈ [0, 30)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub sign: Sign,
    pub degree_in_sign: f64,
}

impl Position {
    /// Builds a position, carrying overflowing or negative degrees into the neighbouring signs.
    pub fn new(sign: Sign, degree_in_sign: f64) -> Self {
        Self::from_absolute(to_absolute(sign, degree_in_sign))
    }

    pub fn from_absolute(absolute: f64) -> Self {
        let (sign, degree_in_sign) = to_sign_degree(absolute);
        Self {
            sign,
            degree_in_sign,
        }
    }

    /// Absolute ecliptic longitude in [0, 360).
    pub fn absolute(&self) -> f64 {
        to_absolute(self.sign, self.degree_in_sign)
    }
}
