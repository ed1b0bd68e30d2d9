//! House systems.
//!
//! Cusp construction is a strategy: the chart calculator is handed a [`HouseSystem`] and never
//! assumes equal houses. [`EqualHouse`] is the default.

pub mod angles;
pub mod cusps;
pub mod systems;

pub use angles::{chart_angles, ChartAngles};
pub use cusps::{House, HouseCusps};
pub use systems::{EqualHouse, Porphyry, WholeSign};

use crate::error::HouseError;
use std::sync::Arc;

/// Inputs a house system may draw on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HouseFrame {
    pub ascendant: f64,
    pub midheaven: f64,
    /// Geographic latitude, absent for synthetic (composite) charts
    pub latitude: Option<f64>,
}

pub trait HouseSystem: Send + Sync {
    fn name(&self) -> &'static str;

    fn cusps(&self, frame: &HouseFrame) -> Result<HouseCusps, HouseError>;
}

pub const SYSTEM_NAMES: [&str; 3] = ["equal", "whole_sign", "porphyry"];

/// Looks a house system up by its configuration name.
pub fn system_by_name(name: &str) -> Result<Arc<dyn HouseSystem>, HouseError> {
    match name.to_lowercase().replace('-', "_").as_str() {
        "equal" => Ok(Arc::new(EqualHouse)),
        "whole_sign" => Ok(Arc::new(WholeSign)),
        "porphyry" => Ok(Arc::new(Porphyry)),
        _ => Err(HouseError::UnknownSystem {
            name: name.to_string(),
            valid: SYSTEM_NAMES.iter().map(|s| s.to_string()).collect(),
        }),
    }
}
