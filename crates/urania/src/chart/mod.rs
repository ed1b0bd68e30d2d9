//! Natal charts.

pub mod balance;
pub mod birth;
pub mod natal;

pub use balance::{ElementBalance, ModalityBalance};
pub use birth::{BirthData, BirthMoment};
pub use natal::{BirthChart, NatalChartCalculator, NatalPlacement};

pub(crate) use natal::chart_geometry;
