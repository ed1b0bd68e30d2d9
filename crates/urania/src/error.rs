//! Error types shared across the engine.

use crate::western::Body;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Malformed or missing birth data. Always names the offending field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {field}: {reason}")]
pub struct ValidationError {
    pub field: String,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised by an ephemeris backend.
#[derive(Error, Debug, Clone)]
pub enum EphemerisError {
    #[error("ephemeris provider unavailable at {at}: {message}")]
    Unavailable { at: DateTime<Utc>, message: String },
    #[error("ephemeris did not report {body} at {at}")]
    MissingBody { body: Body, at: DateTime<Utc> },
    #[error("Ephemeris file not found at path: {path}. {message}")]
    FileNotFound { path: String, message: String },
    #[error("Failed to calculate position for {body} at {at}: {message}")]
    CalculationFailed {
        body: Body,
        at: DateTime<Utc>,
        message: String,
    },
}

/// House cusp construction failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HouseError {
    #[error("cusp {index} is not a finite degree: {value}")]
    NonFinite { index: usize, value: f64 },
    #[error("cusps do not partition the circle (forward arcs sum to {total:.6})")]
    NotAPartition { total: f64 },
    #[error("house {house} has an empty arc")]
    EmptyArc { house: u8 },
    #[error("unknown house system: {name}. Valid systems: {valid:?}")]
    UnknownSystem { name: String, valid: Vec<String> },
}

/// Natal chart computation failures.
#[derive(Error, Debug, Clone)]
pub enum ChartError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Ephemeris(#[from] EphemerisError),
    #[error(transparent)]
    Houses(#[from] HouseError),
}

/// Sacred timing projection failures.
#[derive(Error, Debug, Clone)]
pub enum TimingError {
    #[error(transparent)]
    Ephemeris(#[from] EphemerisError),
    #[error("timing projection cancelled")]
    Cancelled,
    #[error("projection horizon of {days} days is outside 30..=90")]
    InvalidHorizon { days: u32 },
}

/// Group synastry failures.
#[derive(Error, Debug, Clone)]
pub enum SynastryError {
    #[error("group analysis needs at least 2 charts, got {count}")]
    InsufficientCharts { count: usize },
    #[error(transparent)]
    Houses(#[from] HouseError),
    #[error("group analysis cancelled")]
    Cancelled,
}
