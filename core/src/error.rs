use crate::persistence::PersistenceError;
use orrery_signals::EntityKey;
use thiserror::Error;
use urania::{ChartError, EphemerisError, HouseError, SynastryError, TimingError, ValidationError};

#[derive(Error, Debug)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The entity, or one it depends on, has no completed state yet.
    #[error("{entity} is not ready")]
    NotReady { entity: EntityKey },
    #[error("ephemeris unavailable: {0}")]
    EphemerisUnavailable(#[source] EphemerisError),
    #[error(transparent)]
    Houses(#[from] HouseError),
    #[error(transparent)]
    Timing(TimingError),
    #[error(transparent)]
    Synastry(SynastryError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error("failed to encode state: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("request cancelled")]
    Cancelled,
    #[error("worker failed: {0}")]
    Worker(String),
}

impl CoreError {
    pub fn not_ready(entity: EntityKey) -> Self {
        CoreError::NotReady { entity }
    }
}

impl From<EphemerisError> for CoreError {
    fn from(e: EphemerisError) -> Self {
        CoreError::EphemerisUnavailable(e)
    }
}

impl From<ChartError> for CoreError {
    fn from(e: ChartError) -> Self {
        match e {
            ChartError::Validation(v) => CoreError::Validation(v),
            ChartError::Ephemeris(e) => CoreError::EphemerisUnavailable(e),
            ChartError::Houses(h) => CoreError::Houses(h),
        }
    }
}

impl From<TimingError> for CoreError {
    fn from(e: TimingError) -> Self {
        match e {
            TimingError::Cancelled => CoreError::Cancelled,
            TimingError::Ephemeris(e) => CoreError::EphemerisUnavailable(e),
            other => CoreError::Timing(other),
        }
    }
}

impl From<SynastryError> for CoreError {
    fn from(e: SynastryError) -> Self {
        match e {
            SynastryError::Cancelled => CoreError::Cancelled,
            other => CoreError::Synastry(other),
        }
    }
}

impl From<tokio::task::JoinError> for CoreError {
    fn from(e: tokio::task::JoinError) -> Self {
        CoreError::Worker(e.to_string())
    }
}
