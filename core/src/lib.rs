//! Runtime around the `urania` engine: entity state, the tick scheduler, the bounded worker pool,
//! persistence and pub/sub.

pub mod broadcaster;
pub mod error;
pub mod persistence;
pub mod pool;
pub mod runtime;
pub mod scheduler;
pub mod store;

pub use broadcaster::{StateBroadcaster, Subscription};
pub use error::CoreError;
pub use persistence::{MemoryPersistence, Persistence, PersistenceError};
pub use pool::{JobOutcome, WorkerPool};
pub use runtime::{AstroRuntime, GroupState, HydrateReport, RuntimeSettings, TickReport, UserState};
pub use scheduler::{Backoff, Scheduler, SchedulerHandle};
pub use store::{EntityStore, EntityWriter};
