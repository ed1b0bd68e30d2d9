pub mod detector;
pub mod types;

pub use detector::{PatternDetector, STELLIUM_MIN_BODIES};
pub use types::{ChartPattern, PatternKind};
