pub mod detector;
pub mod types;

pub use detector::{AspectDetector, AspectMatch, EXACT_ORB};
pub use types::{AspectKind, ChartAspect, OrbRule, OrbTable, Placement};
