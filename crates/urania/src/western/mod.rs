pub mod body;
pub mod dignities;
pub mod sign;
pub mod types;

pub use body::Body;
pub use dignities::{dignity_of, Dignity};
pub use sign::{Element, Modality, Sign};
pub use types::Position;
