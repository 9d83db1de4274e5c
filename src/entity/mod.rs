pub mod individual;
pub mod personality;

pub use individual::Individual;
pub use personality::{PersonalityCalculator, PersonalityUpdate};
