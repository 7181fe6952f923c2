mod category;
mod participant;
mod race;
mod sex;
mod timelog;

pub use category::Category;
pub use participant::{Participant, PickupItem, age_on};
pub use race::{Race, RaceStatus};
pub use sex::Sex;
pub use timelog::{PunchKind, PunchSource, Timelog};

use thiserror::Error;

/// Raised when a request field holds a value outside its enum.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind}: '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}
