pub mod category;
pub mod participant;
pub mod race;
pub mod timelog;
