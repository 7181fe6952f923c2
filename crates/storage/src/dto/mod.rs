pub mod assignment;
pub mod category;
pub mod common;
pub mod participant;
pub mod race;
pub mod results;
pub mod timelog;
