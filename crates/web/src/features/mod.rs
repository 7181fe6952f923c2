pub mod categories;
pub mod participants;
pub mod races;
pub mod results;
pub mod timing;
