pub mod category_assignment;
pub mod results_ranking;
