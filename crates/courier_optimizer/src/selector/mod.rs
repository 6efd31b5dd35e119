pub mod select_chromosome;
pub mod select_tournament;
