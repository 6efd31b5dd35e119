pub mod fitness;
pub mod genetic_algorithm;
pub mod operators;
pub mod score;
pub mod solution;
pub mod solver;
pub mod solver_params;
pub mod statistics;
