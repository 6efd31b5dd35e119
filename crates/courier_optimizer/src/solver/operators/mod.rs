pub mod crossover;
pub mod insertion;
pub mod mutation;
