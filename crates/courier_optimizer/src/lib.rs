pub mod error;
pub mod json;
pub mod parsers;
pub mod problem;
pub mod scheduler;
mod selector;
pub mod simulation;
pub mod solver;
mod utils;

#[cfg(test)]
pub(crate) mod test_utils;
