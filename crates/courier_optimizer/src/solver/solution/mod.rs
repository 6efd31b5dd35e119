pub mod chromosome;
pub mod finalized_route;
pub mod population;
