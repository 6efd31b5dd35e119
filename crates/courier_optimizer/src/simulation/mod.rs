pub mod delivery_simulator;
pub mod shared_simulator;
pub mod timeline;
