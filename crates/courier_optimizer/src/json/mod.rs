pub mod route_store;
pub mod types;
