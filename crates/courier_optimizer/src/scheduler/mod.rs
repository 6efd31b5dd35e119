pub mod priority_scheduler;
pub mod route_ordering;
