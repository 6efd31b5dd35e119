use jiff::civil::Time;
use thiserror::Error;

/// Why no feasible seed assignment exists. Each variant names the constraint at fault.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InfeasibilityReason {
    #[error("packages {packages:?} must ride together but no eligible truck holds {size} packages")]
    GroupExceedsCapacity { packages: Vec<u32>, size: usize },

    #[error("packages {packages:?} must ride together but are pinned to different trucks")]
    ConflictingPins { packages: Vec<u32> },

    #[error("truck {truck} has {pinned} pinned packages but a capacity of {capacity}")]
    PinnedOverCapacity {
        truck: String,
        pinned: usize,
        capacity: usize,
    },

    #[error("package {package} is pinned to unknown truck {truck}")]
    UnknownPinnedTruck { package: u32, truck: String },

    #[error("packages {packages:?} are not available before {available_at} and no eligible truck departs that late")]
    NoLateDeparture {
        packages: Vec<u32>,
        available_at: Time,
    },

    #[error("package {package} waits for an address correction but none is scheduled")]
    MissingAddressCorrection { package: u32 },

    #[error("no truck has room left for packages {packages:?}")]
    FleetOutOfRoom { packages: Vec<u32> },

    #[error("the fleet is empty")]
    EmptyFleet,
}

#[derive(Error, Debug)]
pub enum CourierError {
    #[error("Unknown location: {0}")]
    UnknownLocation(String),

    #[error("Unknown package: {0}")]
    UnknownPackage(u32),

    #[error("Unknown truck: {0}")]
    UnknownTruck(String),

    #[error("Invalid package note: {0}")]
    InvalidPackageNote(String),

    #[error("Invalid distance matrix: {0}")]
    InvalidDistanceMatrix(String),

    #[error("Infeasible constraints: {0}")]
    InfeasibleConstraints(#[from] InfeasibilityReason),

    #[error("Truck {truck} carries {load} packages but its capacity is {capacity}")]
    CapacityExceeded {
        truck: String,
        load: usize,
        capacity: usize,
    },

    #[error("Package {package} was already delivered at {delivered_at}")]
    AlreadyDelivered { package: u32, delivered_at: Time },

    #[error("Address correction already applied to package {0}")]
    AlreadyApplied(u32),

    #[error("Requested time {requested} is earlier than the current simulated time {current}")]
    InvalidTimeOrder { requested: Time, current: Time },

    #[error("Invalid route: {0}")]
    InvalidRoute(String),

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type CourierResult<T> = Result<T, CourierError>;
