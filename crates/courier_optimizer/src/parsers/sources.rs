use crate::{
    error::CourierResult,
    problem::{
        delivery_problem::DeliveryProblemBuilder, distance_matrix::DistanceMatrix,
        package::PackageBuilder,
    },
};

/// Addresses in table order with the distances between them.
pub struct DistanceTable {
    pub addresses: Vec<String>,
    pub distances: DistanceMatrix,
}

pub trait DistanceTableSource {
    fn distance_table(&self) -> CourierResult<DistanceTable>;
}

/// Package records as listed for the day. Every package starts at the hub.
pub trait PackageSource {
    fn packages(&self) -> CourierResult<Vec<PackageBuilder>>;
}

/// Starts a problem from a distance table and a package list. Trucks, hub and start time are
/// left to the caller.
pub fn problem_builder(
    distances: &impl DistanceTableSource,
    packages: &impl PackageSource,
) -> CourierResult<DeliveryProblemBuilder> {
    let table = distances.distance_table()?;

    let mut builder = DeliveryProblemBuilder::default();
    builder
        .set_addresses(table.addresses)
        .set_distance_matrix(table.distances)
        .set_packages(packages.packages()?);

    Ok(builder)
}
