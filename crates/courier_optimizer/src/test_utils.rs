use jiff::civil::{Time, time};
use rand::RngCore;

use crate::problem::{
    delivery_problem::{DeliveryProblem, DeliveryProblemBuilder},
    distance_matrix::DistanceMatrix,
    package::PackageBuilder,
    truck::TruckBuilder,
};

pub const TEST_START_TIME: Time = time(8, 0, 0, 0);

/// Address of location `index` in the test problems. Location 0 is the hub.
pub fn address(index: usize) -> String {
    if index == 0 {
        String::from("Hub")
    } else {
        format!("{index} Main St")
    }
}

/// Locations on a straight road, one mile apart.
pub fn create_line_distance_matrix(num_locations: usize) -> DistanceMatrix {
    let rows = (0..num_locations)
        .map(|i| {
            (0..num_locations)
                .map(|j| (i as f64 - j as f64).abs())
                .collect()
        })
        .collect();

    DistanceMatrix::new(rows).unwrap()
}

pub fn create_problem_builder(num_locations: usize) -> DeliveryProblemBuilder {
    let mut builder = DeliveryProblemBuilder::default();
    builder
        .set_addresses((0..num_locations).map(address).collect())
        .set_distance_matrix(create_line_distance_matrix(num_locations))
        .set_hub(address(0))
        .set_start_time(TEST_START_TIME);
    builder
}

pub fn package(id: u32, location: usize) -> PackageBuilder {
    PackageBuilder::new(id, address(location))
}

pub fn package_with_deadline(id: u32, location: usize, deadline: Time) -> PackageBuilder {
    let mut builder = package(id, location);
    builder.set_deadline(deadline);
    builder
}

pub fn truck(id: &str, capacity: usize) -> TruckBuilder {
    let mut builder = TruckBuilder::new(id);
    builder.set_capacity(capacity);
    builder
}

/// One package per location `1..num_locations`, package `i` going to location `i`.
pub fn create_problem(
    num_locations: usize,
    packages: Vec<PackageBuilder>,
    trucks: Vec<TruckBuilder>,
) -> DeliveryProblem {
    let mut builder = create_problem_builder(num_locations);
    builder.set_packages(packages).set_trucks(trucks);
    builder.build().unwrap()
}

/// `num_packages` packages spread round-robin over `num_locations - 1` customer locations.
pub fn create_spread_problem(
    num_locations: usize,
    num_packages: u32,
    trucks: Vec<TruckBuilder>,
) -> DeliveryProblem {
    let packages = (1..=num_packages)
        .map(|id| package(id, 1 + (id as usize - 1) % (num_locations - 1)))
        .collect();
    create_problem(num_locations, packages, trucks)
}

pub struct MockRng {
    data: Vec<u64>,
    index: usize,
}

impl MockRng {
    pub fn new(data: Vec<u64>) -> Self {
        MockRng { data, index: 0 }
    }
}

impl RngCore for MockRng {
    fn next_u32(&mut self) -> u32 {
        self.next_u64() as u32
    }

    fn next_u64(&mut self) -> u64 {
        let value = self.data[self.index % self.data.len()];
        self.index = (self.index + 1) % self.data.len();
        value
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        for byte in dst.iter_mut() {
            *byte = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::problem::{location::LocationIdx, miles::Miles};

    use super::*;

    #[test]
    fn test_mock_rng() {
        let data = vec![1, 2, 3, 4];
        let mut rng = MockRng::new(data.clone());

        for &expected in data.iter().cycle().take(8) {
            assert_eq!(rng.next_u64(), expected);
        }
    }

    #[test]
    fn test_line_distance_matrix() {
        let matrix = create_line_distance_matrix(5);
        assert_eq!(
            matrix.travel_distance(LocationIdx::new(1), LocationIdx::new(4)),
            Miles::new(3.0)
        );
    }
}
