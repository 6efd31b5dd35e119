use fixedbitset::FixedBitSet;
use smallvec::SmallVec;

use crate::{
    error::{CourierError, CourierResult},
    problem::{
        delivery_problem::DeliveryProblem, location::LocationIdx, package::PackageIdx,
        truck::TruckIdx,
    },
};

/// Packages delivered at one location by one truck, in delivery order.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedStop {
    pub location_id: LocationIdx,
    pub packages: SmallVec<[PackageIdx; 4]>,
}

/// One delivery order per truck. Every package appears in exactly one route.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Chromosome {
    routes: Vec<Vec<PackageIdx>>,
}

impl Chromosome {
    pub fn new(routes: Vec<Vec<PackageIdx>>) -> Self {
        Chromosome { routes }
    }

    pub fn empty(num_trucks: usize) -> Self {
        Chromosome {
            routes: vec![Vec::new(); num_trucks],
        }
    }

    pub fn routes(&self) -> &[Vec<PackageIdx>] {
        &self.routes
    }

    pub fn route(&self, truck_id: TruckIdx) -> &[PackageIdx] {
        &self.routes[truck_id.get()]
    }

    pub(crate) fn route_mut(&mut self, truck_id: TruckIdx) -> &mut Vec<PackageIdx> {
        &mut self.routes[truck_id.get()]
    }

    pub fn num_trucks(&self) -> usize {
        self.routes.len()
    }

    pub fn load(&self, truck_id: TruckIdx) -> usize {
        self.routes[truck_id.get()].len()
    }

    pub fn num_packages(&self) -> usize {
        self.routes.iter().map(Vec::len).sum()
    }

    /// Truck and position of a package.
    pub fn position_of(&self, package_id: PackageIdx) -> Option<(TruckIdx, usize)> {
        self.routes.iter().enumerate().find_map(|(truck, route)| {
            route
                .iter()
                .position(|&candidate| candidate == package_id)
                .map(|position| (TruckIdx::new(truck), position))
        })
    }

    pub fn truck_of(&self, package_id: PackageIdx) -> Option<TruckIdx> {
        self.position_of(package_id).map(|(truck_id, _)| truck_id)
    }

    /// Truck carrying each package, indexed by package.
    pub fn assignments(&self, num_packages: usize) -> Vec<Option<TruckIdx>> {
        let mut assignments = vec![None; num_packages];
        for (truck, route) in self.routes.iter().enumerate() {
            for package_id in route {
                if let Some(assignment) = assignments.get_mut(package_id.get()) {
                    *assignment = Some(TruckIdx::new(truck));
                }
            }
        }
        assignments
    }

    pub fn is_identical(&self, other: &Chromosome) -> bool {
        self.routes == other.routes
    }

    /// Removes every listed package from whatever route holds it.
    pub(crate) fn remove_packages(&mut self, packages: &[PackageIdx]) {
        for route in self.routes.iter_mut() {
            route.retain(|package_id| !packages.contains(package_id));
        }
    }

    /// Stops of one truck. Consecutive packages for the same location share a stop.
    pub fn stops(&self, problem: &DeliveryProblem, truck_id: TruckIdx) -> Vec<PlannedStop> {
        let mut stops: Vec<PlannedStop> = Vec::new();

        for &package_id in self.route(truck_id) {
            let location_id = problem.planned_location(package_id);
            match stops.last_mut() {
                Some(stop) if stop.location_id == location_id => stop.packages.push(package_id),
                _ => stops.push(PlannedStop {
                    location_id,
                    packages: SmallVec::from_elem(package_id, 1),
                }),
            }
        }

        stops
    }

    /// Checks coverage, capacity, pins, availability and ride-together groups.
    pub fn validate(&self, problem: &DeliveryProblem) -> CourierResult<()> {
        if self.routes.len() != problem.num_trucks() {
            return Err(CourierError::InvalidRoute(format!(
                "{} routes for a fleet of {} trucks",
                self.routes.len(),
                problem.num_trucks()
            )));
        }

        let mut seen = FixedBitSet::with_capacity(problem.num_packages());
        for (index, route) in self.routes.iter().enumerate() {
            let truck_id = TruckIdx::new(index);
            let truck = problem.truck(truck_id);

            for &package_id in route {
                if package_id.get() >= problem.num_packages() {
                    return Err(CourierError::InvalidRoute(format!(
                        "unknown package index {package_id}"
                    )));
                }

                if seen.put(package_id.get()) {
                    return Err(CourierError::InvalidRoute(format!(
                        "package {} is routed twice",
                        problem.package(package_id).id()
                    )));
                }

                if !problem.is_package_compatible(package_id, truck_id) {
                    return Err(CourierError::InvalidRoute(format!(
                        "package {} cannot ride truck {}",
                        problem.package(package_id).id(),
                        truck.external_id()
                    )));
                }
            }

            if route.len() > truck.capacity() {
                return Err(CourierError::CapacityExceeded {
                    truck: truck.external_id().to_owned(),
                    load: route.len(),
                    capacity: truck.capacity(),
                });
            }
        }

        if let Some(missing) = seen.zeroes().next() {
            return Err(CourierError::InvalidRoute(format!(
                "package {} is not routed",
                problem.package(PackageIdx::new(missing)).id()
            )));
        }

        let assignments = self.assignments(problem.num_packages());
        for unit in problem.units() {
            let first = assignments[unit.packages()[0].get()];
            if unit
                .packages()
                .iter()
                .any(|package_id| assignments[package_id.get()] != first)
            {
                return Err(CourierError::InvalidRoute(format!(
                    "packages {:?} must ride the same truck",
                    unit.packages()
                        .iter()
                        .map(|&package_id| problem.package(package_id).id())
                        .collect::<Vec<_>>()
                )));
            }
        }

        Ok(())
    }
}
