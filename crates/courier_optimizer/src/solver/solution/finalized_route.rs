use jiff::civil::Time;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{
    error::{CourierError, CourierResult},
    problem::{delivery_problem::DeliveryProblem, miles::Miles, truck::TruckIdx},
    simulation::delivery_simulator::Replay,
};

use super::chromosome::Chromosome;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Stop {
    pub address: String,
    pub packages: SmallVec<[u32; 4]>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TruckRoute {
    pub truck: String,
    pub departure_time: Time,
    pub stops: Vec<Stop>,
}

/// The route set handed to the simulator and persisted between runs. Packages are referred to
/// by their external ids and stops by standardized address.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FinalizedRoute {
    pub routes: Vec<TruckRoute>,
    /// Miles driven by the whole fleet, back to the hub included, with the scheduled address
    /// correction already re-planned.
    pub total_distance: Miles,
}

impl FinalizedRoute {
    pub fn from_chromosome(problem: &DeliveryProblem, chromosome: &Chromosome) -> Self {
        let routes = problem
            .trucks()
            .iter()
            .enumerate()
            .map(|(index, truck)| {
                let truck_id = TruckIdx::new(index);
                let stops = chromosome
                    .stops(problem, truck_id)
                    .into_iter()
                    .map(|stop| Stop {
                        address: problem.address_book().locations()[stop.location_id.get()]
                            .address()
                            .to_owned(),
                        packages: stop
                            .packages
                            .iter()
                            .map(|&package_id| problem.package(package_id).id())
                            .collect(),
                    })
                    .collect();

                TruckRoute {
                    truck: truck.external_id().to_owned(),
                    departure_time: problem.departure_time(truck_id),
                    stops,
                }
            })
            .collect();

        FinalizedRoute {
            routes,
            total_distance: Replay::new(problem, chromosome).total_distance(),
        }
    }

    pub fn num_packages(&self) -> usize {
        self.routes
            .iter()
            .flat_map(|route| route.stops.iter())
            .map(|stop| stop.packages.len())
            .sum()
    }

    /// Rebuilds the chromosome against `problem`, rejecting unknown ids, stops whose address
    /// is not the package's destination, missing or repeated packages and overloaded trucks.
    pub fn to_chromosome(&self, problem: &DeliveryProblem) -> CourierResult<Chromosome> {
        let mut chromosome = Chromosome::empty(problem.num_trucks());
        let mut seen_trucks = vec![false; problem.num_trucks()];

        for route in &self.routes {
            let truck_id = problem.truck_idx(&route.truck)?;
            if std::mem::replace(&mut seen_trucks[truck_id.get()], true) {
                return Err(CourierError::InvalidRoute(format!(
                    "truck {} has more than one route",
                    route.truck
                )));
            }

            let departure = problem.departure_time(truck_id);
            if route.departure_time != departure {
                return Err(CourierError::InvalidRoute(format!(
                    "truck {} departs at {departure}, not {}",
                    route.truck, route.departure_time
                )));
            }

            for stop in &route.stops {
                let location_id = problem.resolve(&stop.address)?.id();
                for &id in &stop.packages {
                    let package_id = problem.package_idx(id)?;
                    if problem.planned_location(package_id) != location_id {
                        return Err(CourierError::InvalidRoute(format!(
                            "package {id} is not delivered to {}",
                            stop.address
                        )));
                    }
                    chromosome.route_mut(truck_id).push(package_id);
                }
            }
        }

        chromosome.validate(problem)?;
        Ok(chromosome)
    }
}
