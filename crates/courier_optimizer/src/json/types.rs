use jiff::civil::Time;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    error::CourierResult,
    parsers::sources::{DistanceTable, DistanceTableSource, PackageSource, problem_builder},
    problem::{
        delivery_problem::DeliveryProblem,
        distance_matrix::DistanceMatrix,
        location::LocationIdx,
        mph::Mph,
        package::{Package, PackageBuilder},
        package_note::PackageNote,
        truck::{Truck, TruckBuilder},
    },
};

pub trait FromProblem<T> {
    fn from_problem(value: T, problem: &DeliveryProblem) -> Self;
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename = "DeliveryProblem")]
pub struct JsonDeliveryProblem {
    /// Defaults to the first address.
    pub hub: Option<String>,
    pub start_time: Option<Time>,
    pub addresses: Vec<String>,
    /// Full rows or lower-triangular rows, in address order.
    pub distances: Vec<Vec<f64>>,
    pub packages: Vec<JsonPackage>,
    pub trucks: Vec<JsonTruck>,
    pub address_correction: Option<JsonAddressCorrection>,
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename = "Package")]
pub struct JsonPackage {
    pub id: u32,
    pub address: String,
    pub deadline: Option<Time>,
    pub weight: Option<f64>,
    pub notes: Option<Vec<PackageNote>>,
}

impl FromProblem<&Package> for JsonPackage {
    fn from_problem(value: &Package, _problem: &DeliveryProblem) -> Self {
        JsonPackage {
            id: value.id(),
            address: value.address().to_owned(),
            deadline: value.deadline(),
            weight: Some(value.weight()),
            notes: (!value.notes().is_empty()).then(|| value.notes().to_vec()),
        }
    }
}

impl From<&JsonPackage> for PackageBuilder {
    fn from(value: &JsonPackage) -> Self {
        let mut builder = PackageBuilder::new(value.id, value.address.clone());

        if let Some(deadline) = value.deadline {
            builder.set_deadline(deadline);
        }

        if let Some(weight) = value.weight {
            builder.set_weight(weight);
        }

        if let Some(notes) = &value.notes {
            builder.set_notes(notes.clone());
        }

        builder
    }
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename = "Truck")]
pub struct JsonTruck {
    pub id: String,
    pub capacity: Option<usize>,
    /// Miles per hour.
    pub speed: Option<f64>,
    pub departure_time: Option<Time>,
}

impl FromProblem<&Truck> for JsonTruck {
    fn from_problem(value: &Truck, _problem: &DeliveryProblem) -> Self {
        JsonTruck {
            id: value.external_id().to_owned(),
            capacity: Some(value.capacity()),
            speed: Some(value.speed().value()),
            departure_time: value.departure_time(),
        }
    }
}

impl From<&JsonTruck> for TruckBuilder {
    fn from(value: &JsonTruck) -> Self {
        let mut builder = TruckBuilder::new(value.id.clone());

        if let Some(capacity) = value.capacity {
            builder.set_capacity(capacity);
        }

        if let Some(speed) = value.speed {
            builder.set_speed(Mph::new(speed));
        }

        if let Some(departure_time) = value.departure_time {
            builder.set_departure_time(departure_time);
        }

        builder
    }
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename = "AddressCorrection")]
pub struct JsonAddressCorrection {
    pub package: u32,
    pub address: String,
    pub effective_at: Time,
}

impl DistanceTableSource for JsonDeliveryProblem {
    fn distance_table(&self) -> CourierResult<DistanceTable> {
        Ok(DistanceTable {
            addresses: self.addresses.clone(),
            distances: DistanceMatrix::new(self.distances.clone())?,
        })
    }
}

impl PackageSource for JsonDeliveryProblem {
    fn packages(&self) -> CourierResult<Vec<PackageBuilder>> {
        Ok(self.packages.iter().map(PackageBuilder::from).collect())
    }
}

impl JsonDeliveryProblem {
    #[instrument(skip_all, level = "debug")]
    pub fn build_problem(self) -> CourierResult<DeliveryProblem> {
        let mut builder = problem_builder(&self, &self)?;

        builder.set_trucks(self.trucks.iter().map(TruckBuilder::from).collect());

        if let Some(hub) = self.hub {
            builder.set_hub(hub);
        }

        if let Some(start_time) = self.start_time {
            builder.set_start_time(start_time);
        }

        if let Some(correction) = self.address_correction {
            builder.set_address_correction(
                correction.package,
                correction.address,
                correction.effective_at,
            );
        }

        builder.build()
    }
}

impl FromProblem<&DeliveryProblem> for JsonDeliveryProblem {
    fn from_problem(value: &DeliveryProblem, problem: &DeliveryProblem) -> Self {
        let num_locations = value.address_book().len();
        let distances = (0..num_locations)
            .map(|from| {
                (0..num_locations)
                    .map(|to| {
                        value
                            .travel_distance(LocationIdx::new(from), LocationIdx::new(to))
                            .value()
                    })
                    .collect()
            })
            .collect();

        JsonDeliveryProblem {
            hub: value
                .address_book()
                .location(value.hub())
                .ok()
                .map(|location| location.address().to_owned()),
            start_time: Some(value.start_time()),
            addresses: value
                .address_book()
                .locations()
                .iter()
                .map(|location| location.address().to_owned())
                .collect(),
            distances,
            packages: value
                .packages()
                .iter()
                .map(|package| JsonPackage::from_problem(package, problem))
                .collect(),
            trucks: value
                .trucks()
                .iter()
                .map(|truck| JsonTruck::from_problem(truck, problem))
                .collect(),
            address_correction: value.address_correction().map(|correction| {
                JsonAddressCorrection {
                    package: value.package(correction.package()).id(),
                    address: correction.address().to_owned(),
                    effective_at: correction.effective_at(),
                }
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil::time;

    use crate::{error::CourierError, test_utils};

    use super::*;

    const INPUT: &str = r#"{
        "hub": "Western Governors University 4001 South 700 East",
        "start_time": "08:00:00",
        "addresses": [
            "Western Governors University 4001 South 700 East",
            "195 W Oakland Ave",
            "2530 S 500 E"
        ],
        "distances": [[0.0], [3.5, 0.0], [7.2, 3.8, 0.0]],
        "packages": [
            { "id": 1, "address": "195 W Oakland Ave", "deadline": "10:30:00", "weight": 21.0 },
            { "id": 2, "address": "2530 S 500 E", "notes": ["BUNDLE[1]", "TRUCK[2]"] },
            { "id": 3, "address": "2530 S 500 E", "notes": ["DELAY[09:05:00]"] }
        ],
        "trucks": [
            { "id": "1" },
            { "id": "2", "capacity": 16, "speed": 18.0, "departure_time": "09:05:00" }
        ],
        "address_correction": null
    }"#;

    #[test]
    fn test_build_problem() {
        let input: JsonDeliveryProblem = serde_json::from_str(INPUT).unwrap();
        let problem = input.build_problem().unwrap();

        assert_eq!(problem.num_packages(), 3);
        assert_eq!(problem.num_trucks(), 2);
        assert_eq!(
            problem.travel_distance(LocationIdx::new(0), LocationIdx::new(2)).value(),
            7.2
        );
        assert_eq!(problem.packages()[1].address(), "2530 South 500 East");
        assert_eq!(
            problem.packages()[1].truck_restrictions().collect::<Vec<_>>(),
            vec![&[String::from("2")][..]]
        );
        assert_eq!(problem.available_at(problem.package_idx(3).unwrap()), Some(time(9, 5, 0, 0)));
        assert_eq!(problem.trucks()[1].departure_time(), Some(time(9, 5, 0, 0)));
    }

    #[test]
    fn test_rejects_zero_speed() {
        let input: JsonDeliveryProblem =
            serde_json::from_str(&INPUT.replace("\"speed\": 18.0", "\"speed\": 0.0")).unwrap();
        assert!(matches!(
            input.build_problem(),
            Err(CourierError::InvalidParams(_))
        ));
    }

    #[test]
    fn test_rejects_unknown_fields() {
        let input = INPUT.replace("\"weight\": 21.0", "\"weight\": 21.0, \"priority\": 1");
        assert!(serde_json::from_str::<JsonDeliveryProblem>(&input).is_err());
    }

    #[test]
    fn test_rejects_bad_note() {
        let input = INPUT.replace("TRUCK[2]", "FRAGILE");
        assert!(serde_json::from_str::<JsonDeliveryProblem>(&input).is_err());
    }

    #[test]
    fn test_unknown_package_address() {
        let input = INPUT.replace("\"address\": \"195 W Oakland Ave\"", "\"address\": \"1 Nowhere\"");
        let input: JsonDeliveryProblem = serde_json::from_str(&input).unwrap();
        assert!(matches!(
            input.build_problem(),
            Err(CourierError::UnknownLocation(_))
        ));
    }

    #[test]
    fn test_export_round_trip() {
        let problem = test_utils::create_spread_problem(
            5,
            6,
            vec![test_utils::truck("1", 16), test_utils::truck("2", 4)],
        );

        let exported = JsonDeliveryProblem::from_problem(&problem, &problem);
        let json = serde_json::to_string(&exported).unwrap();
        let rebuilt = serde_json::from_str::<JsonDeliveryProblem>(&json)
            .unwrap()
            .build_problem()
            .unwrap();

        assert_eq!(rebuilt.num_packages(), problem.num_packages());
        assert_eq!(rebuilt.trucks()[1].capacity(), 4);
        assert_eq!(
            rebuilt.planned_location(problem.package_idx(6).unwrap()),
            problem.planned_location(problem.package_idx(6).unwrap())
        );
    }
}
