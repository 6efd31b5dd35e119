use std::cmp::Reverse;

use tracing::{Level, debug, instrument};

use crate::{
    error::{CourierResult, InfeasibilityReason},
    problem::{
        delivery_problem::DeliveryProblem,
        load_unit::{LoadUnit, UnitIdx},
        truck::TruckIdx,
    },
    solver::solution::chromosome::Chromosome,
};

use super::route_ordering::order_route;

fn package_ids(problem: &DeliveryProblem, unit: &LoadUnit) -> Vec<u32> {
    unit.packages()
        .iter()
        .map(|&package_id| problem.package(package_id).id())
        .collect()
}

/// Rejects problems no assignment can satisfy before any packing is attempted.
fn check_units(problem: &DeliveryProblem) -> Result<(), InfeasibilityReason> {
    if problem.num_trucks() == 0 {
        return Err(InfeasibilityReason::EmptyFleet);
    }

    for unit in problem.units() {
        if unit.has_conflicting_pins() {
            return Err(InfeasibilityReason::ConflictingPins {
                packages: package_ids(problem, unit),
            });
        }
    }

    for unit in problem.units().iter().filter(|unit| unit.size() > 1) {
        let fits = problem.trucks().iter().enumerate().any(|(index, truck)| {
            unit.allows(TruckIdx::new(index)) && truck.capacity() >= unit.size()
        });

        if !fits {
            return Err(InfeasibilityReason::GroupExceedsCapacity {
                packages: package_ids(problem, unit),
                size: unit.size(),
            });
        }
    }

    for (index, unit) in problem.units().iter().enumerate() {
        if problem.compatible_trucks(UnitIdx::new(index)).next().is_none() {
            return Err(InfeasibilityReason::NoLateDeparture {
                packages: package_ids(problem, unit),
                available_at: unit.available_at().unwrap_or(problem.start_time()),
            });
        }
    }

    Ok(())
}

fn assign_pinned(
    problem: &DeliveryProblem,
    loads: &mut [usize],
    assignments: &mut [Option<TruckIdx>],
) -> Result<(), InfeasibilityReason> {
    let mut pinned = vec![0; problem.num_trucks()];
    for unit in problem.units() {
        if let Some(truck_id) = unit.pinned_truck() {
            pinned[truck_id.get()] += unit.size();
        }
    }

    for (truck, &count) in problem.trucks().iter().zip(pinned.iter()) {
        if count > truck.capacity() {
            return Err(InfeasibilityReason::PinnedOverCapacity {
                truck: truck.external_id().to_owned(),
                pinned: count,
                capacity: truck.capacity(),
            });
        }
    }

    for (index, unit) in problem.units().iter().enumerate() {
        if let Some(truck_id) = unit.pinned_truck() {
            assignments[index] = Some(truck_id);
            loads[truck_id.get()] += unit.size();
        }
    }

    Ok(())
}

/// Places every unassigned unit in `order` on a compatible truck with room. Units with a
/// deadline prefer the earliest departure, all units then prefer the least loaded truck.
/// Returns the first unit that fits nowhere.
fn distribute(
    problem: &DeliveryProblem,
    order: &[UnitIdx],
    loads: &mut [usize],
    assignments: &mut [Option<TruckIdx>],
) -> Result<(), UnitIdx> {
    for &unit_id in order {
        if assignments[unit_id.get()].is_some() {
            continue;
        }

        let unit = problem.unit(unit_id);
        let truck_id = problem
            .compatible_trucks(unit_id)
            .filter(|&truck_id| {
                loads[truck_id.get()] + unit.size() <= problem.truck(truck_id).capacity()
            })
            .min_by_key(|&truck_id| {
                (
                    unit.earliest_deadline()
                        .map(|_| problem.departure_time(truck_id)),
                    loads[truck_id.get()],
                    truck_id,
                )
            })
            .ok_or(unit_id)?;

        assignments[unit_id.get()] = Some(truck_id);
        loads[truck_id.get()] += unit.size();
    }

    Ok(())
}

/// Builds the seed assignment: ride-together groups are packed as single units, pinned units
/// go first, units limited to a few trucks next, the rest follow by non-decreasing deadline. Each truck's packages are then
/// ordered by [`order_route`].
#[instrument(skip_all, level = Level::DEBUG)]
pub fn schedule(problem: &DeliveryProblem) -> CourierResult<Chromosome> {
    check_units(problem)?;

    let mut loads = vec![0; problem.num_trucks()];
    let mut assignments = vec![None; problem.units().len()];
    assign_pinned(problem, &mut loads, &mut assignments)?;

    let mut by_deadline = (0..problem.units().len())
        .map(UnitIdx::new)
        .collect::<Vec<_>>();
    by_deadline.sort_by_key(|&unit_id| {
        let unit = problem.unit(unit_id);
        (
            unit.allowed_trucks().is_none(),
            unit.earliest_deadline().is_none(),
            unit.earliest_deadline(),
            unit.available_at(),
            unit_id,
        )
    });

    let mut first_attempt_loads = loads.clone();
    let mut first_attempt = assignments.clone();

    if let Err(failed) = distribute(
        problem,
        &by_deadline,
        &mut first_attempt_loads,
        &mut first_attempt,
    ) {
        // Deadline order can strand a large group once every truck is nearly full; retry
        // packing the largest units first before giving up.
        debug!(unit = %failed, "Deadline-ordered packing failed, retrying by unit size");

        let mut by_size = by_deadline.clone();
        by_size.sort_by_key(|&unit_id| Reverse(problem.unit(unit_id).size()));

        if distribute(problem, &by_size, &mut loads, &mut assignments).is_err() {
            return Err(InfeasibilityReason::FleetOutOfRoom {
                packages: package_ids(problem, problem.unit(failed)),
            }
            .into());
        }
    } else {
        loads = first_attempt_loads;
        assignments = first_attempt;
    }

    let mut packages_per_truck = vec![Vec::new(); problem.num_trucks()];
    for (unit, assignment) in problem.units().iter().zip(assignments.iter()) {
        if let Some(truck_id) = assignment {
            packages_per_truck[truck_id.get()].extend_from_slice(unit.packages());
        }
    }

    let routes = packages_per_truck
        .iter()
        .map(|packages| order_route(problem, packages))
        .collect::<Vec<_>>();

    for (truck, load) in problem.trucks().iter().zip(loads.iter()) {
        debug!(
            truck = truck.external_id(),
            load,
            capacity = truck.capacity(),
            "Seed assignment"
        );
    }

    Ok(Chromosome::new(routes))
}

#[cfg(test)]
mod tests {
    use jiff::civil::time;

    use crate::{
        error::CourierError,
        problem::{package::PackageIdx, package_note::PackageNote},
        test_utils,
    };

    use super::*;

    fn infeasibility(result: CourierResult<Chromosome>) -> InfeasibilityReason {
        match result {
            Err(CourierError::InfeasibleConstraints(reason)) => reason,
            other => panic!("expected infeasible constraints, got {other:?}"),
        }
    }

    #[test]
    fn test_seventeen_packages_do_not_fit_sixteen_slots() {
        let problem =
            test_utils::create_spread_problem(10, 17, vec![test_utils::truck("1", 16)]);

        assert!(matches!(
            infeasibility(schedule(&problem)),
            InfeasibilityReason::FleetOutOfRoom { .. }
        ));
    }

    #[test]
    fn test_group_rides_together_in_full_fleet() {
        let mut packages = (1..=32)
            .map(|id| test_utils::package(id, 1 + (id as usize % 9)))
            .collect::<Vec<_>>();
        packages[30].add_note(PackageNote::ShipWith(vec![32]));

        let problem = test_utils::create_problem(
            10,
            packages,
            vec![test_utils::truck("1", 16), test_utils::truck("2", 16)],
        );

        let seed = schedule(&problem).unwrap();
        assert!(seed.validate(&problem).is_ok());
        assert_eq!(
            seed.truck_of(PackageIdx::new(30)),
            seed.truck_of(PackageIdx::new(31))
        );
        assert_eq!(seed.load(TruckIdx::new(0)), 16);
        assert_eq!(seed.load(TruckIdx::new(1)), 16);
    }

    #[test]
    fn test_large_group_packed_after_retry() {
        // Deadline order fills both trucks evenly before the group of four comes up.
        let mut packages = (1..=4)
            .map(|id| test_utils::package_with_deadline(id, id as usize, time(9, 0, 0, 0)))
            .collect::<Vec<_>>();
        let mut grouped = test_utils::package(5, 5);
        grouped.add_note(PackageNote::ShipWith(vec![6, 7, 8]));
        packages.push(grouped);
        packages.extend((6..=8).map(|id| test_utils::package(id, id as usize)));

        let problem = test_utils::create_problem(
            9,
            packages,
            vec![test_utils::truck("1", 4), test_utils::truck("2", 4)],
        );

        let seed = schedule(&problem).unwrap();
        assert!(seed.validate(&problem).is_ok());
    }

    #[test]
    fn test_group_exceeds_capacity() {
        let mut first = test_utils::package(1, 1);
        first.add_note(PackageNote::ShipWith(vec![2, 3]));

        let problem = test_utils::create_problem(
            4,
            vec![first, test_utils::package(2, 2), test_utils::package(3, 3)],
            vec![test_utils::truck("1", 2), test_utils::truck("2", 2)],
        );

        assert_eq!(
            infeasibility(schedule(&problem)),
            InfeasibilityReason::GroupExceedsCapacity {
                packages: vec![1, 2, 3],
                size: 3
            }
        );
    }

    #[test]
    fn test_conflicting_pins() {
        let mut first = test_utils::package(1, 1);
        first.add_note(PackageNote::ShipWith(vec![2]));
        first.add_note(PackageNote::Truck(vec![String::from("1")]));
        let mut second = test_utils::package(2, 2);
        second.add_note(PackageNote::Truck(vec![String::from("2")]));

        let problem = test_utils::create_problem(
            3,
            vec![first, second],
            vec![test_utils::truck("1", 4), test_utils::truck("2", 4)],
        );

        assert_eq!(
            infeasibility(schedule(&problem)),
            InfeasibilityReason::ConflictingPins {
                packages: vec![1, 2]
            }
        );
    }

    #[test]
    fn test_disjoint_truck_lists_conflict() {
        let mut first = test_utils::package(1, 1);
        first.add_note(PackageNote::ShipWith(vec![2]));
        first.add_note("TRUCK[1, 2]".parse().unwrap());
        let mut second = test_utils::package(2, 2);
        second.add_note("TRUCK[3]".parse().unwrap());

        let problem = test_utils::create_problem(
            3,
            vec![first, second],
            vec![
                test_utils::truck("1", 4),
                test_utils::truck("2", 4),
                test_utils::truck("3", 4),
            ],
        );

        assert_eq!(
            infeasibility(schedule(&problem)),
            InfeasibilityReason::ConflictingPins {
                packages: vec![1, 2]
            }
        );
    }

    #[test]
    fn test_truck_list_keeps_packages_off_other_trucks() {
        // Truck 3 has room for everything, yet the listed packages stay on trucks 1 and 2.
        let mut packages = (1..=6)
            .map(|id| {
                let mut package = test_utils::package(id, id as usize);
                package.add_note("TRUCK[1, 2]".parse().unwrap());
                package
            })
            .collect::<Vec<_>>();
        packages.push(test_utils::package(7, 7));

        let problem = test_utils::create_problem(
            8,
            packages,
            vec![
                test_utils::truck("1", 3),
                test_utils::truck("2", 3),
                test_utils::truck("3", 16),
            ],
        );

        let seed = schedule(&problem).unwrap();
        assert!(seed.validate(&problem).is_ok());
        for index in 0..6 {
            assert_ne!(seed.truck_of(PackageIdx::new(index)), Some(TruckIdx::new(2)));
        }
        assert_eq!(seed.load(TruckIdx::new(0)), 3);
        assert_eq!(seed.load(TruckIdx::new(1)), 3);
        assert_eq!(seed.truck_of(PackageIdx::new(6)), Some(TruckIdx::new(2)));
    }

    #[test]
    fn test_pinned_over_capacity() {
        let packages = (1..=3)
            .map(|id| {
                let mut package = test_utils::package(id, id as usize);
                package.add_note(PackageNote::Truck(vec![String::from("2")]));
                package
            })
            .collect();

        let problem = test_utils::create_problem(
            4,
            packages,
            vec![test_utils::truck("1", 4), test_utils::truck("2", 2)],
        );

        assert_eq!(
            infeasibility(schedule(&problem)),
            InfeasibilityReason::PinnedOverCapacity {
                truck: String::from("2"),
                pinned: 3,
                capacity: 2
            }
        );
    }

    #[test]
    fn test_delayed_package_needs_late_departure() {
        let mut delayed = test_utils::package(1, 1);
        delayed.add_note(PackageNote::AvailableAt(time(9, 5, 0, 0)));

        let problem = test_utils::create_problem(
            2,
            vec![delayed.clone()],
            vec![test_utils::truck("1", 4)],
        );
        assert_eq!(
            infeasibility(schedule(&problem)),
            InfeasibilityReason::NoLateDeparture {
                packages: vec![1],
                available_at: time(9, 5, 0, 0)
            }
        );

        let mut late_truck = test_utils::truck("2", 4);
        late_truck.set_departure_time(time(9, 5, 0, 0));
        let problem = test_utils::create_problem(
            3,
            vec![delayed, test_utils::package(2, 2)],
            vec![test_utils::truck("1", 4), late_truck],
        );

        let seed = schedule(&problem).unwrap();
        assert_eq!(seed.truck_of(PackageIdx::new(0)), Some(TruckIdx::new(1)));
    }

    #[test]
    fn test_deadline_units_take_earliest_departure() {
        let mut late_truck = test_utils::truck("2", 4);
        late_truck.set_departure_time(time(9, 30, 0, 0));

        let problem = test_utils::create_problem(
            4,
            vec![
                test_utils::package(1, 1),
                test_utils::package_with_deadline(2, 2, time(9, 0, 0, 0)),
                test_utils::package(3, 3),
            ],
            vec![late_truck, test_utils::truck("1", 4)],
        );

        let seed = schedule(&problem).unwrap();
        assert_eq!(seed.truck_of(PackageIdx::new(1)), Some(TruckIdx::new(1)));
        assert_eq!(seed.route(TruckIdx::new(1))[0], PackageIdx::new(1));
    }

    #[test]
    fn test_empty_fleet() {
        let problem = test_utils::create_problem(2, vec![test_utils::package(1, 1)], vec![]);
        assert_eq!(
            infeasibility(schedule(&problem)),
            InfeasibilityReason::EmptyFleet
        );
    }
}
