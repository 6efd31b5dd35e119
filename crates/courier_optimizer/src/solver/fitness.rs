use jiff::{SignedDuration, civil::Time};

use crate::problem::{
    delivery_problem::DeliveryProblem, location::LocationIdx, miles::Miles, package::PackageIdx,
    truck::TruckIdx,
};

use super::{
    score::{FitnessAnalysis, Score},
    solution::chromosome::Chromosome,
    solver_params::OptimizerParams,
};

#[derive(Clone, Copy, Debug)]
pub struct FitnessWeights {
    pub distance: f64,
    pub lateness: f64,
    pub violation: f64,
}

impl From<&OptimizerParams> for FitnessWeights {
    fn from(params: &OptimizerParams) -> Self {
        FitnessWeights {
            distance: params.distance_weight,
            lateness: params.lateness_weight,
            violation: params.violation_weight,
        }
    }
}

impl Default for FitnessWeights {
    fn default() -> Self {
        FitnessWeights::from(&OptimizerParams::default())
    }
}

#[derive(Default, Clone, Copy, Debug)]
struct RouteCost {
    miles: Miles,
    late_minutes: f64,
    late_packages: usize,
}

fn minutes_between(from: Time, to: Time) -> f64 {
    from.duration_until(to).as_secs_f64() / 60.0
}

/// Distance of a truck's route from the hub back to the hub.
pub fn route_distance(problem: &DeliveryProblem, route: &[PackageIdx]) -> Miles {
    let hub = problem.hub();
    let mut previous = hub;
    let mut miles = Miles::ZERO;

    for &package_id in route {
        let location_id = problem.planned_location(package_id);
        miles += problem.travel_distance(previous, location_id);
        previous = location_id;
    }

    miles + problem.travel_distance(previous, hub)
}

fn route_cost(problem: &DeliveryProblem, truck_id: TruckIdx, route: &[PackageIdx]) -> RouteCost {
    let speed = problem.truck(truck_id).speed();
    let mut cost = RouteCost::default();
    let mut time = problem.departure_time(truck_id);
    let mut previous: LocationIdx = problem.hub();

    for &package_id in route {
        let location_id = problem.planned_location(package_id);
        let leg = problem.travel_distance(previous, location_id);
        cost.miles += leg;
        time = time.saturating_add(leg / speed);
        previous = location_id;

        if let Some(deadline) = problem.package(package_id).deadline()
            && time > deadline
        {
            cost.late_minutes += minutes_between(deadline, time);
            cost.late_packages += 1;
        }
    }

    cost.miles += problem.travel_distance(previous, problem.hub());
    cost
}

/// Hard constraint violations: packages over capacity, packages on a truck they may not ride
/// (pins and availability), ride-together groups split over several trucks and packages
/// missing from or repeated in the routes.
pub fn count_violations(problem: &DeliveryProblem, chromosome: &Chromosome) -> usize {
    let mut violations = 0;
    let mut seen = vec![0usize; problem.num_packages()];

    for (index, route) in chromosome.routes().iter().enumerate() {
        let truck_id = TruckIdx::new(index);
        violations += route
            .len()
            .saturating_sub(problem.truck(truck_id).capacity());

        for &package_id in route {
            seen[package_id.get()] += 1;
            if !problem.is_package_compatible(package_id, truck_id) {
                violations += 1;
            }
        }
    }

    violations += seen.iter().filter(|&&count| count != 1).count();

    let assignments = chromosome.assignments(problem.num_packages());
    for unit in problem.units() {
        let mut trucks = unit
            .packages()
            .iter()
            .filter_map(|package_id| assignments[package_id.get()])
            .collect::<Vec<_>>();
        trucks.sort_unstable();
        trucks.dedup();
        violations += trucks.len().saturating_sub(1);
    }

    violations
}

/// `w1 * miles + w2 * late minutes` as the soft score, `w3 * violations` as the hard score.
pub fn evaluate(
    problem: &DeliveryProblem,
    chromosome: &Chromosome,
    weights: &FitnessWeights,
) -> Score {
    let (miles, late_minutes) = chromosome
        .routes()
        .iter()
        .enumerate()
        .map(|(index, route)| route_cost(problem, TruckIdx::new(index), route))
        .fold((Miles::ZERO, 0.0), |(miles, late), cost| {
            (miles + cost.miles, late + cost.late_minutes)
        });

    let violations = count_violations(problem, chromosome);

    Score::new(
        weights.violation * violations as f64,
        weights.distance * miles.value() + weights.lateness * late_minutes,
    )
}

pub fn analyze(
    problem: &DeliveryProblem,
    chromosome: &Chromosome,
    weights: &FitnessWeights,
) -> FitnessAnalysis {
    let mut analysis = FitnessAnalysis::default();
    let mut miles = Miles::ZERO;

    for (index, route) in chromosome.routes().iter().enumerate() {
        let cost = route_cost(problem, TruckIdx::new(index), route);
        miles += cost.miles;
        analysis.late_minutes += cost.late_minutes;
        analysis.late_packages += cost.late_packages;
    }

    analysis.total_miles = miles.value();
    analysis.violations = count_violations(problem, chromosome);

    analysis
        .scores
        .insert("distance", Score::soft(weights.distance * miles.value()));
    analysis.scores.insert(
        "lateness",
        Score::soft(weights.lateness * analysis.late_minutes),
    );
    analysis.scores.insert(
        "violations",
        Score::hard(weights.violation * analysis.violations as f64),
    );

    analysis
}

/// Arrival time of each package along the planned route, ignoring later corrections.
pub fn planned_arrivals(
    problem: &DeliveryProblem,
    chromosome: &Chromosome,
) -> Vec<Option<Time>> {
    let mut arrivals = vec![None; problem.num_packages()];

    for (index, route) in chromosome.routes().iter().enumerate() {
        let truck_id = TruckIdx::new(index);
        let speed = problem.truck(truck_id).speed();
        let mut time = problem.departure_time(truck_id);
        let mut previous = problem.hub();

        for &package_id in route {
            let location_id = problem.planned_location(package_id);
            let leg: SignedDuration = problem.travel_distance(previous, location_id) / speed;
            time = time.saturating_add(leg);
            previous = location_id;
            arrivals[package_id.get()] = Some(time);
        }
    }

    arrivals
}

#[cfg(test)]
mod tests {
    use jiff::civil::time;

    use crate::{problem::package_note::PackageNote, test_utils};

    use super::*;

    fn idx(values: &[usize]) -> Vec<PackageIdx> {
        values.iter().copied().map(PackageIdx::new).collect()
    }

    #[test]
    fn test_distance_includes_return_leg() {
        let problem = test_utils::create_problem(
            6,
            vec![test_utils::package(1, 2), test_utils::package(2, 5)],
            vec![test_utils::truck("1", 16)],
        );

        let chromosome = Chromosome::new(vec![idx(&[0, 1])]);
        assert_eq!(
            route_distance(&problem, chromosome.route(TruckIdx::new(0))),
            Miles::new(10.0)
        );

        let score = evaluate(&problem, &chromosome, &FitnessWeights::default());
        assert_eq!(score, Score::soft(10.0));
    }

    #[test]
    fn test_lateness_is_penalized_per_minute() {
        // 18 mph: one mile takes 200 seconds. Location 9 is reached at 08:30.
        let problem = test_utils::create_problem(
            10,
            vec![
                test_utils::package(1, 9),
                test_utils::package_with_deadline(2, 9, time(8, 20, 0, 0)),
            ],
            vec![test_utils::truck("1", 16)],
        );

        let chromosome = Chromosome::new(vec![idx(&[0, 1])]);
        let weights = FitnessWeights::default();
        let analysis = analyze(&problem, &chromosome, &weights);

        assert_eq!(analysis.late_packages, 1);
        assert!((analysis.late_minutes - 10.0).abs() < 1e-9);
        assert_eq!(analysis.total_miles, 18.0);
        assert_eq!(analysis.total_score(), evaluate(&problem, &chromosome, &weights));
        assert_eq!(analysis.total_score(), Score::soft(18.0 + 5.0 * 10.0));
    }

    #[test]
    fn test_violations() {
        let mut pinned = test_utils::package(1, 1);
        pinned.add_note(PackageNote::Truck(vec![String::from("2")]));
        let mut bundled = test_utils::package(2, 2);
        bundled.add_note(PackageNote::ShipWith(vec![3]));

        let problem = test_utils::create_problem(
            4,
            vec![pinned, bundled, test_utils::package(3, 3)],
            vec![test_utils::truck("1", 1), test_utils::truck("2", 3)],
        );

        let feasible = Chromosome::new(vec![vec![], idx(&[0, 1, 2])]);
        assert_eq!(count_violations(&problem, &feasible), 0);

        // Pin broken, group split, truck 1 one over capacity.
        let broken = Chromosome::new(vec![idx(&[0, 1]), idx(&[2])]);
        assert_eq!(count_violations(&problem, &broken), 3);
        assert!(evaluate(&problem, &broken, &FitnessWeights::default()).is_failure());

        let incomplete = Chromosome::new(vec![vec![], idx(&[0, 1])]);
        assert_eq!(count_violations(&problem, &incomplete), 1);
    }

    #[test]
    fn test_planned_arrivals() {
        let problem = test_utils::create_problem(
            4,
            vec![test_utils::package(1, 3), test_utils::package(2, 3)],
            vec![test_utils::truck("1", 16)],
        );

        let arrivals = planned_arrivals(&problem, &Chromosome::new(vec![idx(&[0, 1])]));
        assert_eq!(arrivals, vec![Some(time(8, 10, 0, 0)), Some(time(8, 10, 0, 0))]);
    }
}
